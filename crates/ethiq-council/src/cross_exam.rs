//! Cross-examination of analyzer verdicts.
//!
//! Pure observation: classifies the verdict map as unanimous, majority or
//! fragmented, groups conflicting analyzers by decision, and buckets them by
//! confidence tier. No decision is made here.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::dispatcher::VerdictMap;
use crate::verdict::{ConfidenceTier, Decision};

/// Analyzers below this confidence get a clarification request.
pub const CLARIFICATION_THRESHOLD: f64 = 0.7;

/// How much the analyzers agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementLevel {
    /// Every analyzer reached the same decision.
    Unanimous,
    /// One decision is held by more than half of the analyzers.
    Majority,
    /// No decision is held by more than half of the analyzers.
    Fragmented,
    /// There were no verdicts to compare.
    Empty,
}

impl fmt::Display for AgreementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AgreementLevel::Unanimous => "unanimous",
            AgreementLevel::Majority => "majority",
            AgreementLevel::Fragmented => "fragmented",
            AgreementLevel::Empty => "empty",
        };
        f.write_str(label)
    }
}

/// All analyzers agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agreement {
    /// The shared decision.
    pub decision: Decision,
    /// Every contributing analyzer.
    pub analyzers: Vec<String>,
}

/// Analyzers disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// Analyzer names grouped by the decision they reached.
    pub groups: BTreeMap<Decision, Vec<String>>,
    /// Human-readable summary.
    pub description: String,
}

/// A low-confidence analyzer whose reasoning deserves a second look.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarificationRequest {
    /// Analyzer name.
    pub analyzer: String,
    /// The question put to it.
    pub question: String,
    /// The analyzer's own rationale.
    pub context: String,
}

/// Analyzer names bucketed by confidence tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceDistribution {
    /// Confidence strictly above 0.8.
    pub high: Vec<String>,
    /// Confidence in `[0.5, 0.8]`.
    pub medium: Vec<String>,
    /// Confidence strictly below 0.5.
    pub low: Vec<String>,
}

impl ConfidenceDistribution {
    /// Total number of analyzers bucketed.
    pub fn total(&self) -> usize {
        self.high.len() + self.medium.len() + self.low.len()
    }

    /// Fraction of analyzers in the high tier; 0 when empty.
    pub fn high_ratio(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.high.len() as f64 / total as f64
        }
    }
}

/// Output of the cross-examiner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossExamination {
    /// Unanimous agreements (at most one).
    pub agreements: Vec<Agreement>,
    /// Decision conflicts (at most one).
    pub conflicts: Vec<Conflict>,
    /// Analyzers by confidence tier.
    pub confidence_distribution: ConfidenceDistribution,
    /// Every framework that contributed a verdict.
    pub framework_coverage: BTreeSet<String>,
    /// Low-confidence analyzers needing clarification.
    pub questions: Vec<ClarificationRequest>,
    /// Overall agreement classification.
    pub agreement_level: AgreementLevel,
}

impl CrossExamination {
    /// True if every analyzer reached the same decision.
    pub fn is_unanimous(&self) -> bool {
        !self.agreements.is_empty()
    }

    /// True if analyzers disagreed.
    pub fn has_conflict(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Classifies agreement and conflict among verdicts.
#[derive(Debug, Clone, Default)]
pub struct CrossExaminer;

impl CrossExaminer {
    /// Creates a cross-examiner.
    pub fn new() -> Self {
        Self
    }

    /// Examines a verdict map.
    pub fn examine(&self, verdicts: &VerdictMap) -> CrossExamination {
        let mut groups: BTreeMap<Decision, Vec<String>> = BTreeMap::new();
        let mut distribution = ConfidenceDistribution::default();
        let mut framework_coverage = BTreeSet::new();
        let mut questions = Vec::new();

        for (name, verdict) in verdicts {
            groups
                .entry(verdict.decision())
                .or_default()
                .push(name.clone());

            match verdict.confidence().tier() {
                ConfidenceTier::High => distribution.high.push(name.clone()),
                ConfidenceTier::Medium => distribution.medium.push(name.clone()),
                ConfidenceTier::Low => distribution.low.push(name.clone()),
            }

            framework_coverage.insert(verdict.framework().to_string());

            let confidence = verdict.confidence().value();
            if confidence < CLARIFICATION_THRESHOLD {
                questions.push(ClarificationRequest {
                    analyzer: name.clone(),
                    question: format!(
                        "Low confidence ({:.2}) - needs clarification",
                        confidence
                    ),
                    context: verdict.rationale().to_string(),
                });
            }
        }

        let mut agreements = Vec::new();
        let mut conflicts = Vec::new();

        let agreement_level = match groups.len() {
            0 => AgreementLevel::Empty,
            1 => {
                if let Some((decision, analyzers)) = groups.into_iter().next() {
                    agreements.push(Agreement {
                        decision,
                        analyzers,
                    });
                }
                AgreementLevel::Unanimous
            }
            _ => {
                let largest = groups.values().map(Vec::len).max().unwrap_or(0);
                let level = if largest * 2 > verdicts.len() {
                    AgreementLevel::Majority
                } else {
                    AgreementLevel::Fragmented
                };

                let labels: Vec<&str> = groups.keys().map(|d| d.as_str()).collect();
                conflicts.push(Conflict {
                    description: format!("Analyzers disagree: {}", labels.join(", ")),
                    groups,
                });
                level
            }
        };

        CrossExamination {
            agreements,
            conflicts,
            confidence_distribution: distribution,
            framework_coverage,
            questions,
            agreement_level,
        }
    }
}
