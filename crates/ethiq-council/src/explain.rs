//! # Decision Explanations
//!
//! Turns a finished [`DeliberationRecord`] into human-facing justification:
//!
//! | Part                 | Audience      | Content                                   |
//! |----------------------|---------------|-------------------------------------------|
//! | `user_friendly`      | content owner | plain statement of the outcome            |
//! | `moderator_detailed` | moderator     | how the panel reached it                  |
//! | `technical`          | operators     | decision, confidence, frameworks          |
//! | [`AgentInsights`]    | moderator     | consensus strength, lone dissenters       |
//! | [`ContextualFactors`]| moderator     | context keys that shaped the outcome      |
//! | recommendations      | moderator     | follow-up actions for the decision        |
//!
//! Explanations are derived data: building one never changes the record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use uuid::Uuid;

use crate::context::ModerationContext;
use crate::record::DeliberationRecord;
use crate::verdict::Decision;

/// Characters of analyzer reasoning kept in an insight.
pub const KEY_REASONING_CHARS: usize = 100;

const LARGE_AUDIENCE: u64 = 10_000;

/// Share of analyzers a decision needs to count as a strong agreement.
const STRONG_AGREEMENT_SHARE: f64 = 0.7;

/// How closely the analyzers agreed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusStrength {
    /// Every analyzer reached the same decision.
    Strong,
    /// Two distinct decisions.
    Moderate,
    /// All three decisions were reached.
    Weak,
    /// No analyzer produced a verdict.
    Unknown,
}

impl ConsensusStrength {
    fn from_distinct(distinct: usize) -> Self {
        match distinct {
            0 => Self::Unknown,
            1 => Self::Strong,
            2 => Self::Moderate,
            _ => Self::Weak,
        }
    }
}

impl fmt::Display for ConsensusStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Strong => "strong",
            Self::Moderate => "moderate",
            Self::Weak => "weak",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// The same outcome phrased for three audiences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationText {
    /// Plain-language notice for the content owner.
    pub user_friendly: String,
    /// Summary of the deliberation for a moderator.
    pub moderator_detailed: String,
    /// Terse technical line.
    pub technical: String,
}

/// One analyzer's contribution, condensed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerInsight {
    /// The analyzer's decision.
    pub decision: Decision,
    /// The analyzer's confidence.
    pub confidence: f64,
    /// Framework label.
    pub framework: String,
    /// Opening of the analyzer's rationale.
    pub key_reasoning: String,
    /// True if this verdict is a fallback for a failed analyzer.
    pub failed: bool,
}

/// What the panel agreed and disagreed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInsights {
    /// Consensus strength across the panel.
    pub consensus_level: ConsensusStrength,
    /// Decisions held by a single analyzer while others differed.
    pub key_disagreements: Vec<Decision>,
    /// Decisions held by more than 70% of analyzers.
    pub strongest_agreements: Vec<Decision>,
    /// Per-analyzer insight, keyed by analyzer name.
    pub analyzers: BTreeMap<String, AnalyzerInsight>,
}

/// Context that influenced the decision, in readable form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextualFactors {
    /// Audience size and vulnerability.
    pub audience: Vec<String>,
    /// Platform-specific considerations.
    pub platform: Vec<String>,
    /// Media type, educational and public-interest value.
    pub content: Vec<String>,
}

impl ContextualFactors {
    /// Reads the recognized context keys.
    pub fn of(context: &ModerationContext) -> Self {
        let mut factors = Self::default();

        if context.vulnerable_audience() {
            factors
                .audience
                .push("Vulnerable audience identified; stricter standards applied".to_string());
        }
        if context.audience_size().map_or(false, |n| n > LARGE_AUDIENCE) {
            factors
                .audience
                .push("Large audience; broader impact considered".to_string());
        }

        match context.platform() {
            Some("social_media") => factors
                .platform
                .push("Social media platform; viral potential considered".to_string()),
            Some("educational") => factors
                .platform
                .push("Educational platform; learning value prioritized".to_string()),
            _ => {}
        }

        match context.content_type() {
            Some("video") => factors
                .content
                .push("Video content; visual impact considered".to_string()),
            Some("text") => factors
                .content
                .push("Text content; linguistic analysis applied".to_string()),
            _ => {}
        }
        if context.educational_value() {
            factors
                .content
                .push("Educational value identified; may offset other concerns".to_string());
        }
        if context.public_interest() {
            factors
                .content
                .push("Public interest value; democratic considerations applied".to_string());
        }

        factors
    }

    /// Returns true if no factor applied.
    pub fn is_empty(&self) -> bool {
        self.audience.is_empty() && self.platform.is_empty() && self.content.is_empty()
    }
}

/// Human-facing justification of one deliberation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// The deliberation explained.
    pub task_id: Uuid,
    /// Final decision.
    pub decision: Decision,
    /// Final confidence.
    pub confidence: f64,
    /// The outcome phrased for each audience.
    pub text: ExplanationText,
    /// Panel agreement.
    pub insights: AgentInsights,
    /// Context that shaped the outcome.
    pub contextual_factors: ContextualFactors,
    /// Follow-up actions.
    pub recommendations: Vec<String>,
    /// Length of the moderated content in characters.
    pub content_chars: usize,
    /// When the explanation was built.
    pub generated_at: DateTime<Utc>,
}

impl Explanation {
    /// Explains `record`.
    pub fn of(record: &DeliberationRecord) -> Self {
        let decision = record.final_verdict.decision();
        let confidence = record.final_verdict.confidence().value();

        Self {
            task_id: record.task_id,
            decision,
            confidence,
            text: describe(decision, confidence, record.analyzer_count()),
            insights: insights(record),
            contextual_factors: ContextualFactors::of(&record.request.context),
            recommendations: recommendations(decision, confidence),
            content_chars: record.request.content_chars,
            generated_at: Utc::now(),
        }
    }

    /// One-line notice for the content owner.
    pub fn user_notification(&self) -> String {
        let marker = match self.decision {
            Decision::Allow => "✅",
            Decision::FlagForReview => "⚠️",
            Decision::Remove => "❌",
        };
        format!("{} {}", marker, self.text.user_friendly)
    }

    /// Markdown report for moderators.
    pub fn moderator_report(&self) -> String {
        let mut report = String::new();
        let insights = &self.insights;

        let _ = writeln!(report, "# Moderation Decision Report\n");
        let _ = writeln!(report, "## Decision: {}\n", self.decision);
        let _ = writeln!(report, "## Summary\n{}\n", self.text.moderator_detailed);
        let _ = writeln!(report, "## Technical Details\n{}\n", self.text.technical);

        let disagreements: Vec<&str> = insights.key_disagreements.iter().map(|d| d.as_str()).collect();
        let _ = writeln!(report, "## Analyzer Consensus");
        let _ = writeln!(report, "- Consensus Level: {}", insights.consensus_level);
        let _ = writeln!(report, "- Analyzers Participated: {}", insights.analyzers.len());
        let _ = writeln!(
            report,
            "- Key Disagreements: {}",
            if disagreements.is_empty() {
                "None".to_string()
            } else {
                disagreements.join(", ")
            }
        );

        if !self.contextual_factors.is_empty() {
            let _ = writeln!(report, "\n## Contextual Factors");
            let factors = &self.contextual_factors;
            for factor in factors
                .audience
                .iter()
                .chain(&factors.platform)
                .chain(&factors.content)
            {
                let _ = writeln!(report, "- {}", factor);
            }
        }

        let _ = writeln!(report, "\n## Recommendations");
        for recommendation in &self.recommendations {
            let _ = writeln!(report, "- {}", recommendation);
        }

        let _ = writeln!(report, "\n## Analyzer Details");
        for (name, insight) in &insights.analyzers {
            let _ = writeln!(report, "\n### {}", name);
            let _ = writeln!(report, "- Decision: {}", insight.decision);
            let _ = writeln!(report, "- Confidence: {:.2}", insight.confidence);
            let _ = writeln!(report, "- Framework: {}", insight.framework);
            if insight.failed {
                let _ = writeln!(report, "- Status: failed, counted as review");
            }
            let _ = writeln!(report, "- Reasoning: {}", insight.key_reasoning);
        }

        report.trim_end().to_string()
    }
}

/// Follow-up actions for a final decision.
pub fn recommendations(decision: Decision, confidence: f64) -> Vec<String> {
    let mut actions: Vec<&str> = Vec::new();

    match decision {
        Decision::Allow => {
            if confidence < 0.8 {
                actions.push("Consider monitoring this content for community feedback");
            }
            actions.push("Content meets current community standards");
        }
        Decision::FlagForReview => {
            actions.push("Human moderator should review within 24 hours");
            actions.push("Consider consulting with subject matter experts if needed");
            if confidence > 0.7 {
                actions.push("High confidence in flag; likely requires action");
            } else {
                actions.push("Borderline case; careful consideration needed");
            }
        }
        Decision::Remove => {
            actions.push("Content should be removed promptly");
            actions.push("Consider issuing a warning to the content creator");
            if confidence > 0.9 {
                actions.push("High confidence removal; standard procedure");
            } else {
                actions.push("Review the removal reason with the content creator");
            }
        }
    }

    actions.push("Monitor for similar content patterns");
    actions.push("Update moderation guidelines if needed");
    actions.into_iter().map(String::from).collect()
}

fn describe(decision: Decision, confidence: f64, analyzers: usize) -> ExplanationText {
    let percent = confidence * 100.0;

    let (user_friendly, moderator_detailed, technical) = match decision {
        Decision::Allow => (
            "This content has been approved for publication. Our analysis found that it meets \
             our community standards and ethical guidelines."
                .to_string(),
            "Content approved after multi-perspective ethical deliberation. The weighted \
             consensus found no violation of ethical principles."
                .to_string(),
            format!(
                "Decision: ALLOW. Consensus reached across {} ethical frameworks with {:.0}% confidence.",
                analyzers, percent
            ),
        ),
        Decision::FlagForReview => (
            format!(
                "This content has been flagged for human review. Our system identified some \
                 concerns that require human judgment to evaluate properly. Our system is \
                 {:.0}% confident that human review is needed.",
                percent
            ),
            "Content flagged for human review due to conflicting analyzer opinions or \
             borderline ethical considerations. Manual assessment recommended."
                .to_string(),
            format!(
                "Decision: FLAG_FOR_REVIEW. Analyzer consensus unclear ({:.0}% confidence). \
                 Human review required for final determination.",
                percent
            ),
        ),
        Decision::Remove => (
            format!(
                "This content has been removed as it violates our community standards and \
                 ethical guidelines. Our analysis found this with {:.0}% confidence.",
                percent
            ),
            "Content removed based on strong consensus across ethical frameworks. Multiple \
             analyzers identified violations of community standards."
                .to_string(),
            format!(
                "Decision: REMOVE. Strong consensus ({:.0}% confidence) across {} analyzers for content removal.",
                percent, analyzers
            ),
        ),
    };

    let moderator_detailed = if analyzers > 0 {
        format!(
            "{} {} analyzers participated in the deliberation.",
            moderator_detailed, analyzers
        )
    } else {
        moderator_detailed
    };

    ExplanationText {
        user_friendly,
        moderator_detailed,
        technical,
    }
}

fn insights(record: &DeliberationRecord) -> AgentInsights {
    let total = record.verdicts.len();

    let mut counts: BTreeMap<Decision, usize> = BTreeMap::new();
    for verdict in record.verdicts.values() {
        *counts.entry(verdict.decision()).or_default() += 1;
    }

    let key_disagreements = if counts.len() > 1 {
        counts
            .iter()
            .filter(|(_, count)| **count == 1)
            .map(|(decision, _)| *decision)
            .collect()
    } else {
        Vec::new()
    };

    let strongest_agreements = counts
        .iter()
        .filter(|(_, count)| **count as f64 > total as f64 * STRONG_AGREEMENT_SHARE)
        .map(|(decision, _)| *decision)
        .collect();

    let analyzers = record
        .verdicts
        .iter()
        .map(|(name, verdict)| {
            (
                name.clone(),
                AnalyzerInsight {
                    decision: verdict.decision(),
                    confidence: verdict.confidence().value(),
                    framework: verdict.framework().to_string(),
                    key_reasoning: key_reasoning(verdict.rationale()),
                    failed: record.is_failed(name),
                },
            )
        })
        .collect();

    AgentInsights {
        consensus_level: ConsensusStrength::from_distinct(counts.len()),
        key_disagreements,
        strongest_agreements,
        analyzers,
    }
}

fn key_reasoning(rationale: &str) -> String {
    if rationale.chars().count() > KEY_REASONING_CHARS {
        let head: String = rationale.chars().take(KEY_REASONING_CHARS).collect();
        format!("{}...", head)
    } else {
        rationale.to_string()
    }
}
