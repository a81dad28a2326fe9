//! Verdict types: the atomic judgment unit of a deliberation.
//!
//! Every analyzer produces exactly one [`Verdict`] per request, and the
//! consensus synthesizer produces one more for the final result. Verdicts
//! are immutable once built; the only way to obtain a different verdict is
//! to build a new one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CouncilError;
use crate::Result;

/// Confidence assigned to fallback verdicts and to inconclusive results.
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Moderation decision.
///
/// The derived ordering matches the tie-break precedence used by the
/// synthesizer: `Remove > FlagForReview > Allow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Content may stay up.
    Allow,
    /// Content needs a human moderator.
    FlagForReview,
    /// Content should be taken down.
    Remove,
}

impl Decision {
    /// All decisions, in ascending precedence.
    pub const ALL: [Decision; 3] = [Decision::Allow, Decision::FlagForReview, Decision::Remove];

    /// Tie-break precedence. Higher wins.
    pub fn precedence(self) -> u8 {
        match self {
            Decision::Allow => 0,
            Decision::FlagForReview => 1,
            Decision::Remove => 2,
        }
    }

    /// Returns true for the decisions that take a strong action
    /// (keeping or removing content without a human in the loop).
    pub fn is_decisive(self) -> bool {
        matches!(self, Decision::Allow | Decision::Remove)
    }

    /// Wire label (`ALLOW`, `FLAG_FOR_REVIEW`, `REMOVE`).
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Allow => "ALLOW",
            Decision::FlagForReview => "FLAG_FOR_REVIEW",
            Decision::Remove => "REMOVE",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = CouncilError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALLOW" => Ok(Decision::Allow),
            "FLAG_FOR_REVIEW" | "FLAG" | "REVIEW" => Ok(Decision::FlagForReview),
            "REMOVE" => Ok(Decision::Remove),
            other => Err(CouncilError::MalformedVerdict(format!(
                "unknown decision '{}'",
                other
            ))),
        }
    }
}

/// Confidence tier used by the cross-examiner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    /// Strictly above 0.8.
    High,
    /// Between 0.5 and 0.8, inclusive.
    Medium,
    /// Strictly below 0.5.
    Low,
}

/// Confidence in a decision, always within `[0.0, 1.0]`.
///
/// Construction clamps instead of panicking so that arithmetic on
/// confidences can never produce an out-of-range value. `NaN` becomes `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    /// Creates a confidence value, clamped to `[0.0, 1.0]`.
    pub fn new(value: f64) -> Self {
        Self::clamped(value, 0.0, 1.0)
    }

    /// Creates a confidence value clamped to `[min, max]`.
    pub fn clamped(value: f64, min: f64, max: f64) -> Self {
        if value.is_nan() {
            return Self(min.max(0.0));
        }
        Self(value.clamp(min, max).clamp(0.0, 1.0))
    }

    /// Returns the confidence value.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Returns false if this value escaped the `[0.0, 1.0]` invariant,
    /// which can only happen through deserialization.
    pub fn is_valid(&self) -> bool {
        self.0.is_finite() && (0.0..=1.0).contains(&self.0)
    }

    /// Returns the tier this confidence falls into.
    pub fn tier(&self) -> ConfidenceTier {
        if self.0 > 0.8 {
            ConfidenceTier::High
        } else if self.0 >= 0.5 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    /// Creates a high confidence value (0.9).
    pub fn high() -> Self {
        Self(0.9)
    }

    /// Creates a medium confidence value (0.6).
    pub fn medium() -> Self {
        Self(0.6)
    }

    /// Creates a low confidence value (0.3).
    pub fn low() -> Self {
        Self(FALLBACK_CONFIDENCE)
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::medium()
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// The output of one analyzer, or of the consensus synthesizer.
///
/// Fields are private so a verdict cannot be altered after it has been
/// handed to the council. `created_at` is stamped at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    source: String,
    framework: String,
    decision: Decision,
    confidence: Confidence,
    rationale: String,
    evidence: Vec<String>,
    created_at: DateTime<Utc>,
}

impl Verdict {
    /// Creates a new verdict with no evidence.
    pub fn new(
        source: impl Into<String>,
        framework: impl Into<String>,
        decision: Decision,
        confidence: f64,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            framework: framework.into(),
            decision,
            confidence: Confidence::new(confidence),
            rationale: rationale.into(),
            evidence: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Replaces the evidence list.
    pub fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.evidence = evidence;
        self
    }

    /// Appends one evidence item.
    pub fn with_evidence_item(mut self, item: impl Into<String>) -> Self {
        self.evidence.push(item.into());
        self
    }

    /// Synthetic verdict substituted for an analyzer that failed.
    pub fn fallback(
        source: impl Into<String>,
        framework: impl Into<String>,
        rationale: impl Into<String>,
    ) -> Self {
        Self::new(
            source,
            framework,
            Decision::FlagForReview,
            FALLBACK_CONFIDENCE,
            rationale,
        )
        .with_evidence_item("Analysis error occurred")
    }

    /// Identifier of the producing analyzer, or `consensus`.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The ethical framework label used for weighting.
    pub fn framework(&self) -> &str {
        &self.framework
    }

    /// The decision.
    pub fn decision(&self) -> Decision {
        self.decision
    }

    /// The confidence in the decision.
    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    /// Free-text explanation.
    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    /// Detected signals supporting the decision.
    pub fn evidence(&self) -> &[String] {
        &self.evidence
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Checks the structural invariants of a verdict.
    ///
    /// # Errors
    ///
    /// Returns [`CouncilError::MalformedVerdict`] if the source or rationale
    /// is blank or the confidence is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.source.trim().is_empty() {
            return Err(CouncilError::MalformedVerdict("empty source".to_string()));
        }
        if self.rationale.trim().is_empty() {
            return Err(CouncilError::MalformedVerdict(
                "empty rationale".to_string(),
            ));
        }
        if !self.confidence.is_valid() {
            return Err(CouncilError::MalformedVerdict(format!(
                "confidence {} outside [0, 1]",
                self.confidence.value()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({})",
            self.framework, self.decision, self.confidence
        )
    }
}
