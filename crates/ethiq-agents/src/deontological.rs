//! Deontological analyzer: judges content by the duties and rights it
//! violates, regardless of outcome.
//!
//! Rights and dignity violations are serious; any serious violation removes
//! the content with confidence `0.7 + 0.1` per violation (capped at 0.95).
//! Deception is a minor violation; more than two minor violations flag the
//! content for review.

use async_trait::async_trait;
use tracing::debug;

use ethiq_council::{Analyzer, Decision, ModerationContext, Result, Verdict};

use crate::keywords::KeywordSet;

/// Registry name.
pub const NAME: &str = "deontological";

/// Framework label.
pub const FRAMEWORK: &str = "Deontological Ethics";

/// Rights that must not be violated.
pub const RIGHTS_VIOLATIONS: &[&str] = &[
    "privacy_violation",
    "defamation",
    "harassment",
    "discrimination",
    "intimidation",
    "coercion",
    "exploitation",
];

/// Signals of deception.
pub const DECEPTION_SIGNALS: &[&str] = &["fake", "false", "misleading", "hoax"];

/// Signals of an attack on human dignity.
pub const DIGNITY_SIGNALS: &[&str] = &["dehumanizing", "degrading", "humiliating"];

/// How grave a rule violation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Removes on its own.
    Serious,
    /// Accumulates toward review.
    Minor,
}

#[derive(Debug)]
struct Violation {
    severity: Severity,
    description: String,
}

/// Duty-and-rights analyzer.
#[derive(Debug, Clone)]
pub struct DeontologicalAnalyzer {
    rights: KeywordSet,
    deception: KeywordSet,
    dignity: KeywordSet,
}

impl DeontologicalAnalyzer {
    /// Creates the analyzer with the default rule lists.
    pub fn new() -> Result<Self> {
        Ok(Self {
            rights: KeywordSet::new(RIGHTS_VIOLATIONS.iter().copied())?,
            deception: KeywordSet::new(DECEPTION_SIGNALS.iter().copied())?,
            dignity: KeywordSet::new(DIGNITY_SIGNALS.iter().copied())?,
        })
    }

    fn violations(&self, content: &str) -> Vec<Violation> {
        let mut violations: Vec<Violation> = self
            .rights
            .matches(content)
            .into_iter()
            .map(|right| Violation {
                severity: Severity::Serious,
                description: format!("Potential {}", right.replace('_', " ")),
            })
            .collect();

        for signal in self.deception.matches(content) {
            violations.push(Violation {
                severity: Severity::Minor,
                description: format!("Potential deception or false information ('{}')", signal),
            });
        }

        if self.dignity.is_match(content) {
            violations.push(Violation {
                severity: Severity::Serious,
                description: "Content may violate human dignity".to_string(),
            });
        }

        violations
    }

    /// Scores `content` synchronously.
    pub fn assess(&self, content: &str, _context: &ModerationContext) -> Verdict {
        let violations = self.violations(content);
        let serious = violations
            .iter()
            .filter(|v| v.severity == Severity::Serious)
            .count();
        let minor = violations.len() - serious;

        let (decision, confidence) = if serious > 0 {
            (Decision::Remove, (0.7 + 0.1 * serious as f64).min(0.95))
        } else if minor > 2 {
            (Decision::FlagForReview, 0.7)
        } else {
            (Decision::Allow, 0.8)
        };

        debug!(
            "Deontological check: {} serious, {} minor violations",
            serious, minor
        );

        let rationale = format!(
            "{} serious and {} minor rule violations; {} follows from duty and rights.",
            serious, minor, decision
        );

        let evidence = violations.into_iter().map(|v| v.description).collect();

        Verdict::new(NAME, FRAMEWORK, decision, confidence, rationale).with_evidence(evidence)
    }
}

#[async_trait]
impl Analyzer for DeontologicalAnalyzer {
    fn name(&self) -> &str {
        NAME
    }

    fn framework(&self) -> &str {
        FRAMEWORK
    }

    fn description(&self) -> &str {
        "Evaluates content against universal moral duties and individual rights"
    }

    async fn analyze(&self, content: &str, context: &ModerationContext) -> Result<Verdict> {
        Ok(self.assess(content, context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assess(content: &str) -> Verdict {
        DeontologicalAnalyzer::new()
            .unwrap()
            .assess(content, &ModerationContext::new())
    }

    #[test]
    fn test_clean_content_is_allowed() {
        let verdict = assess("A recipe for bread");
        assert_eq!(verdict.decision(), Decision::Allow);
        assert!((verdict.confidence().value() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_rights_violation_removes() {
        let verdict = assess("This is a privacy violation and defamation");
        assert_eq!(verdict.decision(), Decision::Remove);
        assert!((verdict.confidence().value() - 0.9).abs() < 1e-9);
        assert!(verdict
            .evidence()
            .contains(&"Potential privacy violation".to_string()));
    }

    #[test]
    fn test_serious_confidence_caps() {
        let verdict =
            assess("harassment, intimidation, coercion, exploitation and degrading remarks");
        assert_eq!(verdict.decision(), Decision::Remove);
        assert!((verdict.confidence().value() - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_deception_accumulates_to_review() {
        let one = assess("a misleading headline");
        assert_eq!(one.decision(), Decision::Allow);

        let many = assess("a fake, misleading hoax");
        assert_eq!(many.decision(), Decision::FlagForReview);
        assert!((many.confidence().value() - 0.7).abs() < 1e-9);
        assert_eq!(many.evidence().len(), 3);
    }
}
