//! Cultural-context analyzer: sensitivity of content across cultures.
//!
//! Each sensitivity indicator adds 0.2; the total is scaled by 1.2 when the
//! target cultures include `global` (the default when none are given).
//! Cultural benefit indicators add 0.25 each.

use async_trait::async_trait;
use std::collections::BTreeSet;
use tracing::debug;

use ethiq_council::{Analyzer, Decision, ModerationContext, Result, Verdict};

use crate::keywords::{KeywordCategories, KeywordSet};

/// Registry name.
pub const NAME: &str = "cultural";

/// Framework label.
pub const FRAMEWORK: &str = "Cultural Ethics";

const GLOBAL: &str = "global";

/// Default sensitivity indicators by category.
pub const SENSITIVITIES: &[(&str, &[&str])] = &[
    ("religious", &["blasphemy", "sacrilege", "religious_offense"]),
    (
        "ethnic",
        &["racial_stereotypes", "ethnic_slurs", "cultural_appropriation"],
    ),
    (
        "gender",
        &["gender_stereotypes", "sexism", "misogyny", "misandry"],
    ),
    (
        "national",
        &["national_stereotypes", "xenophobia", "patriotism"],
    ),
    ("generational", &["age_stereotypes", "generational_conflict"]),
];

/// Default cultural benefit indicators.
pub const BENEFITS: &[&str] = &[
    "cultural_education",
    "diversity_celebration",
    "cross_cultural_dialogue",
    "cultural_awareness",
    "inclusive_content",
];

/// Cross-cultural sensitivity analyzer.
#[derive(Debug, Clone)]
pub struct CulturalAnalyzer {
    sensitivities: KeywordCategories,
    benefits: KeywordSet,
}

impl CulturalAnalyzer {
    /// Creates the analyzer with the default indicator lists.
    pub fn new() -> Result<Self> {
        Ok(Self {
            sensitivities: KeywordCategories::new(
                SENSITIVITIES
                    .iter()
                    .map(|(category, keywords)| (*category, keywords.iter().copied())),
            )?,
            benefits: KeywordSet::new(BENEFITS.iter().copied())?,
        })
    }

    fn target_cultures(context: &ModerationContext) -> BTreeSet<String> {
        context
            .target_cultures()
            .filter(|cultures| !cultures.is_empty())
            .unwrap_or_else(|| BTreeSet::from([GLOBAL.to_string()]))
    }

    /// Scores `content` synchronously.
    pub fn assess(&self, content: &str, context: &ModerationContext) -> Verdict {
        let cultures = Self::target_cultures(context);

        let mut sensitivity = 0.2 * self.sensitivities.count(content) as f64;
        if cultures.contains(GLOBAL) {
            sensitivity *= 1.2;
        }
        let sensitivity = sensitivity.min(1.0);
        let benefit = (0.25 * self.benefits.count(content) as f64).min(1.0);

        let (decision, confidence) = if sensitivity > 0.7 {
            (Decision::Remove, (sensitivity + 0.1).min(0.9))
        } else if sensitivity > 0.4 {
            (Decision::FlagForReview, 0.7)
        } else if benefit > 0.5 {
            (Decision::Allow, 0.8)
        } else {
            (Decision::Allow, 0.6)
        };

        debug!(
            "Cultural sensitivity {:.2}, benefit {:.2} for {:?}",
            sensitivity, benefit, cultures
        );

        let audience: Vec<&str> = cultures.iter().map(String::as_str).collect();
        let rationale = format!(
            "Sensitivity {:.2} and cultural benefit {:.2} for audience [{}]; {} in this cultural context.",
            sensitivity,
            benefit,
            audience.join(", "),
            decision
        );

        let mut evidence: Vec<String> = self
            .sensitivities
            .matches(content)
            .into_iter()
            .map(|(category, keyword)| format!("Cultural sensitivity: {} - {}", category, keyword))
            .collect();
        evidence.extend(
            self.benefits
                .matches(content)
                .into_iter()
                .map(|keyword| format!("Cultural benefit: {}", keyword)),
        );

        Verdict::new(NAME, FRAMEWORK, decision, confidence, rationale).with_evidence(evidence)
    }
}

#[async_trait]
impl Analyzer for CulturalAnalyzer {
    fn name(&self) -> &str {
        NAME
    }

    fn framework(&self) -> &str {
        FRAMEWORK
    }

    fn description(&self) -> &str {
        "Evaluates content sensitivity across cultural, religious and generational contexts"
    }

    async fn analyze(&self, content: &str, context: &ModerationContext) -> Result<Verdict> {
        Ok(self.assess(content, context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> CulturalAnalyzer {
        CulturalAnalyzer::new().unwrap()
    }

    #[test]
    fn test_plain_content_is_allowed() {
        let verdict = analyzer().assess("Weekend hiking photos", &ModerationContext::new());
        assert_eq!(verdict.decision(), Decision::Allow);
        assert!((verdict.confidence().value() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_global_audience_amplifies() {
        let content = "casual sexism and xenophobia";
        let a = analyzer();

        // 0.4 * 1.2 = 0.48 for the default global audience
        let global = a.assess(content, &ModerationContext::new());
        assert_eq!(global.decision(), Decision::FlagForReview);

        // 0.4 without amplification
        let local = a.assess(content, &ModerationContext::new().with_target_cultures(["fr"]));
        assert_eq!(local.decision(), Decision::Allow);
    }

    #[test]
    fn test_high_sensitivity_removes() {
        let verdict = analyzer().assess(
            "blasphemy, ethnic slurs and misogyny",
            &ModerationContext::new(),
        );
        // 0.6 * 1.2 = 0.72
        assert_eq!(verdict.decision(), Decision::Remove);
        assert!((verdict.confidence().value() - 0.82).abs() < 1e-9);
        assert!(verdict
            .evidence()
            .contains(&"Cultural sensitivity: ethnic - ethnic_slurs".to_string()));
    }

    #[test]
    fn test_cultural_benefit_raises_confidence() {
        let verdict = analyzer().assess(
            "A cultural education event with cross cultural dialogue and inclusive content",
            &ModerationContext::new(),
        );
        assert_eq!(verdict.decision(), Decision::Allow);
        assert!((verdict.confidence().value() - 0.8).abs() < 1e-9);
        assert_eq!(verdict.evidence().len(), 3);
    }
}
