//! Free-speech analyzer: the value of content to open discourse.
//!
//! Any recognized speech restriction (incitement, true threats, defamation
//! and similar) removes the content. Otherwise speech value decides between
//! a confident allow, a tentative allow and review.

use async_trait::async_trait;
use tracing::debug;

use ethiq_council::{Analyzer, Decision, ModerationContext, Result, Verdict};

use crate::keywords::{KeywordCategories, KeywordSet};

/// Registry name.
pub const NAME: &str = "free_speech";

/// Framework label.
pub const FRAMEWORK: &str = "Free Speech Ethics";

/// Protected speech categories.
pub const SPEECH_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "political",
        &["political_speech", "government_criticism", "policy_discussion"],
    ),
    (
        "artistic",
        &["artistic_expression", "creative_content", "satire", "parody"],
    ),
    (
        "educational",
        &["educational_content", "scientific_discussion", "academic_debate"],
    ),
    (
        "journalistic",
        &["news_reporting", "investigative_journalism", "public_interest"],
    ),
    (
        "personal",
        &["personal_opinion", "individual_expression", "self_expression"],
    ),
];

/// Recognized limits on protected speech.
pub const SPEECH_RESTRICTIONS: &[&str] = &[
    "incitement_to_violence",
    "true_threats",
    "fighting_words",
    "obscenity",
    "defamation",
    "commercial_speech",
];

/// Freedom-of-expression analyzer.
#[derive(Debug, Clone)]
pub struct FreeSpeechAnalyzer {
    categories: KeywordCategories,
    restrictions: KeywordSet,
}

impl FreeSpeechAnalyzer {
    /// Creates the analyzer with the default lists.
    pub fn new() -> Result<Self> {
        Ok(Self {
            categories: KeywordCategories::new(
                SPEECH_CATEGORIES
                    .iter()
                    .map(|(category, keywords)| (*category, keywords.iter().copied())),
            )?,
            restrictions: KeywordSet::new(SPEECH_RESTRICTIONS.iter().copied())?,
        })
    }

    fn speech_value(&self, content: &str, context: &ModerationContext) -> f64 {
        let mut value = 0.2 * self.categories.count(content) as f64;
        if context.public_platform().unwrap_or(true) {
            value *= 1.2;
        }
        if context.democratic_value() {
            value += 0.3;
        }
        value.min(1.0)
    }

    /// Scores `content` synchronously.
    pub fn assess(&self, content: &str, context: &ModerationContext) -> Verdict {
        let value = self.speech_value(content, context);
        let restrictions = self.restrictions.matches(content);

        let (decision, confidence) = if !restrictions.is_empty() {
            (Decision::Remove, 0.8)
        } else if value > 0.7 {
            (Decision::Allow, 0.9)
        } else if value > 0.4 {
            (Decision::Allow, 0.7)
        } else {
            (Decision::FlagForReview, 0.6)
        };

        debug!(
            "Free speech value {:.2}, {} restrictions",
            value,
            restrictions.len()
        );

        let rationale = format!(
            "Speech value {:.2} with {} recognized restrictions; {} with freedom of expression as the priority.",
            value,
            restrictions.len(),
            decision
        );

        let mut evidence: Vec<String> = self
            .categories
            .matches(content)
            .into_iter()
            .map(|(category, keyword)| format!("Speech category: {} - {}", category, keyword))
            .collect();
        evidence.extend(
            restrictions
                .into_iter()
                .map(|keyword| format!("Speech restriction: {}", keyword)),
        );

        Verdict::new(NAME, FRAMEWORK, decision, confidence, rationale).with_evidence(evidence)
    }
}

#[async_trait]
impl Analyzer for FreeSpeechAnalyzer {
    fn name(&self) -> &str {
        NAME
    }

    fn framework(&self) -> &str {
        FRAMEWORK
    }

    fn description(&self) -> &str {
        "Evaluates content by its value to open and democratic discourse"
    }

    async fn analyze(&self, content: &str, context: &ModerationContext) -> Result<Verdict> {
        Ok(self.assess(content, context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> FreeSpeechAnalyzer {
        FreeSpeechAnalyzer::new().unwrap()
    }

    #[test]
    fn test_low_value_speech_is_flagged() {
        let verdict = analyzer().assess("lol", &ModerationContext::new());
        assert_eq!(verdict.decision(), Decision::FlagForReview);
        assert!((verdict.confidence().value() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_restriction_removes() {
        let verdict = analyzer().assess(
            "This satire crosses into incitement to violence",
            &ModerationContext::new(),
        );
        assert_eq!(verdict.decision(), Decision::Remove);
        assert!((verdict.confidence().value() - 0.8).abs() < 1e-9);
        assert!(verdict
            .evidence()
            .contains(&"Speech restriction: incitement_to_violence".to_string()));
    }

    #[test]
    fn test_political_satire_is_allowed() {
        let verdict = analyzer().assess(
            "Political speech: a satire and parody of government criticism",
            &ModerationContext::new(),
        );
        // 4 * 0.2 * 1.2 = 0.96
        assert_eq!(verdict.decision(), Decision::Allow);
        assert!((verdict.confidence().value() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_private_platform_and_democratic_value() {
        let a = analyzer();
        let content = "satire and parody";

        let public = a.speech_value(content, &ModerationContext::new());
        let private = a.speech_value(content, &ModerationContext::new().with("public_platform", false));
        assert!((public - 0.48).abs() < 1e-9);
        assert!((private - 0.4).abs() < 1e-9);

        let democratic = a.speech_value(
            content,
            &ModerationContext::new().with("democratic_value", true),
        );
        assert!((democratic - 0.78).abs() < 1e-9);
        assert_eq!(
            a.assess(content, &ModerationContext::new().with("democratic_value", true))
                .decision(),
            Decision::Allow
        );
    }
}
