//! Utilitarian analyzer: weighs expected harm against expected benefit.
//!
//! # Scoring
//!
//! - Harm: 0.2 per harm indicator, ×1.5 for audiences above 10 000,
//!   ×1.3 for vulnerable audiences, capped at 1.
//! - Benefit: 0.15 per benefit indicator, +0.3 for educational value,
//!   +0.2 for public interest, capped at 1.
//!
//! | Net utility (benefit − harm) | Decision        | Confidence            |
//! |------------------------------|-----------------|-----------------------|
//! | > 0.3                        | ALLOW           | min(0.9, net + 0.5)   |
//! | > −0.2                       | FLAG_FOR_REVIEW | 0.6                   |
//! | otherwise                    | REMOVE          | min(0.9, abs(net))    |

use async_trait::async_trait;
use tracing::debug;

use ethiq_council::{Analyzer, Decision, ModerationContext, Result, Verdict};

use crate::keywords::KeywordSet;

/// Registry name.
pub const NAME: &str = "utilitarian";

/// Framework label.
pub const FRAMEWORK: &str = "Utilitarianism";

const LARGE_AUDIENCE: u64 = 10_000;

/// Default harm indicators.
pub const HARM_INDICATORS: &[&str] = &[
    "violence",
    "hate speech",
    "harassment",
    "misinformation",
    "discrimination",
    "bullying",
    "threats",
    "harmful content",
];

/// Default benefit indicators.
pub const BENEFIT_INDICATORS: &[&str] = &[
    "education",
    "awareness",
    "discussion",
    "satire",
    "artistic expression",
    "political speech",
    "scientific information",
    "public interest",
];

/// Harm-versus-benefit analyzer.
#[derive(Debug, Clone)]
pub struct UtilitarianAnalyzer {
    harm: KeywordSet,
    benefit: KeywordSet,
}

impl UtilitarianAnalyzer {
    /// Creates the analyzer with the default indicator lists.
    pub fn new() -> Result<Self> {
        Self::with_indicators(HARM_INDICATORS.iter().copied(), BENEFIT_INDICATORS.iter().copied())
    }

    /// Creates the analyzer with custom indicator lists.
    pub fn with_indicators<H, B, S>(harm: H, benefit: B) -> Result<Self>
    where
        H: IntoIterator<Item = S>,
        B: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            harm: KeywordSet::new(harm)?,
            benefit: KeywordSet::new(benefit)?,
        })
    }

    fn harm_score(&self, content: &str, context: &ModerationContext) -> f64 {
        let mut score = 0.2 * self.harm.count(content) as f64;
        if context.audience_size().map_or(false, |n| n > LARGE_AUDIENCE) {
            score *= 1.5;
        }
        if context.vulnerable_audience() {
            score *= 1.3;
        }
        score.min(1.0)
    }

    fn benefit_score(&self, content: &str, context: &ModerationContext) -> f64 {
        let mut score = 0.15 * self.benefit.count(content) as f64;
        if context.educational_value() {
            score += 0.3;
        }
        if context.public_interest() {
            score += 0.2;
        }
        score.min(1.0)
    }

    /// Scores `content` synchronously.
    pub fn assess(&self, content: &str, context: &ModerationContext) -> Verdict {
        let harm = self.harm_score(content, context);
        let benefit = self.benefit_score(content, context);
        let net = benefit - harm;

        let (decision, confidence) = if net > 0.3 {
            (Decision::Allow, (net + 0.5).min(0.9))
        } else if net > -0.2 {
            (Decision::FlagForReview, 0.6)
        } else {
            (Decision::Remove, net.abs().min(0.9))
        };

        debug!(
            "Utilitarian net utility {:.2} (benefit {:.2}, harm {:.2})",
            net, benefit, harm
        );

        let rationale = format!(
            "Net utility {:.2} (benefits {:.2}, harms {:.2}); {} maximizes overall welfare.",
            net, benefit, harm, decision
        );

        let evidence = self
            .harm
            .matches(content)
            .into_iter()
            .chain(self.benefit.matches(content))
            .map(|keyword| format!("Contains '{}' indicators", keyword))
            .collect();

        Verdict::new(NAME, FRAMEWORK, decision, confidence, rationale).with_evidence(evidence)
    }
}

#[async_trait]
impl Analyzer for UtilitarianAnalyzer {
    fn name(&self) -> &str {
        NAME
    }

    fn framework(&self) -> &str {
        FRAMEWORK
    }

    fn description(&self) -> &str {
        "Weighs potential harm against benefit for the greatest good of the audience"
    }

    async fn analyze(&self, content: &str, context: &ModerationContext) -> Result<Verdict> {
        Ok(self.assess(content, context))
    }
}
