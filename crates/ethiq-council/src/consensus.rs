//! Consensus synthesis: weighted voting with confidence calibration.
//!
//! # Algorithm
//!
//! 1. Each verdict contributes `confidence * weight(framework)` to the bucket
//!    of its decision. Unknown frameworks get [`DEFAULT_FRAMEWORK_WEIGHT`].
//! 2. Bucket scores are normalized to sum to 1 (equal thirds if the total
//!    is zero). Normalizing the scores also normalizes the weights, so the
//!    configured weights need not sum to 1.
//! 3. The highest bucket wins; ties go to the more conservative decision
//!    (`REMOVE > FLAG_FOR_REVIEW > ALLOW`).
//! 4. The winning score is calibrated: boosted on unanimity, damped on
//!    conflict, nudged by the share of high-confidence analyzers, then
//!    clamped to `[0.1, 0.95]`.
//! 5. A decisive candidate (`ALLOW` or `REMOVE`) whose calibrated confidence
//!    is below the decision threshold is downgraded to `FLAG_FOR_REVIEW`.
//!
//! The tie-break precedence is a policy choice: on evenly split evidence the
//! system prefers the outcome that keeps a human in the loop or protects the
//! audience, and the low-confidence downgrade then routes most such ties to
//! review anyway.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::cross_exam::{AgreementLevel, CrossExamination};
use crate::dispatcher::{AnalyzerFailure, VerdictMap};
use crate::error::CouncilError;
use crate::verdict::{Confidence, Decision, Verdict, FALLBACK_CONFIDENCE};
use crate::Result;

/// Source label of synthesized verdicts.
pub const CONSENSUS_SOURCE: &str = "consensus";

/// Framework label of synthesized verdicts.
pub const CONSENSUS_FRAMEWORK: &str = "Multi-Perspective Synthesis";

/// Weight given to frameworks missing from the weight table.
pub const DEFAULT_FRAMEWORK_WEIGHT: f64 = 0.25;

/// Minimum calibrated confidence for a decisive outcome.
pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.6;

/// Built-in framework weights.
pub fn default_framework_weights() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("Utilitarianism".to_string(), 0.25),
        ("Deontological Ethics".to_string(), 0.25),
        ("Cultural Ethics".to_string(), 0.20),
        ("Free Speech Ethics".to_string(), 0.30),
    ])
}

/// Calibration constants for the synthesizer.
///
/// Every constant is configurable so tests and deployments can override the
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Weight per framework label.
    pub framework_weights: BTreeMap<String, f64>,
    /// Weight for unrecognized frameworks.
    pub default_weight: f64,
    /// Below this calibrated confidence, decisive outcomes become review.
    pub decision_threshold: f64,
    /// Multiplier applied on unanimous agreement.
    pub unanimity_boost: f64,
    /// Multiplier applied when analyzers conflict.
    pub conflict_damping: f64,
    /// Multiplier applied when the high-confidence share exceeds `high_ratio_upper`.
    pub high_confidence_boost: f64,
    /// Multiplier applied when the high-confidence share is below `high_ratio_lower`.
    pub low_confidence_damping: f64,
    /// Upper bound on the high-confidence share.
    pub high_ratio_upper: f64,
    /// Lower bound on the high-confidence share.
    pub high_ratio_lower: f64,
    /// Smallest confidence ever reported.
    pub min_confidence: f64,
    /// Largest confidence ever reported.
    pub max_confidence: f64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            framework_weights: default_framework_weights(),
            default_weight: DEFAULT_FRAMEWORK_WEIGHT,
            decision_threshold: DEFAULT_DECISION_THRESHOLD,
            unanimity_boost: 1.2,
            conflict_damping: 0.8,
            high_confidence_boost: 1.1,
            low_confidence_damping: 0.9,
            high_ratio_upper: 0.7,
            high_ratio_lower: 0.3,
            min_confidence: 0.1,
            max_confidence: 0.95,
        }
    }
}

impl SynthesisConfig {
    /// Same weight for every framework, known or not.
    pub fn equal_weights() -> Self {
        Self {
            framework_weights: BTreeMap::new(),
            ..Self::default()
        }
    }

    /// Sets the weight of one framework.
    pub fn with_weight(mut self, framework: impl Into<String>, weight: f64) -> Self {
        self.framework_weights.insert(framework.into(), weight);
        self
    }

    /// Sets the decision threshold.
    pub fn with_decision_threshold(mut self, threshold: f64) -> Self {
        self.decision_threshold = threshold;
        self
    }

    /// Weight for `framework`.
    pub fn weight(&self, framework: &str) -> f64 {
        self.framework_weights
            .get(framework)
            .copied()
            .unwrap_or(self.default_weight)
    }

    /// Checks that every constant is usable.
    ///
    /// # Errors
    ///
    /// Returns [`CouncilError::InvalidConfig`] for negative or non-finite
    /// weights and factors, thresholds outside `[0, 1]`, or an inverted
    /// confidence clamp.
    pub fn validate(&self) -> Result<()> {
        for (framework, weight) in &self.framework_weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(CouncilError::InvalidConfig(format!(
                    "weight for '{}' must be a non-negative number, got {}",
                    framework, weight
                )));
            }
        }

        let factors = [
            ("default_weight", self.default_weight),
            ("unanimity_boost", self.unanimity_boost),
            ("conflict_damping", self.conflict_damping),
            ("high_confidence_boost", self.high_confidence_boost),
            ("low_confidence_damping", self.low_confidence_damping),
        ];
        for (name, value) in factors {
            if !value.is_finite() || value < 0.0 {
                return Err(CouncilError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        let unit = [
            ("decision_threshold", self.decision_threshold),
            ("high_ratio_upper", self.high_ratio_upper),
            ("high_ratio_lower", self.high_ratio_lower),
            ("min_confidence", self.min_confidence),
            ("max_confidence", self.max_confidence),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(CouncilError::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.min_confidence > self.max_confidence {
            return Err(CouncilError::InvalidConfig(format!(
                "min_confidence {} exceeds max_confidence {}",
                self.min_confidence, self.max_confidence
            )));
        }

        Ok(())
    }
}

/// Normalized score per decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionScores {
    /// Score of `ALLOW`.
    pub allow: f64,
    /// Score of `FLAG_FOR_REVIEW`.
    pub flag_for_review: f64,
    /// Score of `REMOVE`.
    pub remove: f64,
}

impl DecisionScores {
    /// Score of `decision`.
    pub fn get(&self, decision: Decision) -> f64 {
        match decision {
            Decision::Allow => self.allow,
            Decision::FlagForReview => self.flag_for_review,
            Decision::Remove => self.remove,
        }
    }

    fn add(&mut self, decision: Decision, amount: f64) {
        match decision {
            Decision::Allow => self.allow += amount,
            Decision::FlagForReview => self.flag_for_review += amount,
            Decision::Remove => self.remove += amount,
        }
    }

    /// Sum of all three scores.
    pub fn total(&self) -> f64 {
        self.allow + self.flag_for_review + self.remove
    }

    /// Scales scores to sum to 1. A zero total yields equal thirds.
    pub fn normalized(self) -> Self {
        let total = self.total();
        if total > 0.0 && total.is_finite() {
            Self {
                allow: self.allow / total,
                flag_for_review: self.flag_for_review / total,
                remove: self.remove / total,
            }
        } else {
            let third = 1.0 / 3.0;
            Self {
                allow: third,
                flag_for_review: third,
                remove: third,
            }
        }
    }

    /// Highest-scoring decision; ties go to the higher precedence.
    pub fn leader(&self) -> Decision {
        let mut best = Decision::Allow;
        for decision in Decision::ALL {
            let score = self.get(decision);
            let best_score = self.get(best);
            if score > best_score
                || (score == best_score && decision.precedence() > best.precedence())
            {
                best = decision;
            }
        }
        best
    }
}

/// Full result of one synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synthesis {
    /// The final verdict.
    pub verdict: Verdict,
    /// Normalized decision scores.
    pub scores: DecisionScores,
    /// Decision before the low-confidence override.
    pub candidate: Decision,
    /// True if the low-confidence override fired.
    pub downgraded: bool,
}

/// Combines analyzer verdicts into one calibrated verdict.
#[derive(Debug, Clone, Default)]
pub struct ConsensusSynthesizer {
    config: SynthesisConfig,
}

impl ConsensusSynthesizer {
    /// Creates a synthesizer with default calibration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a synthesizer with custom calibration.
    ///
    /// # Errors
    ///
    /// Returns [`CouncilError::InvalidConfig`] if `config` does not validate.
    pub fn with_config(config: SynthesisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the calibration in use.
    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Weighted, normalized decision scores for `verdicts`.
    pub fn score(&self, verdicts: &VerdictMap) -> DecisionScores {
        self.raw_scores(verdicts).normalized()
    }

    fn raw_scores(&self, verdicts: &VerdictMap) -> DecisionScores {
        let mut raw = DecisionScores::default();
        for verdict in verdicts.values() {
            let contribution = verdict.confidence().value() * self.config.weight(verdict.framework());
            raw.add(verdict.decision(), contribution);
        }
        raw
    }

    /// Calibrates the winning score against the cross-examination.
    pub fn calibrate(&self, base: f64, exam: &CrossExamination) -> Confidence {
        let cfg = &self.config;
        let mut confidence = base;

        if exam.is_unanimous() {
            confidence *= cfg.unanimity_boost;
        } else if exam.has_conflict() {
            confidence *= cfg.conflict_damping;
        }

        let high_ratio = exam.confidence_distribution.high_ratio();
        if high_ratio > cfg.high_ratio_upper {
            confidence *= cfg.high_confidence_boost;
        } else if high_ratio < cfg.high_ratio_lower {
            confidence *= cfg.low_confidence_damping;
        }

        Confidence::clamped(confidence, cfg.min_confidence, cfg.max_confidence)
    }

    /// Produces the final verdict.
    ///
    /// `failures` lists analyzers whose verdicts are fallbacks. When no
    /// analyzer produced a real verdict, the result is the inconclusive
    /// verdict regardless of how the fallbacks would have voted.
    pub fn synthesize(
        &self,
        verdicts: &VerdictMap,
        exam: &CrossExamination,
        failures: &[AnalyzerFailure],
    ) -> Synthesis {
        if verdicts.is_empty() || failures.len() >= verdicts.len() {
            return self.inconclusive(verdicts, failures);
        }

        let raw = self.raw_scores(verdicts);
        // A zero total means every score is an even split, not a vote.
        let weighted = raw.total() > 0.0 && raw.total().is_finite();
        let scores = raw.normalized();
        let candidate = scores.leader();
        let confidence = self.calibrate(scores.get(candidate), exam);

        let downgraded =
            candidate.is_decisive() && confidence.value() < self.config.decision_threshold;
        let decision = if downgraded {
            Decision::FlagForReview
        } else {
            candidate
        };

        let rationale = narrate(
            decision,
            candidate,
            weighted,
            confidence,
            self.config.decision_threshold,
            verdicts,
            exam,
            failures,
        );
        let evidence = collect_evidence(verdicts, exam);

        let verdict = Verdict::new(
            CONSENSUS_SOURCE,
            CONSENSUS_FRAMEWORK,
            decision,
            confidence.value(),
            rationale,
        )
        .with_evidence(evidence);

        Synthesis {
            verdict,
            scores,
            candidate,
            downgraded,
        }
    }

    fn inconclusive(&self, verdicts: &VerdictMap, failures: &[AnalyzerFailure]) -> Synthesis {
        let rationale = if verdicts.is_empty() {
            "No analysis could be completed: no analyzers produced a verdict. \
             Flagged for human review."
                .to_string()
        } else {
            let mut text = format!(
                "No analysis could be completed: all {} analyzers failed. Flagged for human review. Failures: ",
                failures.len()
            );
            let parts: Vec<String> = failures
                .iter()
                .map(|f| format!("{} ({})", f.analyzer, f.kind))
                .collect();
            text.push_str(&parts.join(", "));
            text.push('.');
            text
        };

        let evidence = failures
            .iter()
            .map(|f| format!("{}: {}", f.analyzer, f.detail))
            .collect();

        let verdict = Verdict::new(
            CONSENSUS_SOURCE,
            CONSENSUS_FRAMEWORK,
            Decision::FlagForReview,
            FALLBACK_CONFIDENCE,
            rationale,
        )
        .with_evidence(evidence);

        Synthesis {
            verdict,
            scores: DecisionScores::default().normalized(),
            candidate: Decision::FlagForReview,
            downgraded: false,
        }
    }
}

fn narrate(
    decision: Decision,
    candidate: Decision,
    weighted: bool,
    confidence: Confidence,
    threshold: f64,
    verdicts: &VerdictMap,
    exam: &CrossExamination,
    failures: &[AnalyzerFailure],
) -> String {
    let mut text = format!(
        "Final decision: {} with {} confidence. ",
        decision, confidence
    );

    if !weighted {
        let _ = write!(
            text,
            "No verdict carried any weight, so the scores were split evenly and the tie-break proposed {}. ",
            candidate
        );
    }

    if decision != candidate {
        if weighted {
            let _ = write!(
                text,
                "Weighted vote favored {} but confidence fell below the {:.2} threshold. ",
                candidate, threshold
            );
        } else {
            let _ = write!(
                text,
                "Confidence fell below the {:.2} threshold, so {} was not applied. ",
                threshold, candidate
            );
        }
    }

    match exam.agreement_level {
        AgreementLevel::Unanimous => {
            if let Some(agreement) = exam.agreements.first() {
                let _ = write!(
                    text,
                    "All analyzers unanimously agree on {}. ",
                    agreement.decision
                );
            }
        }
        AgreementLevel::Majority => text.push_str("A majority of analyzers agree; conflicts were weighed. "),
        AgreementLevel::Fragmented => text.push_str("Analyzers are fragmented with no majority. "),
        AgreementLevel::Empty => {}
    }

    let tiers = &exam.confidence_distribution;
    let _ = write!(
        text,
        "Confidence levels: {} high, {} medium, {} low. ",
        tiers.high.len(),
        tiers.medium.len(),
        tiers.low.len()
    );

    let frameworks: Vec<&str> = exam.framework_coverage.iter().map(String::as_str).collect();
    let _ = write!(
        text,
        "Frameworks consulted ({}): {}. ",
        frameworks.len(),
        frameworks.join(", ")
    );

    if !failures.is_empty() {
        let failed: Vec<&str> = failures.iter().map(|f| f.analyzer.as_str()).collect();
        let _ = write!(
            text,
            "{} analyzer(s) failed and were counted as review: {}. ",
            failures.len(),
            failed.join(", ")
        );
    }

    let summary: Vec<String> = verdicts
        .values()
        .map(|v| format!("{}: {} ({})", v.framework(), v.decision(), v.confidence()))
        .collect();
    let _ = write!(text, "Individual perspectives: {}.", summary.join(", "));

    text
}

fn collect_evidence(verdicts: &VerdictMap, exam: &CrossExamination) -> Vec<String> {
    let mut evidence: Vec<String> = verdicts
        .iter()
        .flat_map(|(name, verdict)| {
            verdict
                .evidence()
                .iter()
                .map(move |item| format!("{}: {}", name, item))
        })
        .collect();

    if exam.is_unanimous() {
        evidence.push("Unanimous agreement among all analyzers".to_string());
    }
    if exam.has_conflict() {
        evidence.push("Conflicting perspectives identified and resolved".to_string());
    }

    let frameworks: Vec<&str> = exam.framework_coverage.iter().map(String::as_str).collect();
    evidence.push(format!("Multi-framework analysis: {}", frameworks.join(", ")));

    evidence
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cross_exam::CrossExaminer;
    use crate::dispatcher::FailureKind;

    fn map(entries: &[(&str, &str, Decision, f64)]) -> VerdictMap {
        entries
            .iter()
            .map(|(name, framework, decision, confidence)| {
                (
                    name.to_string(),
                    Verdict::new(*name, *framework, *decision, *confidence, "test")
                        .with_evidence_item(format!("signal from {}", name)),
                )
            })
            .collect()
    }

    fn run(synth: &ConsensusSynthesizer, verdicts: &VerdictMap) -> Synthesis {
        let exam = CrossExaminer::new().examine(verdicts);
        synth.synthesize(verdicts, &exam, &[])
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let total: f64 = default_framework_weights().values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_framework_gets_default_weight() {
        let config = SynthesisConfig::default();
        assert_eq!(config.weight("Virtue Ethics"), DEFAULT_FRAMEWORK_WEIGHT);
        assert_eq!(config.weight("Free Speech Ethics"), 0.30);
    }

    #[test]
    fn test_scores_normalize() {
        let synth = ConsensusSynthesizer::new();
        let verdicts = map(&[
            ("a", "Utilitarianism", Decision::Allow, 0.8),
            ("b", "Free Speech Ethics", Decision::Remove, 0.5),
        ]);
        let scores = synth.score(&verdicts);
        assert!((scores.total() - 1.0).abs() < 1e-9);
        // 0.8 * 0.25 = 0.2 vs 0.5 * 0.30 = 0.15
        assert!((scores.allow - 0.2 / 0.35).abs() < 1e-9);
        assert_eq!(scores.flag_for_review, 0.0);
    }

    #[test]
    fn test_zero_total_gives_equal_thirds() {
        let scores = DecisionScores::default().normalized();
        assert!((scores.allow - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(scores.leader(), Decision::Remove);
    }

    #[test]
    fn test_tie_break_precedence() {
        let scores = DecisionScores {
            allow: 0.5,
            flag_for_review: 0.0,
            remove: 0.5,
        };
        assert_eq!(scores.leader(), Decision::Remove);

        let scores = DecisionScores {
            allow: 0.5,
            flag_for_review: 0.5,
            remove: 0.0,
        };
        assert_eq!(scores.leader(), Decision::FlagForReview);
    }

    #[test]
    fn test_unanimous_allow_is_boosted_and_clamped() {
        let synth = ConsensusSynthesizer::with_config(SynthesisConfig::equal_weights()).unwrap();
        let verdicts = map(&[
            ("a", "F", Decision::Allow, 0.9),
            ("b", "F", Decision::Allow, 0.9),
            ("c", "F", Decision::Allow, 0.9),
            ("d", "F", Decision::Allow, 0.9),
        ]);
        let result = run(&synth, &verdicts);

        assert_eq!(result.verdict.decision(), Decision::Allow);
        assert!((result.verdict.confidence().value() - 0.95).abs() < 1e-9);
        assert!(!result.downgraded);
        assert!(result
            .verdict
            .evidence()
            .contains(&"Unanimous agreement among all analyzers".to_string()));
        assert!(result.verdict.rationale().contains("unanimously"));
    }

    #[test]
    fn test_split_decision_downgrades_to_review() {
        let synth = ConsensusSynthesizer::with_config(SynthesisConfig::equal_weights()).unwrap();
        let verdicts = map(&[
            ("a", "F", Decision::Remove, 0.8),
            ("b", "F", Decision::Remove, 0.8),
            ("c", "F", Decision::Allow, 0.8),
            ("d", "F", Decision::Allow, 0.8),
        ]);
        let result = run(&synth, &verdicts);

        assert!((result.scores.remove - 0.5).abs() < 1e-9);
        assert!((result.scores.allow - 0.5).abs() < 1e-9);
        assert_eq!(result.candidate, Decision::Remove);
        // 0.5 * 0.8 (conflict) * 0.9 (no high-confidence analyzers)
        assert!((result.verdict.confidence().value() - 0.36).abs() < 1e-9);
        assert!(result.downgraded);
        assert_eq!(result.verdict.decision(), Decision::FlagForReview);
        assert!(result
            .verdict
            .evidence()
            .contains(&"Conflicting perspectives identified and resolved".to_string()));
    }

    #[test]
    fn test_threshold_minus_epsilon_downgrades() {
        let mut config = SynthesisConfig::equal_weights();
        config.conflict_damping = 1.0;
        config.low_confidence_damping = 1.0;
        let synth = ConsensusSynthesizer::with_config(config).unwrap();

        let verdicts = map(&[
            ("a", "F", Decision::Remove, 0.599),
            ("b", "F", Decision::Allow, 0.401),
        ]);
        let result = run(&synth, &verdicts);

        assert_eq!(result.candidate, Decision::Remove);
        assert!(result.verdict.confidence().value() < 0.6);
        assert_eq!(result.verdict.decision(), Decision::FlagForReview);
    }

    #[test]
    fn test_threshold_plus_epsilon_keeps_remove() {
        let mut config = SynthesisConfig::equal_weights();
        config.conflict_damping = 1.0;
        config.low_confidence_damping = 1.0;
        let synth = ConsensusSynthesizer::with_config(config).unwrap();

        let verdicts = map(&[
            ("a", "F", Decision::Remove, 0.61),
            ("b", "F", Decision::Allow, 0.39),
        ]);
        let result = run(&synth, &verdicts);

        assert_eq!(result.verdict.decision(), Decision::Remove);
        assert!(!result.downgraded);
    }

    #[test]
    fn test_flag_candidate_is_never_downgraded() {
        let synth = ConsensusSynthesizer::with_config(SynthesisConfig::equal_weights()).unwrap();
        let verdicts = map(&[
            ("a", "F", Decision::FlagForReview, 0.4),
            ("b", "F", Decision::FlagForReview, 0.4),
            ("c", "F", Decision::Allow, 0.3),
        ]);
        let result = run(&synth, &verdicts);
        assert_eq!(result.verdict.decision(), Decision::FlagForReview);
        assert!(!result.downgraded);
    }

    #[test]
    fn test_confidence_bounds_hold() {
        let synth = ConsensusSynthesizer::new();
        let cases = [
            map(&[("a", "F", Decision::Allow, 1.0)]),
            map(&[("a", "F", Decision::Allow, 0.0), ("b", "G", Decision::Remove, 0.0)]),
            map(&[("a", "F", Decision::Remove, 0.05), ("b", "G", Decision::Allow, 0.04)]),
        ];
        for verdicts in &cases {
            let value = run(&synth, verdicts).verdict.confidence().value();
            assert!((0.1..=0.95).contains(&value), "confidence {} out of bounds", value);
        }
    }

    #[test]
    fn test_empty_map_is_inconclusive() {
        let synth = ConsensusSynthesizer::new();
        let result = run(&synth, &VerdictMap::new());

        assert_eq!(result.verdict.decision(), Decision::FlagForReview);
        assert!((result.verdict.confidence().value() - 0.3).abs() < f64::EPSILON);
        assert!(result.verdict.rationale().contains("No analysis could be completed"));
        assert_eq!(result.verdict.source(), CONSENSUS_SOURCE);
    }

    #[test]
    fn test_weightless_unanimity_narrates_shared_decision() {
        let synth = ConsensusSynthesizer::new();
        let verdicts = map(&[
            ("a", "Utilitarianism", Decision::Allow, 0.0),
            ("b", "Utilitarianism", Decision::Allow, 0.0),
        ]);
        let result = run(&synth, &verdicts);
        let rationale = result.verdict.rationale();

        assert_eq!(result.candidate, Decision::Remove);
        assert!(result.downgraded);
        assert_eq!(result.verdict.decision(), Decision::FlagForReview);
        assert!(rationale.contains("unanimously agree on ALLOW"), "{}", rationale);
        assert!(!rationale.contains("unanimously agree on REMOVE"));
        assert!(!rationale.contains("Weighted vote favored"));
        assert!(rationale.contains("No verdict carried any weight"));
        assert!(rationale.contains("Confidence levels: 0 high, 0 medium, 2 low."));
    }

    #[test]
    fn test_confidence_levels_are_narrated() {
        let synth = ConsensusSynthesizer::new();
        let verdicts = map(&[
            ("utilitarian", "Utilitarianism", Decision::Remove, 0.9),
            ("deontological", "Deontological Ethics", Decision::Remove, 0.7),
            ("cultural", "Cultural Ethics", Decision::Allow, 0.4),
        ]);
        let rationale = run(&synth, &verdicts).verdict.rationale().to_string();

        assert!(rationale.contains("Confidence levels: 1 high, 1 medium, 1 low."));
        assert!(!rationale.contains("No verdict carried any weight"));
    }

    #[test]
    fn test_all_failed_is_inconclusive() {
        let synth = ConsensusSynthesizer::new();
        let verdicts: VerdictMap = ["a", "b"]
            .iter()
            .map(|n| (n.to_string(), Verdict::fallback(*n, "F", "Analysis failed")))
            .collect();
        let failures: Vec<AnalyzerFailure> = ["a", "b"]
            .iter()
            .map(|n| AnalyzerFailure {
                analyzer: n.to_string(),
                kind: FailureKind::Timeout,
                detail: "slow".to_string(),
            })
            .collect();
        let exam = CrossExaminer::new().examine(&verdicts);
        let result = synth.synthesize(&verdicts, &exam, &failures);

        assert_eq!(result.verdict.decision(), Decision::FlagForReview);
        assert!((result.verdict.confidence().value() - 0.3).abs() < f64::EPSILON);
        assert!(result.verdict.rationale().contains("all 2 analyzers failed"));
    }

    #[test]
    fn test_rationale_and_evidence_are_composed() {
        let synth = ConsensusSynthesizer::new();
        let verdicts = map(&[
            ("utilitarian", "Utilitarianism", Decision::Allow, 0.9),
            ("free_speech", "Free Speech Ethics", Decision::Allow, 0.85),
        ]);
        let result = run(&synth, &verdicts);
        let rationale = result.verdict.rationale();

        assert!(rationale.contains("Final decision: ALLOW"));
        assert!(rationale.contains("Utilitarianism: ALLOW (0.90)"));
        assert!(rationale.contains("Frameworks consulted (2)"));
        assert!(result
            .verdict
            .evidence()
            .contains(&"utilitarian: signal from utilitarian".to_string()));
        assert!(result
            .verdict
            .evidence()
            .iter()
            .any(|e| e.starts_with("Multi-framework analysis")));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = SynthesisConfig::default().with_weight("Utilitarianism", -1.0);
        assert!(ConsensusSynthesizer::with_config(bad).is_err());

        let bad = SynthesisConfig::default().with_decision_threshold(1.5);
        assert!(ConsensusSynthesizer::with_config(bad).is_err());

        let mut bad = SynthesisConfig::default();
        bad.min_confidence = 0.9;
        bad.max_confidence = 0.2;
        assert!(ConsensusSynthesizer::with_config(bad).is_err());
    }
}
