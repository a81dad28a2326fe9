//! The response shape returned to callers of [`crate::Ethiq::moderate`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use ethiq_council::{Decision, DeliberationRecord, Explanation, Verdict};

/// One analyzer's view, as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerOutcome {
    /// The analyzer's decision.
    pub decision: Decision,
    /// The analyzer's confidence in `[0, 1]`.
    pub confidence: f64,
    /// The analyzer's rationale.
    pub reasoning: String,
    /// Evidence items the analyzer cited.
    pub evidence: Vec<String>,
}

impl From<&Verdict> for AnalyzerOutcome {
    fn from(verdict: &Verdict) -> Self {
        Self {
            decision: verdict.decision(),
            confidence: verdict.confidence().value(),
            reasoning: verdict.rationale().to_string(),
            evidence: verdict.evidence().to_vec(),
        }
    }
}

/// Final moderation outcome.
///
/// Serializes as:
///
/// ```json
/// {
///   "decision": "FLAG_FOR_REVIEW",
///   "confidence": 0.52,
///   "reasoning": "...",
///   "evidence": ["..."],
///   "task_id": "7f0c...",
///   "per_analyzer": { "utilitarian": { "decision": "ALLOW", ... } },
///   "explanation": { "text": { "user_friendly": "...", ... }, ... }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationOutcome {
    /// Final decision.
    pub decision: Decision,
    /// Calibrated confidence in the final decision.
    pub confidence: f64,
    /// Narrative of how the decision was reached.
    pub reasoning: String,
    /// Evidence supporting the final decision.
    pub evidence: Vec<String>,
    /// Deliberation id, usable with [`crate::Ethiq::find`].
    pub task_id: String,
    /// Each analyzer's view, keyed by analyzer name.
    pub per_analyzer: BTreeMap<String, AnalyzerOutcome>,
    /// The decision explained for users and moderators.
    pub explanation: Explanation,
}

impl From<&DeliberationRecord> for ModerationOutcome {
    fn from(record: &DeliberationRecord) -> Self {
        let verdict = &record.final_verdict;
        Self {
            decision: verdict.decision(),
            confidence: verdict.confidence().value(),
            reasoning: verdict.rationale().to_string(),
            evidence: verdict.evidence().to_vec(),
            task_id: record.task_id.to_string(),
            per_analyzer: record
                .verdicts
                .iter()
                .map(|(name, verdict)| (name.clone(), AnalyzerOutcome::from(verdict)))
                .collect(),
            explanation: Explanation::of(record),
        }
    }
}

impl ModerationOutcome {
    /// Returns true unless the content was removed.
    pub fn is_allowed(&self) -> bool {
        self.decision != Decision::Remove
    }

    /// Returns true if a human should look at the content.
    pub fn needs_review(&self) -> bool {
        self.decision == Decision::FlagForReview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethiq_council::{Commander, ModerationContext, ModerationRequest};

    #[tokio::test]
    async fn test_outcome_shape() {
        let commander = Commander::builder().build().unwrap();
        let record = commander
            .deliberate_request(ModerationRequest::new("hello", ModerationContext::new()))
            .await;

        let outcome = ModerationOutcome::from(record.as_ref());
        assert_eq!(outcome.task_id, record.task_id.to_string());
        assert!(outcome.needs_review());
        assert!(outcome.is_allowed());

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["decision"], "FLAG_FOR_REVIEW");
        assert!(json["confidence"].is_number());
        assert!(json["reasoning"].is_string());
        assert!(json["evidence"].is_array());
        assert!(json["per_analyzer"].as_object().unwrap().is_empty());
        assert_eq!(json["explanation"]["decision"], "FLAG_FOR_REVIEW");
        assert!(json["explanation"]["recommendations"].is_array());
    }

    #[test]
    fn test_outcome_explains_record() {
        let verdicts = [("a", Decision::Remove), ("b", Decision::Remove)]
            .into_iter()
            .map(|(name, decision)| {
                (
                    name.to_string(),
                    Verdict::new(name, "Framework", decision, 0.95, "harmful"),
                )
            })
            .collect();
        let examination = ethiq_council::CrossExaminer::new().examine(&verdicts);
        let synthesis =
            ethiq_council::ConsensusSynthesizer::new().synthesize(&verdicts, &examination, &[]);
        let record = DeliberationRecord {
            task_id: uuid::Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            request: ModerationRequest::new("post", ModerationContext::new()).preview(),
            verdicts,
            failures: Vec::new(),
            examination,
            scores: synthesis.scores,
            final_verdict: synthesis.verdict,
            duration_ms: 1,
        };

        let outcome = ModerationOutcome::from(&record);
        assert_eq!(outcome.decision, Decision::Remove);
        assert_eq!(outcome.explanation.decision, Decision::Remove);
        assert_eq!(outcome.explanation.task_id, record.task_id);
        assert_eq!(
            outcome.explanation.recommendations[0],
            "Content should be removed promptly"
        );
        assert!(outcome.explanation.user_notification().starts_with("❌ "));
    }

    #[test]
    fn test_analyzer_outcome_from_verdict() {
        let verdict = Verdict::new("a", "Framework", Decision::Remove, 0.9, "bad")
            .with_evidence_item("x");
        let outcome = AnalyzerOutcome::from(&verdict);
        assert_eq!(outcome.decision, Decision::Remove);
        assert_eq!(outcome.confidence, 0.9);
        assert_eq!(outcome.reasoning, "bad");
        assert_eq!(outcome.evidence, vec!["x"]);
    }
}
