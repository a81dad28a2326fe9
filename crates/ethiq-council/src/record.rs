//! Deliberation records: the audit trail of one request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consensus::DecisionScores;
use crate::context::RequestPreview;
use crate::cross_exam::CrossExamination;
use crate::dispatcher::{AnalyzerFailure, VerdictMap};
use crate::verdict::Verdict;

/// Everything that happened while deliberating one request.
///
/// Records are never modified after the Commander creates them; history and
/// sinks share them behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliberationRecord {
    /// Unique deliberation id.
    pub task_id: Uuid,
    /// When the deliberation started.
    pub created_at: DateTime<Utc>,
    /// Redacted view of the request.
    pub request: RequestPreview,
    /// Per-analyzer verdicts, fallbacks included.
    pub verdicts: VerdictMap,
    /// Analyzers that failed.
    pub failures: Vec<AnalyzerFailure>,
    /// Cross-examination of the verdicts.
    pub examination: CrossExamination,
    /// Normalized decision scores.
    pub scores: DecisionScores,
    /// The synthesized verdict.
    pub final_verdict: Verdict,
    /// Wall-clock duration of the deliberation.
    pub duration_ms: u64,
}

impl DeliberationRecord {
    /// Number of analyzers consulted.
    pub fn analyzer_count(&self) -> usize {
        self.verdicts.len()
    }

    /// Number of analyzers that failed.
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Returns true if `analyzer` failed in this deliberation.
    pub fn is_failed(&self, analyzer: &str) -> bool {
        self.failures.iter().any(|f| f.analyzer == analyzer)
    }
}
