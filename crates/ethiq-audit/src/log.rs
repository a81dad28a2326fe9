//! In-memory audit log.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;
use uuid::Uuid;

use ethiq_council::{AuditSink, DeliberationRecord};

use crate::report::{AuditReport, ReportPeriod};

/// Append-only, in-memory record of deliberations. Only [`AuditLog::prune`]
/// removes entries.
///
/// Cloning an `AuditLog` shares the underlying entries, so one handle can be
/// registered with a commander while another is used for reporting.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    entries: Arc<RwLock<Vec<Arc<DeliberationRecord>>>>,
}

impl AuditLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    pub fn append(&self, record: Arc<DeliberationRecord>) {
        debug!("Audit log append: {}", record.task_id);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing was logged.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every record, oldest first.
    pub fn records(&self) -> Vec<Arc<DeliberationRecord>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Looks up a record by task id.
    pub fn get(&self, task_id: Uuid) -> Option<Arc<DeliberationRecord>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|r| r.task_id == task_id)
            .cloned()
    }

    /// Drops all but the newest `keep_last` records and returns how many
    /// were removed.
    pub fn prune(&self, keep_last: usize) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let excess = entries.len().saturating_sub(keep_last);
        entries.drain(..excess);
        if excess > 0 {
            debug!("Audit log pruned {} records", excess);
        }
        excess
    }

    /// Builds a report for `period` as of now.
    pub fn report(&self, period: ReportPeriod) -> AuditReport {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        AuditReport::build(period, Utc::now(), entries.iter().map(Arc::as_ref))
    }
}

#[async_trait]
impl AuditSink for AuditLog {
    fn name(&self) -> &str {
        "audit_log"
    }

    async fn record(&self, record: &DeliberationRecord) -> ethiq_council::Result<()> {
        self.append(Arc::new(record.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethiq_council::{Commander, Decision, ModerationContext};
    use std::sync::Arc;

    mod fixture {
        use async_trait::async_trait;
        use ethiq_council::{Analyzer, Decision, ModerationContext, Result, Verdict};

        pub struct Fixed(pub &'static str, pub Decision, pub f64);

        #[async_trait]
        impl Analyzer for Fixed {
            fn name(&self) -> &str {
                self.0
            }

            fn framework(&self) -> &str {
                "Test Ethics"
            }

            async fn analyze(&self, _c: &str, _ctx: &ModerationContext) -> Result<Verdict> {
                Ok(Verdict::new(self.0, "Test Ethics", self.1, self.2, "fixed"))
            }
        }
    }

    #[tokio::test]
    async fn test_prune_keeps_newest() {
        let log = AuditLog::new();
        let commander = Commander::builder()
            .analyzer(fixture::Fixed("a", Decision::Allow, 0.9))
            .audit_sink(Arc::new(log.clone()))
            .build()
            .unwrap();

        for content in ["one", "two", "three"] {
            commander.deliberate(content, ModerationContext::new()).await;
        }
        commander.flush().await;

        assert_eq!(log.prune(5), 0);
        assert_eq!(log.prune(1), 2);
        let records = log.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].request.content_preview, "three");
        assert_eq!(log.prune(0), 1);
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_log_collects_and_reports() {
        let log = AuditLog::new();
        let commander = Commander::builder()
            .analyzer(fixture::Fixed("a", Decision::Allow, 0.9))
            .analyzer(fixture::Fixed("b", Decision::Allow, 0.9))
            .audit_sink(Arc::new(log.clone()))
            .build()
            .unwrap();

        commander.deliberate("one", ModerationContext::new()).await;
        commander.deliberate("two", ModerationContext::new()).await;
        commander.flush().await;

        assert_eq!(log.len(), 2);
        let report = log.report(ReportPeriod::Today);
        assert_eq!(report.total_deliberations, 2);
        assert_eq!(report.decision_summary[&Decision::Allow], 2);
        assert!((report.deliberation_quality.consensus_rate - 1.0).abs() < f64::EPSILON);
        assert_eq!(report.deliberation_quality.conflict_rate, 0.0);
        assert!((report.deliberation_quality.average_analyzers_per_deliberation - 2.0).abs() < f64::EPSILON);

        let perf = &report.analyzer_performance["a"];
        assert_eq!(perf.total_decisions, 2);
        assert!((perf.average_confidence - 0.9).abs() < 1e-9);
        assert_eq!(perf.failures, 0);

        let first = log.records()[0].task_id;
        assert!(log.get(first).is_some());
    }
}
