//! Best-effort observers of completed deliberations.
//!
//! The Commander hands every record to its audit sinks and emits events to
//! its metrics sinks from a background task. Sink errors are logged and
//! dropped; they never reach the caller of `deliberate`.

use async_trait::async_trait;
use serde_json::Value;

use crate::record::DeliberationRecord;
use crate::Result;

/// Metrics event emitted once per deliberation.
pub const EVENT_DELIBERATION_COMPLETED: &str = "deliberation.completed";

/// Metrics event emitted once per failed analyzer.
pub const EVENT_ANALYZER_FAILED: &str = "analyzer.failed";

/// Receives every completed deliberation record.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Name used in log messages.
    fn name(&self) -> &str;

    /// Persists or forwards `record`.
    async fn record(&self, record: &DeliberationRecord) -> Result<()>;
}

/// Receives named metrics events.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Name used in log messages.
    fn name(&self) -> &str;

    /// Records one event with a JSON payload.
    async fn emit(&self, event: &str, payload: Value) -> Result<()>;
}
