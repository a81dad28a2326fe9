//! # Ethiq Audit
//!
//! Sinks that observe completed deliberations:
//!
//! - [`AuditLog`]: in-memory, append-only log with period reports.
//! - [`AuditStore`]: Sled-backed persistent log keyed by task id.
//! - [`MetricsRecorder`]: per-event counters and a bounded buffer of recent
//!   events, mirrored to `tracing`.
//!
//! All three implement the council's sink traits and can be registered on a
//! `Commander`. Sinks are best-effort: a failing sink is logged and never
//! changes a verdict.

pub mod error;
pub mod log;
pub mod metrics;
pub mod report;
pub mod store;

pub use error::{AuditError, Result};
pub use log::AuditLog;
pub use metrics::{MetricEvent, MetricsRecorder, DEFAULT_METRICS_BUFFER};
pub use report::{AnalyzerPerformance, AuditReport, DeliberationQuality, ReportPeriod};
pub use store::AuditStore;
