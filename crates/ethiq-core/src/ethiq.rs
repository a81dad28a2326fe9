//! The unified Ethiq facade.
//!
//! [`Ethiq`] wires a configured analyzer panel, the deliberation
//! [`Commander`], and the audit sinks into one object with a single
//! moderation entry point.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use ethiq_audit::{AuditLog, AuditReport, AuditStore, MetricsRecorder, ReportPeriod};
use ethiq_council::{
    Analyzer, AnalyzerInfo, Commander, DeliberationRecord, Explanation, ModerationContext,
    ModerationRequest, Verdict,
};

use crate::config::EthiqConfig;
use crate::outcome::ModerationOutcome;
use crate::Result;

/// The unified content moderation facade.
///
/// # Pipeline
///
/// 1. Every enabled analyzer examines the content concurrently.
/// 2. The verdicts are cross-examined for agreement and conflict.
/// 3. A weighted consensus produces the final decision.
/// 4. The record is handed to the audit log, the audit store (if any) and
///    the metrics recorder.
///
/// Moderation never fails: analyzer crashes and timeouts lower confidence
/// and show up in the record instead.
///
/// # Example
///
/// ```rust,ignore
/// let ethiq = Ethiq::new(EthiqConfig::default())?;
///
/// let outcome = ethiq
///     .moderate("Research shows this program helps students.", ModerationContext::new())
///     .await;
///
/// if outcome.needs_review() {
///     // queue for a human moderator
/// }
/// ```
pub struct Ethiq {
    config: EthiqConfig,
    commander: Commander,
    audit_log: Option<AuditLog>,
    audit_store: Option<AuditStore>,
    metrics: MetricsRecorder,
}

impl Ethiq {
    /// Creates a facade running the built-in analyzers named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration does not validate
    /// - The audit database cannot be opened
    pub fn new(config: EthiqConfig) -> Result<Self> {
        config.validate()?;
        let panel = ethiq_agents::build_panel(&config.analyzers.enabled)?;
        Self::with_analyzers(config, panel)
    }

    /// Creates a facade running `analyzers` instead of the configured panel.
    ///
    /// `config.analyzers` is ignored; every other section applies.
    pub fn with_analyzers(config: EthiqConfig, analyzers: Vec<Arc<dyn Analyzer>>) -> Result<Self> {
        let metrics = MetricsRecorder::new(config.audit.metrics_buffer);

        let mut builder = Commander::builder()
            .analyzers(analyzers)
            .timeout(config.council.timeout())
            .synthesis_config(config.council.synthesis())
            .metrics_sink(Arc::new(metrics.clone()));

        let audit_log = config.audit.enabled.then(AuditLog::new);
        if let Some(log) = &audit_log {
            builder = builder.audit_sink(Arc::new(log.clone()));
        }

        let audit_store = match &config.audit.db_path {
            Some(path) => {
                let store = AuditStore::open(path)?;
                info!(
                    "Audit store opened at {} ({} records)",
                    path.display(),
                    store.len()
                );
                builder = builder.audit_sink(Arc::new(store.clone()));
                Some(store)
            }
            None => None,
        };

        let commander = builder.build()?;

        info!(
            "Ethiq initialized with {} analyzers: {}",
            commander.analyzer_count(),
            commander.analyzer_names().join(", ")
        );

        Ok(Self {
            config,
            commander,
            audit_log,
            audit_store,
            metrics,
        })
    }

    /// Moderates `content` and returns the full outcome.
    pub async fn moderate(
        &self,
        content: impl Into<String>,
        context: ModerationContext,
    ) -> ModerationOutcome {
        let record = self.deliberate(content, context).await;
        ModerationOutcome::from(record.as_ref())
    }

    /// Moderates `content` and returns the deliberation record.
    pub async fn deliberate(
        &self,
        content: impl Into<String>,
        context: ModerationContext,
    ) -> Arc<DeliberationRecord> {
        self.commander
            .deliberate_request(ModerationRequest::new(content, context))
            .await
    }

    /// Moderates `content` and returns only the final verdict.
    pub async fn verdict(&self, content: impl Into<String>, context: ModerationContext) -> Verdict {
        self.commander.deliberate(content, context).await
    }

    /// Builds an audit report for `period`.
    ///
    /// Uses the audit log when enabled, otherwise the commander's history.
    pub fn report(&self, period: ReportPeriod) -> AuditReport {
        match &self.audit_log {
            Some(log) => log.report(period),
            None => {
                let history = self.commander.history();
                AuditReport::build(period, Utc::now(), history.iter().map(Arc::as_ref))
            }
        }
    }

    /// Registered analyzers, in dispatch order.
    pub fn agents(&self) -> Vec<AnalyzerInfo> {
        self.commander.analyzers()
    }

    /// Completed deliberations, oldest first.
    pub fn history(&self) -> Vec<Arc<DeliberationRecord>> {
        self.commander.history()
    }

    /// Looks up a completed deliberation.
    pub fn find(&self, task_id: Uuid) -> Option<Arc<DeliberationRecord>> {
        self.commander.find(task_id)
    }

    /// Explains a completed deliberation.
    pub fn explain(&self, task_id: Uuid) -> Option<Explanation> {
        self.find(task_id).map(|record| Explanation::of(&record))
    }

    /// Keeps only the newest `keep_last` deliberations in the commander
    /// history and the in-memory audit log. Returns how many records were
    /// dropped from history. The persistent store is not touched.
    pub fn prune_history(&self, keep_last: usize) -> usize {
        let pruned = self.commander.prune_history(keep_last);
        if let Some(log) = &self.audit_log {
            log.prune(keep_last);
        }
        info!("History pruned to {} records ({} dropped)", keep_last, pruned);
        pruned
    }

    /// The metrics recorder.
    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    /// The in-memory audit log, if enabled.
    pub fn audit_log(&self) -> Option<&AuditLog> {
        self.audit_log.as_ref()
    }

    /// The persistent audit store, if configured.
    pub fn audit_store(&self) -> Option<&AuditStore> {
        self.audit_store.as_ref()
    }

    /// The underlying commander.
    pub fn commander(&self) -> &Commander {
        &self.commander
    }

    /// The active configuration.
    pub fn config(&self) -> &EthiqConfig {
        &self.config
    }

    /// Waits for pending sink deliveries and flushes the audit store.
    pub async fn flush(&self) -> Result<()> {
        self.commander.flush().await;
        if let Some(store) = &self.audit_store {
            store.flush()?;
        }
        Ok(())
    }
}
