//! The Commander facade: one entry point for a full deliberation.
//!
//! The commander owns the analyzer registry and drives each request through
//! the pipeline:
//!
//! ```text
//!   deliberate(content, context)
//!            │
//!            ▼
//!   ┌─────────────────┐   Dispatching
//!   │   Dispatcher    │── parallel fan-out, failures become fallbacks
//!   └────────┬────────┘
//!            ▼
//!   ┌─────────────────┐   Examining
//!   │  CrossExaminer  │── agreement, conflict, confidence tiers
//!   └────────┬────────┘
//!            ▼
//!   ┌─────────────────┐   Synthesizing
//!   │   Synthesizer   │── weighted vote, calibration, downgrade
//!   └────────┬────────┘
//!            ▼
//!   history + sinks (best effort)  ──►  final Verdict
//! ```
//!
//! `deliberate` never fails. Audit and metrics sinks run in background tasks
//! and their errors are only logged.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::analyzer::{Analyzer, AnalyzerInfo};
use crate::consensus::{ConsensusSynthesizer, SynthesisConfig};
use crate::context::{ModerationContext, ModerationRequest};
use crate::cross_exam::CrossExaminer;
use crate::dispatcher::{Dispatcher, DEFAULT_ANALYZER_TIMEOUT};
use crate::error::CouncilError;
use crate::record::DeliberationRecord;
use crate::sink::{AuditSink, MetricsSink, EVENT_ANALYZER_FAILED, EVENT_DELIBERATION_COMPLETED};
use crate::verdict::Verdict;
use crate::Result;

/// Pipeline stage of an in-flight deliberation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliberationStage {
    /// Not running.
    Idle,
    /// Waiting on analyzers.
    Dispatching,
    /// Cross-examining verdicts.
    Examining,
    /// Synthesizing the final verdict.
    Synthesizing,
}

impl fmt::Display for DeliberationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeliberationStage::Idle => "idle",
            DeliberationStage::Dispatching => "dispatching",
            DeliberationStage::Examining => "examining",
            DeliberationStage::Synthesizing => "synthesizing",
        };
        f.write_str(label)
    }
}

/// Builder for [`Commander`].
///
/// # Example
///
/// ```rust,ignore
/// let commander = Commander::builder()
///     .analyzer(MyAnalyzer::new())
///     .timeout(Duration::from_secs(2))
///     .build()?;
/// ```
pub struct CommanderBuilder {
    analyzers: Vec<Arc<dyn Analyzer>>,
    timeout: Duration,
    synthesis: SynthesisConfig,
    audit_sinks: Vec<Arc<dyn AuditSink>>,
    metrics_sinks: Vec<Arc<dyn MetricsSink>>,
}

impl Default for CommanderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommanderBuilder {
    /// Creates an empty builder with default timeout and calibration.
    pub fn new() -> Self {
        Self {
            analyzers: Vec::new(),
            timeout: DEFAULT_ANALYZER_TIMEOUT,
            synthesis: SynthesisConfig::default(),
            audit_sinks: Vec::new(),
            metrics_sinks: Vec::new(),
        }
    }

    /// Registers an analyzer.
    pub fn analyzer(mut self, analyzer: impl Analyzer + 'static) -> Self {
        self.analyzers.push(Arc::new(analyzer));
        self
    }

    /// Registers an already shared analyzer.
    pub fn shared_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzers.push(analyzer);
        self
    }

    /// Registers several shared analyzers.
    pub fn analyzers<I>(mut self, analyzers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Analyzer>>,
    {
        self.analyzers.extend(analyzers);
        self
    }

    /// Sets the per-analyzer timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the synthesizer calibration.
    pub fn synthesis_config(mut self, config: SynthesisConfig) -> Self {
        self.synthesis = config;
        self
    }

    /// Adds an audit sink.
    pub fn audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sinks.push(sink);
        self
    }

    /// Adds a metrics sink.
    pub fn metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics_sinks.push(sink);
        self
    }

    /// Builds the commander.
    ///
    /// # Errors
    ///
    /// - [`CouncilError::DuplicateAnalyzer`] if two analyzers share a name.
    /// - [`CouncilError::InvalidConfig`] for a zero timeout or an invalid
    ///   synthesis configuration.
    pub fn build(self) -> Result<Commander> {
        let mut seen = HashSet::new();
        for analyzer in &self.analyzers {
            if !seen.insert(analyzer.name().to_string()) {
                return Err(CouncilError::DuplicateAnalyzer(analyzer.name().to_string()));
            }
        }

        if self.timeout.is_zero() {
            return Err(CouncilError::InvalidConfig(
                "analyzer timeout must be greater than zero".to_string(),
            ));
        }

        let synthesizer = ConsensusSynthesizer::with_config(self.synthesis)?;

        info!(
            "Commander ready with {} analyzers ({} ms timeout)",
            self.analyzers.len(),
            self.timeout.as_millis()
        );

        Ok(Commander {
            analyzers: self.analyzers,
            dispatcher: Dispatcher::with_timeout(self.timeout),
            examiner: CrossExaminer::new(),
            synthesizer,
            audit_sinks: self.audit_sinks,
            metrics_sinks: self.metrics_sinks,
            history: Mutex::new(Vec::new()),
            active: Mutex::new(BTreeMap::new()),
            notifications: Mutex::new(Vec::new()),
        })
    }
}

/// Orchestrates deliberations over a fixed analyzer registry.
///
/// The registry is read-only after construction. History, the active set,
/// and pending sink notifications sit behind short-lived locks so that
/// concurrent `deliberate` calls on a shared commander are independent.
pub struct Commander {
    analyzers: Vec<Arc<dyn Analyzer>>,
    dispatcher: Dispatcher,
    examiner: CrossExaminer,
    synthesizer: ConsensusSynthesizer,
    audit_sinks: Vec<Arc<dyn AuditSink>>,
    metrics_sinks: Vec<Arc<dyn MetricsSink>>,
    history: Mutex<Vec<Arc<DeliberationRecord>>>,
    active: Mutex<BTreeMap<Uuid, DeliberationStage>>,
    notifications: Mutex<Vec<JoinHandle<()>>>,
}

impl fmt::Debug for Commander {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commander")
            .field("analyzers", &self.analyzer_names())
            .field("timeout", &self.dispatcher.timeout())
            .field("history_len", &self.history_len())
            .finish()
    }
}

impl Commander {
    /// Starts building a commander.
    pub fn builder() -> CommanderBuilder {
        CommanderBuilder::new()
    }

    /// Deliberates on `content` and returns the final verdict.
    pub async fn deliberate(
        &self,
        content: impl Into<String>,
        context: ModerationContext,
    ) -> Verdict {
        let record = self
            .deliberate_request(ModerationRequest::new(content, context))
            .await;
        record.final_verdict.clone()
    }

    /// Deliberates on `request` and returns the full record.
    ///
    /// The record is appended to history before this returns.
    pub async fn deliberate_request(&self, request: ModerationRequest) -> Arc<DeliberationRecord> {
        let task_id = Uuid::new_v4();
        let span = info_span!("deliberation", task_id = %task_id);
        self.run(task_id, request).instrument(span).await
    }

    async fn run(&self, task_id: Uuid, request: ModerationRequest) -> Arc<DeliberationRecord> {
        let started = Instant::now();
        let created_at = Utc::now();
        let _active = ActiveGuard::enter(&self.active, task_id);

        self.set_stage(task_id, DeliberationStage::Dispatching);
        let outcome = self.dispatcher.dispatch(&self.analyzers, &request).await;

        self.set_stage(task_id, DeliberationStage::Examining);
        let examination = self.examiner.examine(&outcome.verdicts);
        debug!(
            "Agreement level {} across {} frameworks",
            examination.agreement_level,
            examination.framework_coverage.len()
        );

        self.set_stage(task_id, DeliberationStage::Synthesizing);
        let synthesis = self
            .synthesizer
            .synthesize(&outcome.verdicts, &examination, &outcome.failures);
        if synthesis.downgraded {
            debug!(
                "Downgraded {} to review at {} confidence",
                synthesis.candidate,
                synthesis.verdict.confidence()
            );
        }

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let record = Arc::new(DeliberationRecord {
            task_id,
            created_at,
            request: request.preview(),
            verdicts: outcome.verdicts,
            failures: outcome.failures,
            examination,
            scores: synthesis.scores,
            final_verdict: synthesis.verdict,
            duration_ms,
        });

        lock(&self.history).push(Arc::clone(&record));

        info!(
            "Deliberation complete: {} ({}) from {} analyzers, {} failed, {} ms",
            record.final_verdict.decision(),
            record.final_verdict.confidence(),
            record.analyzer_count(),
            record.failure_count(),
            record.duration_ms
        );

        self.notify(&record);
        record
    }

    fn set_stage(&self, task_id: Uuid, stage: DeliberationStage) {
        debug!("Stage -> {}", stage);
        lock(&self.active).insert(task_id, stage);
    }

    fn notify(&self, record: &Arc<DeliberationRecord>) {
        if self.audit_sinks.is_empty() && self.metrics_sinks.is_empty() {
            return;
        }

        let mut handles = Vec::new();

        for sink in &self.audit_sinks {
            let sink = Arc::clone(sink);
            let record = Arc::clone(record);
            let handle = tokio::spawn(
                async move {
                    if let Err(e) = sink.record(&record).await {
                        warn!("Audit sink '{}' failed: {}", sink.name(), e);
                    }
                }
                .instrument(Span::current()),
            );
            handles.push(handle);
        }

        if !self.metrics_sinks.is_empty() {
            let events = Arc::new(metrics_events(record));
            for sink in &self.metrics_sinks {
                let sink = Arc::clone(sink);
                let events = Arc::clone(&events);
                let handle = tokio::spawn(
                    async move {
                        for (event, payload) in events.iter() {
                            if let Err(e) = sink.emit(event, payload.clone()).await {
                                warn!("Metrics sink '{}' failed on {}: {}", sink.name(), event, e);
                            }
                        }
                    }
                    .instrument(Span::current()),
                );
                handles.push(handle);
            }
        }

        let mut pending = lock(&self.notifications);
        pending.retain(|h| !h.is_finished());
        pending.extend(handles);
    }

    /// Waits for every outstanding sink notification to finish.
    ///
    /// Deliberations never wait on sinks; call this before shutdown, or in
    /// tests, when delivery must be observed.
    pub async fn flush(&self) {
        let pending: Vec<JoinHandle<()>> = lock(&self.notifications).drain(..).collect();
        for handle in pending {
            if let Err(e) = handle.await {
                warn!("Sink notification task ended abnormally: {}", e);
            }
        }
    }

    /// Deliberations currently in flight and their stage.
    pub fn active_deliberations(&self) -> BTreeMap<Uuid, DeliberationStage> {
        lock(&self.active).clone()
    }

    /// Stage of `task_id`; `Idle` if it is not running.
    pub fn stage(&self, task_id: Uuid) -> DeliberationStage {
        lock(&self.active)
            .get(&task_id)
            .copied()
            .unwrap_or(DeliberationStage::Idle)
    }

    /// Snapshot of the deliberation history, oldest first.
    pub fn history(&self) -> Vec<Arc<DeliberationRecord>> {
        lock(&self.history).clone()
    }

    /// Number of records in history.
    pub fn history_len(&self) -> usize {
        lock(&self.history).len()
    }

    /// Looks up a record by task id.
    pub fn find(&self, task_id: Uuid) -> Option<Arc<DeliberationRecord>> {
        lock(&self.history)
            .iter()
            .find(|r| r.task_id == task_id)
            .cloned()
    }

    /// Drops all but the newest `keep_last` records. Returns how many were
    /// removed.
    pub fn prune_history(&self, keep_last: usize) -> usize {
        let mut history = lock(&self.history);
        let excess = history.len().saturating_sub(keep_last);
        history.drain(..excess);
        if excess > 0 {
            debug!("Pruned {} records from history", excess);
        }
        excess
    }

    /// Status of every registered analyzer, in registration order.
    pub fn analyzers(&self) -> Vec<AnalyzerInfo> {
        self.analyzers
            .iter()
            .map(|a| AnalyzerInfo::of(a.as_ref()))
            .collect()
    }

    /// Names of every registered analyzer.
    pub fn analyzer_names(&self) -> Vec<&str> {
        self.analyzers.iter().map(|a| a.name()).collect()
    }

    /// Number of registered analyzers.
    pub fn analyzer_count(&self) -> usize {
        self.analyzers.len()
    }

    /// Per-analyzer timeout.
    pub fn analyzer_timeout(&self) -> Duration {
        self.dispatcher.timeout()
    }

    /// The synthesizer calibration.
    pub fn synthesis_config(&self) -> &SynthesisConfig {
        self.synthesizer.config()
    }
}

fn metrics_events(record: &DeliberationRecord) -> Vec<(&'static str, Value)> {
    let task_id = record.task_id.to_string();
    let mut events = Vec::with_capacity(record.failures.len() + 1);

    for failure in &record.failures {
        events.push((
            EVENT_ANALYZER_FAILED,
            json!({
                "task_id": task_id,
                "analyzer": failure.analyzer,
                "kind": failure.kind,
                "detail": failure.detail,
            }),
        ));
    }

    events.push((
        EVENT_DELIBERATION_COMPLETED,
        json!({
            "task_id": task_id,
            "decision": record.final_verdict.decision(),
            "confidence": record.final_verdict.confidence().value(),
            "analyzer_count": record.analyzer_count(),
            "failure_count": record.failure_count(),
            "duration_ms": record.duration_ms,
        }),
    ));

    events
}

/// Recovers the data of a poisoned lock; every critical section here leaves
/// the guarded collection consistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes a task from the active set when its deliberation ends, including
/// when the deliberation future is dropped mid-flight.
struct ActiveGuard<'a> {
    active: &'a Mutex<BTreeMap<Uuid, DeliberationStage>>,
    task_id: Uuid,
}

impl<'a> ActiveGuard<'a> {
    fn enter(active: &'a Mutex<BTreeMap<Uuid, DeliberationStage>>, task_id: Uuid) -> Self {
        Self { active, task_id }
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        lock(self.active).remove(&self.task_id);
    }
}
