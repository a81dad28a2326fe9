//! Concurrent fan-out of one request to every registered analyzer.
//!
//! All analyzers launch together and the dispatcher waits for every one of
//! them to settle. A failing analyzer never aborts its siblings: errors,
//! timeouts, panics and malformed verdicts are each converted into a
//! fallback verdict (`FLAG_FOR_REVIEW`, confidence 0.3) plus an
//! [`AnalyzerFailure`] record.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tracing::{debug, warn};

use crate::analyzer::Analyzer;
use crate::context::{ModerationContext, ModerationRequest};
use crate::verdict::Verdict;

/// Default per-analyzer time bound.
pub const DEFAULT_ANALYZER_TIMEOUT: Duration = Duration::from_secs(5);

/// Verdicts keyed by analyzer name.
pub type VerdictMap = BTreeMap<String, Verdict>;

/// Why an analyzer did not produce a usable verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The analyzer returned an error.
    Error,
    /// The analyzer exceeded its time bound.
    Timeout,
    /// The analyzer panicked.
    Panic,
    /// The analyzer returned a structurally invalid verdict.
    Malformed,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Error => "error",
            FailureKind::Timeout => "timeout",
            FailureKind::Panic => "panic",
            FailureKind::Malformed => "malformed verdict",
        };
        f.write_str(label)
    }
}

/// Record of one analyzer failure within a deliberation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerFailure {
    /// Registry name of the analyzer.
    pub analyzer: String,
    /// Failure class.
    pub kind: FailureKind,
    /// Human-readable detail.
    pub detail: String,
}

/// Result of fanning one request out to the analyzer set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    /// One verdict per analyzer, fallbacks included.
    pub verdicts: VerdictMap,
    /// Failures, one per fallback verdict.
    pub failures: Vec<AnalyzerFailure>,
}

impl DispatchOutcome {
    /// Number of analyzers that produced their own verdict.
    pub fn healthy_count(&self) -> usize {
        self.verdicts.len() - self.failures.len()
    }

    /// True when analyzers ran but none of them produced a real verdict.
    pub fn all_failed(&self) -> bool {
        !self.verdicts.is_empty() && self.healthy_count() == 0
    }

    /// Returns true if `analyzer` failed.
    pub fn is_failed(&self, analyzer: &str) -> bool {
        self.failures.iter().any(|f| f.analyzer == analyzer)
    }
}

/// Runs analyzers concurrently with per-analyzer failure isolation.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    timeout: Duration,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Creates a dispatcher with [`DEFAULT_ANALYZER_TIMEOUT`].
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_ANALYZER_TIMEOUT)
    }

    /// Creates a dispatcher with a custom per-analyzer timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Returns the per-analyzer timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs every analyzer against `request` and waits for all of them.
    ///
    /// Each analyzer runs in its own task, so a panic is contained to that
    /// task. Analyzer names are expected to be unique; the registry built by
    /// [`crate::CommanderBuilder`] guarantees it.
    pub async fn dispatch(
        &self,
        analyzers: &[Arc<dyn Analyzer>],
        request: &ModerationRequest,
    ) -> DispatchOutcome {
        let content: Arc<str> = Arc::from(request.content.as_str());
        let context: Arc<ModerationContext> = Arc::new(request.context.clone());

        debug!("Dispatching to {} analyzers", analyzers.len());

        let handles: Vec<_> = analyzers
            .iter()
            .map(|analyzer| {
                let analyzer = Arc::clone(analyzer);
                let content = Arc::clone(&content);
                let context = Arc::clone(&context);
                let limit = self.timeout;
                tokio::spawn(async move {
                    tokio::time::timeout(limit, analyzer.analyze(&content, &context)).await
                })
            })
            .collect();

        let settled = join_all(handles).await;

        let mut outcome = DispatchOutcome::default();
        for (analyzer, joined) in analyzers.iter().zip(settled) {
            let name = analyzer.name().to_string();

            let failure = match joined {
                Ok(Ok(Ok(verdict))) => match verdict.validate() {
                    Ok(()) => {
                        debug!("Analyzer '{}' returned {}", name, verdict);
                        outcome.verdicts.insert(name, verdict);
                        continue;
                    }
                    Err(e) => (FailureKind::Malformed, e.to_string()),
                },
                Ok(Ok(Err(e))) => (FailureKind::Error, e.to_string()),
                Ok(Err(_elapsed)) => (
                    FailureKind::Timeout,
                    format!("no verdict within {} ms", self.timeout.as_millis()),
                ),
                Err(join_error) => describe_join_error(join_error),
            };

            let (kind, detail) = failure;
            warn!("Analyzer '{}' failed ({}): {}", name, kind, detail);

            let fallback = Verdict::fallback(
                name.clone(),
                analyzer.framework(),
                format!("Analysis failed ({}): {}", kind, detail),
            );
            outcome.verdicts.insert(name.clone(), fallback);
            outcome.failures.push(AnalyzerFailure {
                analyzer: name,
                kind,
                detail,
            });
        }

        outcome
    }
}

fn describe_join_error(error: JoinError) -> (FailureKind, String) {
    if error.is_panic() {
        let message = panic_message(error.into_panic());
        (FailureKind::Panic, format!("analyzer panicked: {}", message))
    } else {
        (FailureKind::Error, "analyzer task was cancelled".to_string())
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
