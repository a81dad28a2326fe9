//! The analyzer capability.
//!
//! An analyzer embodies one ethical framework and turns a piece of content
//! plus its context into a [`Verdict`]. The council treats every analyzer
//! uniformly; concrete implementations differ only in their framework label
//! and scoring heuristic.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::ModerationContext;
use crate::verdict::Verdict;
use crate::Result;

/// Trait for ethical analyzers.
///
/// Implementations must be free of shared mutable state: the dispatcher runs
/// every registered analyzer concurrently, and concurrent deliberations share
/// the same instances. Anything an analyzer needs at runtime (an LM client,
/// a connection pool) must itself be safe for concurrent use.
///
/// # Failure contract
///
/// Return `Err` for internal failures rather than panicking. The dispatcher
/// still isolates panics and timeouts, but an error carries a better
/// explanation into the fallback verdict.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Unique name of this analyzer within a registry.
    fn name(&self) -> &str;

    /// The ethical framework label, used as the weighting key.
    fn framework(&self) -> &str;

    /// Short human-readable description.
    fn description(&self) -> &str {
        self.framework()
    }

    /// Analyzes `content` in `context` and returns a verdict.
    async fn analyze(&self, content: &str, context: &ModerationContext) -> Result<Verdict>;
}

/// Status entry for a registered analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerInfo {
    /// Registry name.
    pub name: String,
    /// Framework label.
    pub framework: String,
    /// Description.
    pub description: String,
}

impl AnalyzerInfo {
    /// Captures the status of `analyzer`.
    pub fn of(analyzer: &dyn Analyzer) -> Self {
        Self {
            name: analyzer.name().to_string(),
            framework: analyzer.framework().to_string(),
            description: analyzer.description().to_string(),
        }
    }
}
