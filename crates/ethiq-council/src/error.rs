//! Error types for the deliberation council.
//!
//! Analyzer failures during a deliberation are recovered locally and never
//! surface through these errors; they only describe construction problems,
//! analyzer-reported failures, and sink failures.

use thiserror::Error;

/// Errors that can occur during council operations.
#[derive(Debug, Error)]
pub enum CouncilError {
    /// An analyzer could not complete its analysis.
    #[error("Analysis failed: {0}")]
    Analysis(String),

    /// A verdict violates the structural invariants of [`crate::Verdict`].
    #[error("Malformed verdict: {0}")]
    MalformedVerdict(String),

    /// Two analyzers were registered under the same name.
    #[error("Duplicate analyzer '{0}'")]
    DuplicateAnalyzer(String),

    /// Council configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An audit or metrics sink failed.
    #[error("Sink '{0}' failed: {1}")]
    Sink(String, String),

    /// Internal council error.
    #[error("Internal council error: {0}")]
    Internal(String),
}
