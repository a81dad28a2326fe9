//! # Ethiq Council
//!
//! Multi-perspective deliberation engine for content moderation.
//!
//! ## Overview
//!
//! A piece of content is judged by several independent analyzers, each one
//! embodying a distinct ethical framework. Their verdicts are compared, and
//! a weighted, calibrated consensus becomes the final decision: `ALLOW`,
//! `FLAG_FOR_REVIEW` or `REMOVE`.
//!
//! ## Failure Model
//!
//! ### Analyzer Failure
//! An analyzer that errors, panics, times out or returns a malformed verdict
//! is replaced by a fallback verdict (`FLAG_FOR_REVIEW`, confidence 0.3).
//! The remaining analyzers are unaffected and a deliberation always
//! produces a verdict.
//!
//! ### Low Confidence
//! When the weighted vote favors a decisive outcome but calibrated
//! confidence stays below the decision threshold, the outcome is routed to
//! human review instead.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌───────────┐
//! │Utilitarian│ │Deontologic│ │ Cultural  │ │Free Speech│
//! └─────┬─────┘ └─────┬─────┘ └─────┬─────┘ └─────┬─────┘
//!       └─────────────┴──────┬──────┴─────────────┘
//!                            ▼
//!                     ┌─────────────┐
//!                     │ DISPATCHER  │  parallel, time-bounded
//!                     └──────┬──────┘
//!                            ▼
//!                     ┌─────────────┐
//!                     │CROSS-EXAMINE│  agreement / conflict
//!                     └──────┬──────┘
//!                            ▼
//!                     ┌─────────────┐
//!                     │ SYNTHESIZE  │  weighted consensus
//!                     └─────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ethiq_council::{Commander, ModerationContext};
//!
//! let commander = Commander::builder()
//!     .analyzer(MyAnalyzer::new())
//!     .build()?;
//!
//! let verdict = commander
//!     .deliberate("some post", ModerationContext::new().with_audience_size(5_000))
//!     .await;
//! println!("{}", verdict);
//! ```

pub mod analyzer;
pub mod commander;
pub mod consensus;
pub mod context;
pub mod cross_exam;
pub mod dispatcher;
pub mod error;
pub mod explain;
pub mod record;
pub mod sink;
pub mod verdict;

pub use analyzer::{Analyzer, AnalyzerInfo};
pub use commander::{Commander, CommanderBuilder, DeliberationStage};
pub use consensus::{
    default_framework_weights, ConsensusSynthesizer, DecisionScores, Synthesis, SynthesisConfig,
    CONSENSUS_FRAMEWORK, CONSENSUS_SOURCE,
};
pub use context::{ModerationContext, ModerationRequest, RequestPreview};
pub use cross_exam::{
    Agreement, AgreementLevel, ClarificationRequest, ConfidenceDistribution, Conflict,
    CrossExamination, CrossExaminer,
};
pub use dispatcher::{AnalyzerFailure, DispatchOutcome, Dispatcher, FailureKind, VerdictMap};
pub use error::CouncilError;
pub use explain::{
    AgentInsights, AnalyzerInsight, ConsensusStrength, ContextualFactors, Explanation,
    ExplanationText,
};
pub use record::DeliberationRecord;
pub use sink::{AuditSink, MetricsSink, EVENT_ANALYZER_FAILED, EVENT_DELIBERATION_COMPLETED};
pub use verdict::{Confidence, ConfidenceTier, Decision, Verdict, FALLBACK_CONFIDENCE};

/// Result type for council operations.
pub type Result<T> = std::result::Result<T, CouncilError>;
