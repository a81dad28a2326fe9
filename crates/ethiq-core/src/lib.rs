//! # Ethiq Core
//!
//! Unified content moderation facade. Runs a panel of ethical analyzers
//! over a piece of content, cross-examines their verdicts, and synthesizes
//! one weighted decision with a full audit trail.
//!
//! ## Components
//!
//! | Crate           | Role                                              |
//! |-----------------|---------------------------------------------------|
//! | `ethiq-council` | Dispatcher, Cross-Examiner, Consensus, Commander  |
//! | `ethiq-agents`  | Utilitarian, Deontological, Cultural, Free Speech |
//! | `ethiq-audit`   | Audit log, persistent store, metrics              |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          ETHIQ CORE                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │                    ┌─────────────────┐                          │
//! │                    │      Ethiq      │  ← Unified Facade        │
//! │                    └────────┬────────┘                          │
//! │                             │                                   │
//! │         ┌───────────────────┼───────────────────┐               │
//! │         ▼                   ▼                   ▼               │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐          │
//! │  │  Analyzer   │    │  Commander  │    │    Audit    │          │
//! │  │   Panel     │───►│  (council)  │───►│    Sinks    │          │
//! │  └─────────────┘    └─────────────┘    └─────────────┘          │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ethiq_core::{Ethiq, EthiqConfig, ModerationContext};
//!
//! let ethiq = Ethiq::new(EthiqConfig::from_file("ethiq.toml")?)?;
//!
//! let context = ModerationContext::new().with_audience_size(50_000);
//! let outcome = ethiq.moderate(post_body, context).await;
//! println!("{}", serde_json::to_string_pretty(&outcome)?);
//! ```
//!
//! ## Notes
//!
//! - Moderation itself never fails; only construction does
//! - A failed analyzer contributes a low-confidence review verdict
//! - Low-confidence ALLOW or REMOVE decisions are downgraded to review

mod config;
mod error;
mod ethiq;
mod outcome;

pub use config::{AnalyzersConfig, AuditConfig, CouncilConfig, EthiqConfig, LoggingConfig};
pub use error::EthiqError;
pub use ethiq::Ethiq;
pub use outcome::{AnalyzerOutcome, ModerationOutcome};

// Re-export component types for convenience
pub use ethiq_audit::{AuditReport, ReportPeriod};
pub use ethiq_council::{
    AnalyzerInfo, Decision, DeliberationRecord, Explanation, ModerationContext, Verdict,
};

/// Result type for Ethiq operations.
pub type Result<T> = std::result::Result<T, EthiqError>;
