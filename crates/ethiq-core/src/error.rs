//! Error types for Ethiq Core.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for facade operations.
#[derive(Debug, Error)]
pub enum EthiqError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A configuration file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A TOML configuration file could not be parsed.
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// A JSON configuration file could not be parsed.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Council error passthrough.
    #[error("Council error: {0}")]
    Council(#[from] ethiq_council::CouncilError),

    /// Audit error passthrough.
    #[error("Audit error: {0}")]
    Audit(#[from] ethiq_audit::AuditError),
}
