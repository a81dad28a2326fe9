//! Configuration types for Ethiq.
//!
//! Every section has defaults, so a configuration file only needs the keys
//! it overrides:
//!
//! ```toml
//! [council]
//! analyzer_timeout_ms = 2000
//! decision_threshold = 0.65
//!
//! [council.framework_weights]
//! "Free Speech Ethics" = 0.4
//!
//! [analyzers]
//! enabled = ["utilitarian", "free_speech"]
//!
//! [audit]
//! db_path = "./ethiq_audit.db"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ethiq_council::consensus::{DEFAULT_DECISION_THRESHOLD, DEFAULT_FRAMEWORK_WEIGHT};
use ethiq_council::{default_framework_weights, SynthesisConfig};

use crate::error::EthiqError;
use crate::Result;

/// Configuration for the Ethiq facade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EthiqConfig {
    /// Deliberation settings.
    pub council: CouncilConfig,

    /// Analyzer panel.
    pub analyzers: AnalyzersConfig,

    /// Audit trail and metrics.
    pub audit: AuditConfig,

    /// Log output.
    pub logging: LoggingConfig,
}

/// Deliberation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CouncilConfig {
    /// Per-analyzer time bound in milliseconds.
    pub analyzer_timeout_ms: u64,

    /// Minimum calibrated confidence for ALLOW or REMOVE.
    pub decision_threshold: f64,

    /// Weight for frameworks missing from `framework_weights`.
    pub default_weight: f64,

    /// Weight per framework label.
    pub framework_weights: BTreeMap<String, f64>,
}

impl Default for CouncilConfig {
    fn default() -> Self {
        Self {
            analyzer_timeout_ms: 5_000,
            decision_threshold: DEFAULT_DECISION_THRESHOLD,
            default_weight: DEFAULT_FRAMEWORK_WEIGHT,
            framework_weights: default_framework_weights(),
        }
    }
}

impl CouncilConfig {
    /// Per-analyzer timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.analyzer_timeout_ms)
    }

    /// Synthesizer calibration derived from these settings.
    pub fn synthesis(&self) -> SynthesisConfig {
        SynthesisConfig {
            framework_weights: self.framework_weights.clone(),
            default_weight: self.default_weight,
            decision_threshold: self.decision_threshold,
            ..SynthesisConfig::default()
        }
    }
}

/// Analyzer panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzersConfig {
    /// Built-in analyzers to register, in order.
    pub enabled: Vec<String>,
}

impl Default for AnalyzersConfig {
    fn default() -> Self {
        Self {
            enabled: ethiq_agents::PANEL.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Audit trail and metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Keep an in-memory audit log.
    pub enabled: bool,

    /// Persistent audit store location; `None` keeps no store.
    pub db_path: Option<PathBuf>,

    /// Number of recent metrics events kept in memory.
    pub metrics_buffer: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            db_path: None,
            metrics_buffer: ethiq_audit::DEFAULT_METRICS_BUFFER,
        }
    }
}

/// Log output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl EthiqConfig {
    /// Loads and validates a configuration file.
    ///
    /// Files ending in `.json` are parsed as JSON; anything else as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// result does not validate.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| EthiqError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
        let config: Self = if is_json {
            serde_json::from_str(&contents)?
        } else {
            toml::from_str(&contents)?
        };

        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every setting.
    ///
    /// An empty analyzer list is valid; every deliberation then returns the
    /// inconclusive verdict.
    ///
    /// # Errors
    ///
    /// Returns [`EthiqError::Config`] for a zero timeout, an unknown or
    /// repeated analyzer name, or invalid calibration.
    pub fn validate(&self) -> Result<()> {
        if self.council.analyzer_timeout_ms == 0 {
            return Err(EthiqError::Config(
                "council.analyzer_timeout_ms must be greater than zero".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        for name in &self.analyzers.enabled {
            if !ethiq_agents::is_known(name) {
                return Err(EthiqError::Config(format!(
                    "unknown analyzer '{}' (expected one of: {})",
                    name,
                    ethiq_agents::PANEL.join(", ")
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(EthiqError::Config(format!(
                    "analyzer '{}' is enabled twice",
                    name
                )));
            }
        }

        self.council
            .synthesis()
            .validate()
            .map_err(|e| EthiqError::Config(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EthiqConfig::default();
        assert_eq!(config.council.analyzer_timeout_ms, 5_000);
        assert_eq!(config.council.decision_threshold, 0.6);
        assert_eq!(config.council.framework_weights["Free Speech Ethics"], 0.30);
        assert_eq!(config.analyzers.enabled.len(), 4);
        assert!(config.audit.enabled);
        assert!(config.audit.db_path.is_none());
        assert_eq!(config.logging.filter, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = EthiqConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EthiqConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.analyzers, config.analyzers);
        assert_eq!(parsed.council.analyzer_timeout_ms, config.council.analyzer_timeout_ms);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EthiqConfig::from_toml_str(
            r#"
            [council]
            decision_threshold = 0.7

            [analyzers]
            enabled = ["utilitarian"]
            "#,
        )
        .unwrap();

        assert_eq!(config.council.decision_threshold, 0.7);
        assert_eq!(config.council.analyzer_timeout_ms, 5_000);
        assert_eq!(config.analyzers.enabled, vec!["utilitarian"]);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_empty_panel_is_valid() {
        let config = EthiqConfig::from_toml_str("[analyzers]\nenabled = []\n").unwrap();
        assert!(config.analyzers.enabled.is_empty());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = EthiqConfig::default();
        config.council.analyzer_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = EthiqConfig::default();
        config.council.decision_threshold = 1.2;
        assert!(config.validate().is_err());

        let mut config = EthiqConfig::default();
        config
            .council
            .framework_weights
            .insert("Utilitarianism".to_string(), f64::NAN);
        assert!(config.validate().is_err());

        let mut config = EthiqConfig::default();
        config.analyzers.enabled.push("virtue".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("virtue"));

        let mut config = EthiqConfig::default();
        config.analyzers.enabled.push("cultural".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_synthesis_carries_overrides() {
        let mut config = EthiqConfig::default();
        config.council.decision_threshold = 0.5;
        config.council.default_weight = 0.1;
        let synthesis = config.council.synthesis();
        assert_eq!(synthesis.decision_threshold, 0.5);
        assert_eq!(synthesis.weight("Unknown"), 0.1);
        assert_eq!(synthesis.unanimity_boost, 1.2);
    }

    #[test]
    fn test_from_file_toml_and_json() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("ethiq.toml");
        fs::write(&toml_path, "[audit]\nmetrics_buffer = 10\n").unwrap();
        let config = EthiqConfig::from_file(&toml_path).unwrap();
        assert_eq!(config.audit.metrics_buffer, 10);

        let json_path = dir.path().join("ethiq.json");
        fs::write(&json_path, r#"{"logging": {"filter": "debug"}}"#).unwrap();
        let config = EthiqConfig::from_file(&json_path).unwrap();
        assert_eq!(config.logging.filter, "debug");

        let missing = EthiqConfig::from_file(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(EthiqError::Io { .. })));
    }
}
