//! # Ethiq Agents
//!
//! The default analyzer panel for the Ethiq council. Each analyzer embodies
//! one ethical framework and scores content with keyword heuristics:
//!
//! | Name            | Framework              | Focus                        |
//! |-----------------|------------------------|------------------------------|
//! | `utilitarian`   | Utilitarianism         | harm versus benefit          |
//! | `deontological` | Deontological Ethics   | duties and rights            |
//! | `cultural`      | Cultural Ethics        | cross-cultural sensitivity   |
//! | `free_speech`   | Free Speech Ethics     | value to open discourse      |
//!
//! Analyzers are stateless after construction and safe to share across
//! concurrent deliberations.

pub mod cultural;
pub mod deontological;
pub mod free_speech;
pub mod keywords;
pub mod utilitarian;

use std::sync::Arc;

use ethiq_council::{Analyzer, CouncilError, Result};

pub use cultural::CulturalAnalyzer;
pub use deontological::DeontologicalAnalyzer;
pub use free_speech::FreeSpeechAnalyzer;
pub use keywords::{KeywordCategories, KeywordSet};
pub use utilitarian::UtilitarianAnalyzer;

/// Names of every built-in analyzer, in panel order.
pub const PANEL: [&str; 4] = [
    utilitarian::NAME,
    deontological::NAME,
    cultural::NAME,
    free_speech::NAME,
];

/// Returns true if `name` is a built-in analyzer.
pub fn is_known(name: &str) -> bool {
    PANEL.contains(&name)
}

/// Builds the built-in analyzer called `name`.
///
/// # Errors
///
/// Returns [`CouncilError::InvalidConfig`] for an unknown name.
pub fn build_analyzer(name: &str) -> Result<Arc<dyn Analyzer>> {
    let analyzer: Arc<dyn Analyzer> = match name {
        utilitarian::NAME => Arc::new(UtilitarianAnalyzer::new()?),
        deontological::NAME => Arc::new(DeontologicalAnalyzer::new()?),
        cultural::NAME => Arc::new(CulturalAnalyzer::new()?),
        free_speech::NAME => Arc::new(FreeSpeechAnalyzer::new()?),
        other => {
            return Err(CouncilError::InvalidConfig(format!(
                "unknown analyzer '{}' (expected one of: {})",
                other,
                PANEL.join(", ")
            )))
        }
    };
    Ok(analyzer)
}

/// Builds the named analyzers, in the given order.
pub fn build_panel<I, S>(names: I) -> Result<Vec<Arc<dyn Analyzer>>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| build_analyzer(name.as_ref()))
        .collect()
}

/// Builds all four built-in analyzers.
pub fn default_panel() -> Result<Vec<Arc<dyn Analyzer>>> {
    build_panel(PANEL)
}
