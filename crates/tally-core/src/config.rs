//! Engine configuration
//!
//! Config is loaded with a layered resolution:
//! 1. An explicit path passed by the caller (e.g. `--config`)
//! 2. The override in the data dir (~/.local/share/tally/config/engine.toml)
//! 3. Embedded defaults (compiled into the binary)
//!
//! Keys missing from an override keep their default value.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/engine.toml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorizationConfig {
    /// Rule matches at or below this confidence fall through to the heuristic
    pub rule_confidence_threshold: f64,
    pub similar_transaction_limit: usize,
}

impl Default for CategorizationConfig {
    fn default() -> Self {
        Self {
            rule_confidence_threshold: 0.8,
            similar_transaction_limit: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub top_category_limit: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_category_limit: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    pub high_category_share_percent: f64,
    pub high_spending_ratio: f64,
    pub high_frequency_count: usize,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            high_category_share_percent: 30.0,
            high_spending_ratio: 0.9,
            high_frequency_count: 50,
        }
    }
}

/// Full engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub categorization: CategorizationConfig,
    pub analysis: AnalysisConfig,
    pub insights: InsightConfig,
}

impl EngineConfig {
    /// Load configuration, preferring `override_path`, then the data-dir override
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = override_path {
            // Explicit path must exist
            return Self::from_file(path);
        }

        if let Some(default_path) = default_config_path() {
            if default_path.exists() {
                return Self::from_file(&default_path);
            }
        }

        Self::parse(DEFAULT_CONFIG)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading engine config from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let threshold = self.categorization.rule_confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::Config(format!(
                "rule_confidence_threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        if self.categorization.similar_transaction_limit == 0 {
            return Err(Error::Config(
                "similar_transaction_limit must be at least 1".into(),
            ));
        }
        if self.insights.high_spending_ratio < 0.0 {
            return Err(Error::Config("high_spending_ratio must not be negative".into()));
        }
        Ok(())
    }
}

/// Location of the user override file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("tally").join("config").join("engine.toml"))
}
