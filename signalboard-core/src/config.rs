//! Detector thresholds and dashboard settings, loadable from TOML.
//!
//! ```toml
//! period = "3m"
//!
//! [visible]
//! ma200 = false
//!
//! [detectors.volume]
//! multiplier = 2.5
//! ```
//!
//! Every section is optional; omitted keys take the built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::assemble::IndicatorSet;
use crate::detect::{PatternConfig, SentimentConfig, VolumeConfig};
use crate::series::Period;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Thresholds of the three detectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub pattern: PatternConfig,
    pub volume: VolumeConfig,
    pub sentiment: SentimentConfig,
}

impl DetectorConfig {
    /// Reject thresholds under which a detector could never fire or would
    /// fire on everything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pattern;
        if p.min_points == 0 {
            return Err(invalid("pattern.min_points must be at least 1"));
        }
        if p.min_points > p.lookback {
            return Err(invalid(format!(
                "pattern.min_points ({}) exceeds pattern.lookback ({})",
                p.min_points, p.lookback
            )));
        }
        if p.wedge_window < 4 {
            return Err(invalid("pattern.wedge_window must be at least 4"));
        }
        if p.box_min_points > p.lookback {
            return Err(invalid(format!(
                "pattern.box_min_points ({}) exceeds pattern.lookback ({})",
                p.box_min_points, p.lookback
            )));
        }
        if !(p.wedge_ratio.is_finite() && p.wedge_ratio > 0.0) {
            return Err(invalid("pattern.wedge_ratio must be positive"));
        }
        if !(p.box_max_range_ratio.is_finite() && p.box_max_range_ratio > 0.0) {
            return Err(invalid("pattern.box_max_range_ratio must be positive"));
        }

        let v = &self.volume;
        if v.window == 0 {
            return Err(invalid("volume.window must be at least 1"));
        }
        if !(v.multiplier.is_finite() && v.multiplier > 0.0) {
            return Err(invalid("volume.multiplier must be positive"));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

/// Dashboard settings: selected period, visible series, detector thresholds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub period: Period,
    pub visible: IndicatorSet,
    pub detectors: DetectorConfig,
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.detectors.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
