//! Service configuration
//!
//! Every field has a default, so an empty (or absent) TOML file is a
//! valid configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use radar_core::{RecurrenceModel, DEFAULT_SCALE_FACTOR};
use radar_feeds::FeedsConfig;

use crate::SchedulerConfig;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Top-level service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    /// Seconds between cycles
    pub refresh_interval_secs: u64,
    /// Per-feed time limit in seconds
    pub feed_timeout_secs: u64,
    /// Delay before the first cycle, in seconds
    pub startup_delay_secs: u64,
    pub bind_addr: String,
    /// Optional ETAS calibration JSON
    pub calibration_path: Option<PathBuf>,
    pub etas_scale_factor: f64,
    pub recurrence: RecurrenceModel,
    pub feeds: FeedsConfig,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 120,
            feed_timeout_secs: 5,
            startup_delay_secs: 2,
            bind_addr: "0.0.0.0:3000".to_string(),
            calibration_path: None,
            etas_scale_factor: DEFAULT_SCALE_FACTOR,
            recurrence: RecurrenceModel::default(),
            feeds: FeedsConfig::default(),
        }
    }
}

impl RadarConfig {
    /// Parse and validate a TOML document
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "refresh_interval_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.feed_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "feed_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if !(self.etas_scale_factor.is_finite() && self.etas_scale_factor > 0.0) {
            return Err(ConfigError::Invalid {
                field: "etas_scale_factor",
                reason: format!("{} is not a positive number", self.etas_scale_factor),
            });
        }
        let years = self.recurrence.mean_recurrence_years;
        if years.is_nan() || years <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "recurrence.mean_recurrence_years",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_timeout_secs)
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: Duration::from_secs(self.refresh_interval_secs),
            startup_delay: Duration::from_secs(self.startup_delay_secs),
        }
    }
}
