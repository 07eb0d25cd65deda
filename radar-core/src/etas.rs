//! ETAS (Epidemic-Type Aftershock Sequence) intensity model
//!
//! Each event at or above the cutoff magnitude adds an Omori-law decaying
//! contribution:
//!
//! ```text
//! λ(t) = Σ K · e^(α(Mᵢ − M₀)) / (t − tᵢ + c)^p      (t in days)
//! ```
//!
//! The unbounded rate is mapped onto 0–100 with a saturating transform.
//! Parameters come from an optional calibration file and are immutable
//! once loaded.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::{Event, MS_PER_DAY};

/// Default scale applied to the rate before saturation
pub const DEFAULT_SCALE_FACTOR: f64 = 5.0;

/// Errors loading ETAS calibration
#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("Failed to read calibration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed calibration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

/// ETAS parameter record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtasParams {
    /// Omori decay exponent
    pub p: f64,
    /// Time offset in days, must be > 0
    pub c: f64,
    /// Productivity constant
    #[serde(alias = "K")]
    pub k: f64,
    /// Magnitude scaling exponent
    pub alpha: f64,
    /// Cutoff magnitude
    pub m0: f64,
    /// Region the record was fitted for
    #[serde(default, alias = "region", skip_serializing_if = "Option::is_none")]
    pub region_label: Option<String>,
}

impl Default for EtasParams {
    fn default() -> Self {
        Self {
            p: 1.1,
            c: 0.01,
            k: 0.02,
            alpha: 0.9,
            m0: 2.0,
            region_label: None,
        }
    }
}

impl EtasParams {
    /// Check every parameter is usable; `c` and `p` must be positive
    pub fn validate(&self) -> Result<(), CalibrationError> {
        let checks: [(&'static str, f64, bool); 5] = [
            ("p", self.p, self.p > 0.0),
            ("c", self.c, self.c > 0.0),
            ("k", self.k, self.k >= 0.0),
            ("alpha", self.alpha, true),
            ("m0", self.m0, true),
        ];

        for (name, value, ok) in checks {
            if !value.is_finite() || !ok {
                return Err(CalibrationError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }

    /// Parse and validate a calibration record
    pub fn from_json(raw: &str) -> Result<Self, CalibrationError> {
        let params: EtasParams = serde_json::from_str(raw)?;
        params.validate()?;
        Ok(params)
    }

    /// Load a calibration file
    pub fn load(path: &Path) -> Result<Self, CalibrationError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Load calibration when a path is given, falling back to defaults on
    /// any error
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match Self::load(path) {
            Ok(params) => {
                info!(
                    "Loaded ETAS calibration from {} (region: {})",
                    path.display(),
                    params.region_label.as_deref().unwrap_or("unlabelled")
                );
                params
            }
            Err(e) => {
                warn!(
                    "ETAS calibration {} unusable, using defaults: {}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }
}

/// ETAS intensity model
#[derive(Debug, Clone)]
pub struct EtasModel {
    params: EtasParams,
    scale_factor: f64,
}

impl Default for EtasModel {
    fn default() -> Self {
        Self::new(EtasParams::default())
    }
}

impl EtasModel {
    pub fn new(params: EtasParams) -> Self {
        Self {
            params,
            scale_factor: DEFAULT_SCALE_FACTOR,
        }
    }

    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        if scale_factor.is_finite() && scale_factor > 0.0 {
            self.scale_factor = scale_factor;
        }
        self
    }

    pub fn params(&self) -> &EtasParams {
        &self.params
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Aftershock-cluster rate at `target_ms` (epoch ms)
    pub fn intensity(&self, events: &[Event], target_ms: i64) -> f64 {
        let EtasParams { p, c, k, alpha, m0, .. } = self.params;

        events
            .iter()
            .filter(|e| e.magnitude_or_zero() >= m0)
            .filter_map(|e| {
                let delta_days = (target_ms - e.time) as f64 / MS_PER_DAY;
                // Causality: simultaneous or future events contribute nothing
                if delta_days <= 0.0 {
                    return None;
                }
                let productivity = k * (alpha * (e.magnitude_or_zero() - m0)).exp();
                let temporal_decay = (delta_days + c).powf(p);
                Some(productivity / temporal_decay)
            })
            .sum()
    }

    /// Map a rate onto [0, 100]
    pub fn probability(&self, rate: f64) -> f64 {
        if rate.is_nan() || rate <= 0.0 {
            return 0.0;
        }
        let prob = (1.0 - (-rate * self.scale_factor).exp()) * 100.0;
        prob.clamp(0.0, 100.0)
    }
}
