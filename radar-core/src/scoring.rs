//! Weighted composite scoring
//!
//! Four component indicators, each normalized to 0–100, are scaled onto
//! fixed weight ceilings and summed into a 0–100 total:
//!
//! | Component   | Ceiling |
//! |-------------|---------|
//! | seismic     | 40      |
//! | ionosphere  | 30      |
//! | time        | 20      |
//! | crowd       | 10      |
//!
//! Each component is rounded before summing so the displayed parts always
//! add up to the displayed total.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CROWD_CEILING, IONOSPHERE_CEILING, SEISMIC_CEILING, TIME_CEILING};

/// Errors from scoring
#[derive(Debug, Error, PartialEq)]
pub enum ScoreError {
    #[error("Component {component} has non-finite normalized value {value}")]
    NonFinite { component: ComponentKind, value: f64 },
}

/// The four scored domains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Seismic,
    Ionosphere,
    Time,
    Crowd,
}

impl ComponentKind {
    /// Maximum weighted contribution of this component
    pub fn ceiling(&self) -> u8 {
        match self {
            ComponentKind::Seismic => SEISMIC_CEILING,
            ComponentKind::Ionosphere => IONOSPHERE_CEILING,
            ComponentKind::Time => TIME_CEILING,
            ComponentKind::Crowd => CROWD_CEILING,
        }
    }

    /// Scale a 0–100 reading onto this component's ceiling and round it
    pub fn weigh(&self, normalized: f64) -> Result<u8, ScoreError> {
        if !normalized.is_finite() {
            return Err(ScoreError::NonFinite {
                component: *self,
                value: normalized,
            });
        }
        let ceiling = f64::from(self.ceiling());
        let raw = (normalized.clamp(0.0, 100.0) / 100.0 * ceiling).clamp(0.0, ceiling);
        Ok(raw.round() as u8)
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ComponentKind::Seismic => "seismic",
            ComponentKind::Ionosphere => "ionosphere",
            ComponentKind::Time => "time",
            ComponentKind::Crowd => "crowd",
        };
        f.write_str(name)
    }
}

/// A domain reading with its 0–100 anomaly level
pub trait Indicator {
    fn normalized(&self) -> f64;
}

/// Recent seismicity, driven by the ETAS probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeismicIndicator {
    pub normalized: f64,
    /// Events in the merged list
    pub events48h: usize,
    /// Typical event count for the region
    pub baseline: f64,
    /// ETAS probability, one decimal
    pub etas_prob: f64,
    /// Largest magnitude in the merged list, 0 when empty
    pub max_mag: f64,
}

/// Ionospheric and atmospheric telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IonosphereIndicator {
    pub normalized: f64,
    pub tec: String,
    pub tec_anomaly: String,
    pub pressure: String,
    pub pressure_anomaly: String,
}

/// Time elapsed since the last major regional event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeIndicator {
    pub normalized: f64,
    pub last_major_date: String,
    pub cycle_percent: f64,
}

/// Citizen felt reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrowdIndicator {
    pub normalized: f64,
    pub felt24h: u32,
    pub felt1h: u32,
    pub avg: u32,
}

macro_rules! impl_indicator {
    ($($ty:ty),*) => {
        $(impl Indicator for $ty {
            fn normalized(&self) -> f64 {
                self.normalized
            }
        })*
    };
}

impl_indicator!(SeismicIndicator, IonosphereIndicator, TimeIndicator, CrowdIndicator);

/// An indicator together with its weighted contribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scored<T> {
    pub score: u8,
    #[serde(flatten)]
    pub indicator: T,
}

/// Scorer input
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentInputs {
    pub seismic: SeismicIndicator,
    pub ionosphere: IonosphereIndicator,
    pub time: TimeIndicator,
    pub crowd: CrowdIndicator,
}

/// The four scored components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredComponents {
    pub seismic: Scored<SeismicIndicator>,
    pub ionosphere: Scored<IonosphereIndicator>,
    pub time: Scored<TimeIndicator>,
    pub crowd: Scored<CrowdIndicator>,
}

impl ScoredComponents {
    fn sum(&self) -> u8 {
        self.seismic.score + self.ionosphere.score + self.time.score + self.crowd.score
    }
}

/// The published risk index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeScore {
    pub total_score: u8,
    pub components: ScoredComponents,
    pub timestamp: DateTime<Utc>,
    pub is_official_alert: bool,
}

impl CompositeScore {
    /// Score components at the current instant
    pub fn compute(inputs: ComponentInputs) -> Result<Self, ScoreError> {
        Self::compute_at(inputs, Utc::now())
    }

    /// Score components with an explicit timestamp
    pub fn compute_at(inputs: ComponentInputs, timestamp: DateTime<Utc>) -> Result<Self, ScoreError> {
        let ComponentInputs {
            seismic,
            ionosphere,
            time,
            crowd,
        } = inputs;

        let components = ScoredComponents {
            seismic: scored(ComponentKind::Seismic, seismic)?,
            ionosphere: scored(ComponentKind::Ionosphere, ionosphere)?,
            time: scored(ComponentKind::Time, time)?,
            crowd: scored(ComponentKind::Crowd, crowd)?,
        };

        Ok(Self {
            total_score: components.sum(),
            components,
            timestamp,
            is_official_alert: false,
        })
    }

    /// Replace the organic score with the official-alert maximum.
    ///
    /// Every component is pinned to its ceiling and the total to 100.
    /// Display fields are left as computed.
    pub fn apply_official_alert(&mut self) {
        self.components.seismic.score = ComponentKind::Seismic.ceiling();
        self.components.ionosphere.score = ComponentKind::Ionosphere.ceiling();
        self.components.time.score = ComponentKind::Time.ceiling();
        self.components.crowd.score = ComponentKind::Crowd.ceiling();
        self.total_score = 100;
        self.is_official_alert = true;
    }
}

fn scored<T: Indicator>(kind: ComponentKind, indicator: T) -> Result<Scored<T>, ScoreError> {
    let score = kind.weigh(indicator.normalized())?;
    Ok(Scored { score, indicator })
}
