//! Surface pressure feed (Open-Meteo)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{create_client, get_checked, Feed, FeedError, HttpConfig};

/// Standard regional baseline pressure in hPa
pub const BASELINE_PRESSURE_HPA: f64 = 1012.0;

/// Pressure anomaly classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PressureAnomaly {
    Normal,
    High,
}

impl std::fmt::Display for PressureAnomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PressureAnomaly::Normal => f.write_str("Normal"),
            PressureAnomaly::High => f.write_str("High"),
        }
    }
}

/// Pressure feed configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressureConfig {
    pub url: String,
    pub station: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Deviation from baseline, in hPa, that counts as an anomaly
    pub anomaly_threshold_hpa: f64,
}

impl Default for PressureConfig {
    fn default() -> Self {
        Self {
            url: "https://api.open-meteo.com/v1/forecast".to_string(),
            station: "Jerusalem (Open-Meteo)".to_string(),
            latitude: 31.769,
            longitude: 35.216,
            anomaly_threshold_hpa: 5.0,
        }
    }
}

/// Pressure snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PressureReading {
    pub station: String,
    pub pressure_hpa: f64,
    pub anomaly: PressureAnomaly,
}

impl PressureReading {
    pub fn classify(station: &str, pressure_hpa: f64, threshold_hpa: f64) -> Self {
        let anomaly = if (pressure_hpa - BASELINE_PRESSURE_HPA).abs() > threshold_hpa {
            PressureAnomaly::High
        } else {
            PressureAnomaly::Normal
        };
        Self {
            station: station.to_string(),
            pressure_hpa,
            anomaly,
        }
    }

    /// Baseline reading used when the feed is unavailable
    pub fn baseline() -> Self {
        Self {
            station: "Jerusalem (Fallback)".to_string(),
            pressure_hpa: BASELINE_PRESSURE_HPA,
            anomaly: PressureAnomaly::Normal,
        }
    }

    /// Display form, e.g. "1012.0 hPa"
    pub fn display_pressure(&self) -> String {
        format!("{:.1} hPa", self.pressure_hpa)
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<CurrentConditions>,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    surface_pressure: Option<f64>,
}

/// Extract surface pressure from an Open-Meteo body; missing values read
/// as the baseline
pub fn parse_surface_pressure(body: &str) -> Result<f64, FeedError> {
    let response: ForecastResponse = serde_json::from_str(body)?;
    Ok(response
        .current
        .and_then(|c| c.surface_pressure)
        .filter(|p| p.is_finite())
        .unwrap_or(BASELINE_PRESSURE_HPA))
}

/// Pressure feed backed by Open-Meteo
pub struct PressureFeed {
    config: PressureConfig,
    client: Client,
}

impl PressureFeed {
    pub fn new(config: PressureConfig, http: &HttpConfig) -> Result<Self, FeedError> {
        Ok(Self {
            config,
            client: create_client(http)?,
        })
    }
}

#[async_trait]
impl Feed for PressureFeed {
    type Output = PressureReading;

    fn name(&self) -> &str {
        "pressure"
    }

    async fn fetch(&self) -> Result<PressureReading, FeedError> {
        let request = self.client.get(&self.config.url).query(&[
            ("latitude", self.config.latitude.to_string()),
            ("longitude", self.config.longitude.to_string()),
            ("current", "surface_pressure".to_string()),
        ]);

        let response = get_checked(request).await?;
        let body = response.text().await?;
        let pressure = parse_surface_pressure(&body)?;

        debug!("Surface pressure at {}: {:.1} hPa", self.config.station, pressure);
        Ok(PressureReading::classify(
            &self.config.station,
            pressure,
            self.config.anomaly_threshold_hpa,
        ))
    }

    fn fallback(&self) -> PressureReading {
        PressureReading::baseline()
    }
}
