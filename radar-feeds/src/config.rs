//! Feed configuration and region geometry

use serde::{Deserialize, Serialize};

use crate::{AlertConfig, EmscConfig, GsiConfig, HttpConfig, NasaConfig, PressureConfig, UsgsConfig};

/// Mean Earth radius in km
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Monitored region: a radius around a centre for the seismicity feeds,
/// and a bounding box for felt reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_km: f64,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            center_lat: 31.5,
            center_lon: 35.0,
            radius_km: 500.0,
            min_lat: 29.0,
            max_lat: 34.0,
            min_lon: 34.0,
            max_lon: 36.0,
        }
    }
}

impl RegionConfig {
    /// Great-circle (haversine) distance from the centre in km
    pub fn distance_km(&self, lat: f64, lon: f64) -> f64 {
        let d_lat = (lat - self.center_lat).to_radians();
        let d_lon = (lon - self.center_lon).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.center_lat.to_radians().cos() * lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }

    pub fn within_radius(&self, lat: f64, lon: f64) -> bool {
        self.distance_km(lat, lon) <= self.radius_km
    }

    pub fn within_bbox(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

/// Configuration for all six adapters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    pub http: HttpConfig,
    pub region: RegionConfig,
    pub usgs: UsgsConfig,
    pub gsi: GsiConfig,
    pub emsc: EmscConfig,
    pub nasa: NasaConfig,
    pub pressure: PressureConfig,
    pub alert: AlertConfig,
}
