//! EMSC felt-report feed
//!
//! Estimates citizen felt reports from recent regional events. Events
//! above M3 are assumed felt in proportion to magnitude unless EMSC
//! reports the number of felt zones directly.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{create_client, get_checked, Feed, FeedError, HttpConfig, RegionConfig};

/// Magnitude above which an event is assumed felt
const FELT_MAGNITUDE: f64 = 3.0;

/// Felt reports per magnitude unit for felt events
const FELT_PER_MAGNITUDE: f64 = 15.0;

/// EMSC feed configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmscConfig {
    pub url: String,
    /// Look-back window in hours
    pub window_hours: i64,
    /// Maximum events requested
    pub limit: u32,
}

impl Default for EmscConfig {
    fn default() -> Self {
        Self {
            url: "https://www.seismicportal.eu/fdsnws/event/1/query".to_string(),
            window_hours: 24,
            limit: 500,
        }
    }
}

/// Felt-report snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeltReport {
    pub events_in_region24h: u32,
    pub simulated_felt_reports: u32,
}

impl FeltReport {
    /// Crowd anomaly level: felt reports capped at 100
    pub fn normalized(&self) -> f64 {
        f64::from(self.simulated_felt_reports.min(100))
    }
}

/// A regional event as far as felt estimation is concerned
#[derive(Debug, Clone, PartialEq)]
pub struct FeltEvent {
    pub time_ms: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub magnitude: Option<f64>,
    pub felt_zones: Option<u32>,
}

impl FeltEvent {
    fn felt_reports(&self) -> u32 {
        if let Some(zones) = self.felt_zones.filter(|z| *z > 0) {
            return zones;
        }
        match self.magnitude {
            Some(mag) if mag > FELT_MAGNITUDE => (mag * FELT_PER_MAGNITUDE).floor() as u32,
            _ => 0,
        }
    }
}

/// Summarize events inside the region and window into a felt report
pub fn summarize_felt(
    events: &[FeltEvent],
    region: &RegionConfig,
    now: DateTime<Utc>,
    window_hours: i64,
) -> FeltReport {
    let cutoff = (now - Duration::hours(window_hours)).timestamp_millis();

    events
        .iter()
        .filter(|e| e.time_ms > cutoff && region.within_bbox(e.latitude, e.longitude))
        .fold(FeltReport::default(), |mut report, e| {
            report.events_in_region24h += 1;
            report.simulated_felt_reports += e.felt_reports();
            report
        })
}

#[derive(Debug, Deserialize)]
struct FdsnCollection {
    #[serde(default)]
    features: Vec<FdsnFeature>,
}

#[derive(Debug, Deserialize)]
struct FdsnFeature {
    properties: FdsnProperties,
}

#[derive(Debug, Deserialize)]
struct FdsnProperties {
    time: String,
    lat: f64,
    lon: f64,
    mag: Option<f64>,
    nb_zones: Option<u32>,
}

/// Parse an EMSC FDSN JSON body; features with unreadable times are dropped
pub fn parse_emsc_events(body: &str) -> Result<Vec<FeltEvent>, FeedError> {
    let collection: FdsnCollection = serde_json::from_str(body)?;

    Ok(collection
        .features
        .into_iter()
        .filter_map(|f| {
            let time = DateTime::parse_from_rfc3339(&f.properties.time).ok()?;
            Some(FeltEvent {
                time_ms: time.timestamp_millis(),
                latitude: f.properties.lat,
                longitude: f.properties.lon,
                magnitude: f.properties.mag,
                felt_zones: f.properties.nb_zones,
            })
        })
        .collect())
}

/// Felt-report feed backed by EMSC
pub struct EmscFeed {
    config: EmscConfig,
    region: RegionConfig,
    client: Client,
}

impl EmscFeed {
    pub fn new(config: EmscConfig, region: RegionConfig, http: &HttpConfig) -> Result<Self, FeedError> {
        Ok(Self {
            config,
            region,
            client: create_client(http)?,
        })
    }
}

#[async_trait]
impl Feed for EmscFeed {
    type Output = FeltReport;

    fn name(&self) -> &str {
        "emsc"
    }

    async fn fetch(&self) -> Result<FeltReport, FeedError> {
        let now = Utc::now();
        let start = (now - Duration::hours(self.config.window_hours))
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string();
        let region = &self.region;

        let request = self.client.get(&self.config.url).query(&[
            ("format", "json".to_string()),
            ("start", start),
            ("minlat", region.min_lat.to_string()),
            ("maxlat", region.max_lat.to_string()),
            ("minlon", region.min_lon.to_string()),
            ("maxlon", region.max_lon.to_string()),
            ("limit", self.config.limit.to_string()),
        ]);

        let response = get_checked(request).await?;
        // FDSN answers 204 with an empty body when nothing matched
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(FeltReport::default());
        }

        let events = parse_emsc_events(&body)?;
        let report = summarize_felt(&events, region, now, self.config.window_hours);

        debug!(
            "EMSC: {} regional events, {} felt reports",
            report.events_in_region24h, report.simulated_felt_reports
        );
        Ok(report)
    }

    fn fallback(&self) -> FeltReport {
        FeltReport::default()
    }
}
