//! USGS global summary feed
//!
//! Pulls the weekly GeoJSON summary and keeps events within the region
//! radius.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use radar_core::{Event, EventSource};

use crate::{create_client, get_checked, Feed, FeedError, HttpConfig, RegionConfig};

/// USGS feed configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsgsConfig {
    pub url: String,
}

impl Default for UsgsConfig {
    fn default() -> Self {
        Self {
            url: "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_week.geojson"
                .to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<GeoFeature>,
}

#[derive(Debug, Deserialize)]
struct GeoFeature {
    id: Option<String>,
    properties: GeoProperties,
    geometry: Option<GeoGeometry>,
}

#[derive(Debug, Deserialize)]
struct GeoProperties {
    mag: Option<f64>,
    place: Option<String>,
    time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct GeoGeometry {
    coordinates: Vec<f64>,
}

/// Parse a USGS GeoJSON body into regional events
pub fn parse_usgs_geojson(body: &str, region: &RegionConfig) -> Result<Vec<Event>, FeedError> {
    let collection: FeatureCollection = serde_json::from_str(body)?;

    let events = collection
        .features
        .into_iter()
        .filter_map(|feature| {
            let time = feature.properties.time?;
            let coords = feature.geometry?.coordinates;
            let (lon, lat) = (*coords.first()?, *coords.get(1)?);
            let depth = coords.get(2).copied().unwrap_or(0.0);

            if !region.within_radius(lat, lon) {
                return None;
            }

            Some(
                Event::builder(EventSource::Usgs, time)
                    .id(feature.id.unwrap_or_default())
                    .magnitude(feature.properties.mag)
                    .depth_km(depth)
                    .coordinates(lon, lat)
                    .place(feature.properties.place.unwrap_or_default())
                    .build(),
            )
        })
        .collect();

    Ok(events)
}

/// Seismicity feed backed by USGS
pub struct UsgsFeed {
    config: UsgsConfig,
    region: RegionConfig,
    client: Client,
}

impl UsgsFeed {
    pub fn new(config: UsgsConfig, region: RegionConfig, http: &HttpConfig) -> Result<Self, FeedError> {
        Ok(Self {
            config,
            region,
            client: create_client(http)?,
        })
    }
}

#[async_trait]
impl Feed for UsgsFeed {
    type Output = Vec<Event>;

    fn name(&self) -> &str {
        "usgs"
    }

    async fn fetch(&self) -> Result<Vec<Event>, FeedError> {
        let response = get_checked(self.client.get(&self.config.url)).await?;
        let body = response.text().await?;
        let events = parse_usgs_geojson(&body, &self.region)?;

        debug!("USGS returned {} regional events", events.len());
        Ok(events)
    }

    fn fallback(&self) -> Vec<Event> {
        Vec::new()
    }
}
