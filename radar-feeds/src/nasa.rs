//! NASA Earthdata CMR ionosphere feed
//!
//! Looks for a recent global ionosphere map (GNSS TEC) granule. Decoding
//! IONEX granules into TEC values is not done here; a found granule only
//! confirms the product is live.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{create_client, get_checked, Feed, FeedError, HttpConfig};

/// Sentinel shown when no TEC data is available
pub const NO_DATA: &str = "--";

/// NASA feed configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NasaConfig {
    pub url: String,
    /// CMR collection short name
    pub short_name: String,
    /// Earthdata bearer token (or set NASA_API_TOKEN env var)
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Normalized level reported while a granule is available
    pub connected_level: f64,
}

impl Default for NasaConfig {
    fn default() -> Self {
        Self {
            url: "https://cmr.earthdata.nasa.gov/search/granules.json".to_string(),
            short_name: "JPLG0000".to_string(),
            token: std::env::var("NASA_API_TOKEN").ok().filter(|t| !t.is_empty()),
            connected_level: 50.0,
        }
    }
}

/// Ionosphere snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IonosphereReading {
    pub tec: String,
    pub tec_anomaly: String,
    pub normalized: f64,
}

impl IonosphereReading {
    /// "No data" sentinel
    pub fn no_data() -> Self {
        Self {
            tec: NO_DATA.to_string(),
            tec_anomaly: NO_DATA.to_string(),
            normalized: 0.0,
        }
    }

    pub fn has_data(&self) -> bool {
        self.tec != NO_DATA
    }
}

#[derive(Debug, Deserialize)]
struct CmrResponse {
    feed: CmrFeed,
}

#[derive(Debug, Deserialize)]
struct CmrFeed {
    #[serde(default)]
    entry: Vec<serde_json::Value>,
}

/// Interpret a CMR granule search body
pub fn parse_cmr_granules(body: &str, connected_level: f64) -> Result<IonosphereReading, FeedError> {
    let response: CmrResponse = serde_json::from_str(body)?;

    if response.feed.entry.is_empty() {
        return Ok(IonosphereReading::no_data());
    }

    Ok(IonosphereReading {
        tec: "Connected".to_string(),
        tec_anomaly: "N/A".to_string(),
        normalized: connected_level,
    })
}

/// Ionosphere feed backed by NASA CMR
pub struct NasaFeed {
    config: NasaConfig,
    client: Client,
}

impl NasaFeed {
    pub fn new(config: NasaConfig, http: &HttpConfig) -> Result<Self, FeedError> {
        Ok(Self {
            config,
            client: create_client(http)?,
        })
    }
}

#[async_trait]
impl Feed for NasaFeed {
    type Output = IonosphereReading;

    fn name(&self) -> &str {
        "nasa"
    }

    async fn fetch(&self) -> Result<IonosphereReading, FeedError> {
        let Some(token) = self.config.token.as_deref() else {
            debug!("NASA_API_TOKEN not configured, reporting no ionosphere data");
            return Ok(IonosphereReading::no_data());
        };

        let since = (Utc::now() - Duration::days(1)).format("%Y-%m-%dT%H:%M:%SZ");
        let request = self
            .client
            .get(&self.config.url)
            .bearer_auth(token)
            .query(&[
                ("short_name", self.config.short_name.clone()),
                ("temporal", format!("{},", since)),
                ("page_size", "1".to_string()),
            ]);

        let response = get_checked(request).await?;
        let body = response.text().await?;
        parse_cmr_granules(&body, self.config.connected_level)
    }

    fn fallback(&self) -> IonosphereReading {
        IonosphereReading::no_data()
    }
}
