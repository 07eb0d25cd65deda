//! Home Front Command (Pikud HaOref) alert feed
//!
//! The alerts endpoint returns an empty body when nothing is active, or a
//! single alert object. Only earthquake alerts count; other alert kinds
//! are ignored.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{create_client, get_checked, Feed, FeedError, HttpConfig};

/// Hebrew for "earthquake", as it appears in alert titles
pub const EARTHQUAKE_TITLE: &str = "רעידת אדמה";

/// Alert feed configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub url: String,
    pub referer: String,
    /// Alert categories treated as earthquake alerts
    pub earthquake_categories: Vec<String>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            url: "https://www.oref.org.il/WarningMessages/alert/alerts.json".to_string(),
            referer: "https://www.oref.org.il/".to_string(),
            earthquake_categories: vec!["1".to_string()],
        }
    }
}

/// Raw alert as published upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficialAlert {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "category_string")]
    pub cat: Option<String>,
    #[serde(default)]
    pub title: String,
    /// Affected cities
    #[serde(default)]
    pub data: Vec<String>,
    #[serde(default)]
    pub desc: Option<String>,
}

/// Accept the category as either a string or a number
fn category_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Alert snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertStatus {
    pub active_alert: bool,
    pub data: Option<OfficialAlert>,
}

impl AlertStatus {
    pub fn inactive() -> Self {
        Self::default()
    }
}

/// Classify an alerts body
pub fn parse_alert_status(body: &str, config: &AlertConfig) -> Result<AlertStatus, FeedError> {
    let body = body.trim_start_matches('\u{feff}').trim();
    if body.is_empty() {
        return Ok(AlertStatus::inactive());
    }

    let alert: OfficialAlert = serde_json::from_str(body)?;
    if alert.data.is_empty() {
        return Ok(AlertStatus::inactive());
    }

    let by_title = alert.title.contains(EARTHQUAKE_TITLE);
    let by_category = alert
        .cat
        .as_ref()
        .is_some_and(|c| config.earthquake_categories.contains(c));

    if by_title || by_category {
        warn!("Official earthquake alert active: {} ({} areas)", alert.title, alert.data.len());
        Ok(AlertStatus {
            active_alert: true,
            data: Some(alert),
        })
    } else {
        debug!("Ignoring non-seismic alert: {}", alert.title);
        Ok(AlertStatus::inactive())
    }
}

/// Authoritative alert feed
pub struct AlertFeed {
    config: AlertConfig,
    client: Client,
}

impl AlertFeed {
    pub fn new(config: AlertConfig, http: &HttpConfig) -> Result<Self, FeedError> {
        Ok(Self {
            config,
            client: create_client(http)?,
        })
    }
}

#[async_trait]
impl Feed for AlertFeed {
    type Output = AlertStatus;

    fn name(&self) -> &str {
        "alert"
    }

    async fn fetch(&self) -> Result<AlertStatus, FeedError> {
        let request = self
            .client
            .get(&self.config.url)
            .header("Referer", &self.config.referer)
            .header("X-Requested-With", "XMLHttpRequest");

        let response = get_checked(request).await?;
        let body = response.text().await?;
        parse_alert_status(&body, &self.config)
    }

    fn fallback(&self) -> AlertStatus {
        AlertStatus::inactive()
    }
}
