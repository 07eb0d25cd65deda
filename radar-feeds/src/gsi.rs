//! Geological Survey of Israel bulletin scraper
//!
//! The bulletin page lists recent regional events in an HTML table. Columns
//! are located by header text so reordering upstream does not break
//! parsing; rows that cannot be read are skipped.

use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use radar_core::{Event, EventSource};

use crate::{create_client, get_checked, Feed, FeedError, HttpConfig};

/// GSI feed configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GsiConfig {
    pub url: String,
}

impl Default for GsiConfig {
    fn default() -> Self {
        Self {
            url: "https://eq.gsi.gov.il/en/earthquake/lastEarthquakes.php".to_string(),
        }
    }
}

/// Accepted origin-time layouts (UTC)
const TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
];

/// Column positions resolved from the header row
#[derive(Debug, Default)]
struct Columns {
    date: Option<usize>,
    time: Option<usize>,
    lat: Option<usize>,
    lon: Option<usize>,
    depth: Option<usize>,
    mag: Option<usize>,
    region: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &[String]) -> Self {
        let mut cols = Columns::default();
        for (i, header) in headers.iter().enumerate() {
            let h = header.to_lowercase();
            if h.contains("date") {
                cols.date.get_or_insert(i);
            } else if h.contains("time") {
                cols.time.get_or_insert(i);
            } else if h.starts_with("lat") {
                cols.lat.get_or_insert(i);
            } else if h.starts_with("lon") {
                cols.lon.get_or_insert(i);
            } else if h.contains("depth") {
                cols.depth.get_or_insert(i);
            } else if h.contains("mag") || h == "md" || h == "ml" {
                cols.mag.get_or_insert(i);
            } else if h.contains("region") || h.contains("location") {
                cols.region.get_or_insert(i);
            }
        }
        cols
    }

    fn usable(&self) -> bool {
        (self.date.is_some() || self.time.is_some()) && self.lat.is_some() && self.lon.is_some()
    }
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_number(text: &str, number: &Regex) -> Option<f64> {
    number.find(text)?.as_str().parse().ok()
}

fn parse_time_ms(text: &str) -> Option<i64> {
    TIME_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(text, fmt)
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive).timestamp_millis())
    })
}

/// Origin time and epicentre of a row, if all three are readable
fn row_origin(
    stamp: &str,
    lat: Option<&str>,
    lon: Option<&str>,
    number: &Regex,
) -> Option<(i64, f64, f64)> {
    let time = parse_time_ms(stamp)?;
    let lat = parse_number(lat?, number)?;
    let lon = parse_number(lon?, number)?;
    Some((time, lat, lon))
}

fn selector(css: &str) -> Result<Selector, FeedError> {
    Selector::parse(css).map_err(|e| FeedError::Parse(format!("selector {}: {:?}", css, e)))
}

/// Parse events from the bulletin HTML
pub fn parse_gsi_bulletin(html: &str) -> Result<Vec<Event>, FeedError> {
    let document = Html::parse_document(html);
    let row_selector = selector("table tr")?;
    let header_selector = selector("th")?;
    let cell_selector = selector("td")?;
    let number = Regex::new(r"-?\d+(?:\.\d+)?").map_err(|e| FeedError::Parse(e.to_string()))?;

    let mut columns: Option<Columns> = None;
    let mut events = Vec::new();
    let mut skipped = 0usize;

    for row in document.select(&row_selector) {
        let headers: Vec<String> = row.select(&header_selector).map(cell_text).collect();
        if !headers.is_empty() {
            let cols = Columns::from_headers(&headers);
            if cols.usable() {
                columns = Some(cols);
            }
            continue;
        }

        let Some(cols) = columns.as_ref() else {
            continue;
        };

        let cells: Vec<String> = row.select(&cell_selector).map(cell_text).collect();
        let cell = |idx: Option<usize>| idx.and_then(|i| cells.get(i)).map(String::as_str);

        let stamp = match (cell(cols.date), cell(cols.time)) {
            (Some(d), Some(t)) if cols.date != cols.time => format!("{} {}", d, t),
            (Some(d), _) => d.to_string(),
            (None, Some(t)) => t.to_string(),
            (None, None) => String::new(),
        };

        let Some((time, lat, lon)) = row_origin(&stamp, cell(cols.lat), cell(cols.lon), &number) else {
            skipped += 1;
            continue;
        };

        let event = Event::builder(EventSource::Gsi, time)
            .magnitude(cell(cols.mag).and_then(|m| parse_number(m, &number)))
            .depth_km(cell(cols.depth).and_then(|d| parse_number(d, &number)).unwrap_or(0.0))
            .coordinates(lon, lat)
            .place(cell(cols.region).unwrap_or_default())
            .build();

        events.push(event);
    }

    if columns.is_none() {
        return Err(FeedError::Parse("no events table found".to_string()));
    }
    if skipped > 0 {
        debug!("GSI bulletin: skipped {} unreadable rows", skipped);
    }

    Ok(events)
}

/// Seismicity feed backed by the GSI bulletin
pub struct GsiFeed {
    config: GsiConfig,
    client: Client,
}

impl GsiFeed {
    pub fn new(config: GsiConfig, http: &HttpConfig) -> Result<Self, FeedError> {
        Ok(Self {
            config,
            client: create_client(http)?,
        })
    }
}

#[async_trait]
impl Feed for GsiFeed {
    type Output = Vec<Event>;

    fn name(&self) -> &str {
        "gsi"
    }

    async fn fetch(&self) -> Result<Vec<Event>, FeedError> {
        let response = get_checked(self.client.get(&self.config.url)).await?;
        let html = response.text().await?;
        let events = parse_gsi_bulletin(&html)?;

        if events.is_empty() {
            warn!("GSI bulletin parsed but contained no events");
        }
        debug!("GSI returned {} events", events.len());
        Ok(events)
    }

    fn fallback(&self) -> Vec<Event> {
        Vec::new()
    }
}
