//! Seismic events as reported by the upstream feeds
//!
//! Every feed normalizes its records into [`Event`]. On the wire, events
//! are rendered in a GeoJSON-like feature shape ([`QuakeFeature`]).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Feed an event originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventSource {
    /// Geological Survey of Israel regional bulletin
    #[serde(rename = "GSI")]
    Gsi,
    /// USGS global summary feed
    #[serde(rename = "USGS")]
    Usgs,
    /// EMSC felt-report service
    #[serde(rename = "EMSC")]
    Emsc,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::Gsi => "GSI",
            EventSource::Usgs => "USGS",
            EventSource::Emsc => "EMSC",
        }
    }
}

impl std::fmt::Display for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single seismic occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Upstream id, or synthesized from source and time
    pub id: String,
    /// Origin time, epoch milliseconds
    pub time: i64,
    /// Magnitude, if the feed reported one
    pub magnitude: Option<f64>,
    /// Hypocentre depth in km
    pub depth_km: f64,
    pub longitude: f64,
    pub latitude: f64,
    /// Human-readable location
    pub place: String,
    pub source: EventSource,
}

impl Event {
    /// Create a new event builder
    pub fn builder(source: EventSource, time_ms: i64) -> EventBuilder {
        EventBuilder::new(source, time_ms)
    }

    /// Magnitude used for filtering; absent magnitudes count as 0
    pub fn magnitude_or_zero(&self) -> f64 {
        self.magnitude.unwrap_or(0.0)
    }

    fn synthesize_id(source: EventSource, time_ms: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(time_ms.to_string().as_bytes());
        format!("{:x}", hasher.finalize())[..16].to_string()
    }
}

/// Builder for events
pub struct EventBuilder {
    id: Option<String>,
    time: i64,
    magnitude: Option<f64>,
    depth_km: f64,
    longitude: f64,
    latitude: f64,
    place: String,
    source: EventSource,
}

impl EventBuilder {
    pub fn new(source: EventSource, time_ms: i64) -> Self {
        Self {
            id: None,
            time: time_ms,
            magnitude: None,
            depth_km: 0.0,
            longitude: 0.0,
            latitude: 0.0,
            place: String::new(),
            source,
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        if !id.is_empty() {
            self.id = Some(id);
        }
        self
    }

    pub fn magnitude(mut self, magnitude: Option<f64>) -> Self {
        self.magnitude = magnitude.filter(|m| m.is_finite());
        self
    }

    pub fn depth_km(mut self, depth_km: f64) -> Self {
        self.depth_km = depth_km;
        self
    }

    pub fn coordinates(mut self, longitude: f64, latitude: f64) -> Self {
        self.longitude = longitude;
        self.latitude = latitude;
        self
    }

    pub fn place(mut self, place: impl Into<String>) -> Self {
        self.place = place.into();
        self
    }

    pub fn build(self) -> Event {
        let id = self
            .id
            .unwrap_or_else(|| Event::synthesize_id(self.source, self.time));

        Event {
            id,
            time: self.time,
            magnitude: self.magnitude,
            depth_km: self.depth_km,
            longitude: self.longitude,
            latitude: self.latitude,
            place: self.place,
            source: self.source,
        }
    }
}

/// Properties block of a quake feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuakeProperties {
    pub mag: Option<f64>,
    pub place: String,
    pub time: i64,
    pub source: EventSource,
}

/// Geometry block of a quake feature: `[lon, lat, depthKm]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuakeGeometry {
    pub coordinates: [f64; 3],
}

/// GeoJSON-like rendering of an [`Event`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuakeFeature {
    pub id: String,
    pub properties: QuakeProperties,
    pub geometry: QuakeGeometry,
}

impl From<&Event> for QuakeFeature {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            properties: QuakeProperties {
                mag: event.magnitude,
                place: event.place.clone(),
                time: event.time,
                source: event.source,
            },
            geometry: QuakeGeometry {
                coordinates: [event.longitude, event.latitude, event.depth_km],
            },
        }
    }
}

/// Response body of the quake list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuakeList {
    pub count: usize,
    pub features: Vec<QuakeFeature>,
}

impl QuakeList {
    pub fn from_events(events: &[Event]) -> Self {
        let features: Vec<QuakeFeature> = events.iter().map(QuakeFeature::from).collect();
        Self {
            count: features.len(),
            features,
        }
    }
}
