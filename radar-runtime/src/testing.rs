//! Scripted feeds for exercising the cycle without a network

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use radar_core::{Event, EventSource};
use radar_feeds::{
    AlertStatus, FeedError, FeltReport, Feed, IonosphereReading, PressureReading, SharedFeed,
};

use crate::FeedSet;

/// What a scripted feed does when fetched
#[derive(Clone)]
pub enum Script<T> {
    Ok(T),
    Fail,
    Hang,
    Panic,
}

pub struct ScriptedFeed<T> {
    name: &'static str,
    script: Script<T>,
    fallback: T,
    delay: Duration,
    pub calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl<T: Clone + Send + Sync + 'static> ScriptedFeed<T> {
    pub fn new(name: &'static str, script: Script<T>, fallback: T) -> Self {
        Self {
            name,
            script,
            fallback,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn shared(self) -> SharedFeed<T> {
        Arc::new(self)
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Feed for ScriptedFeed<T> {
    type Output = T;

    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self) -> Result<T, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match &self.script {
            Script::Ok(value) => Ok(value.clone()),
            Script::Fail => Err(FeedError::Parse("scripted failure".to_string())),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(FeedError::Parse("hung".to_string()))
            }
            Script::Panic => panic!("scripted panic in {}", self.name),
        }
    }

    fn fallback(&self) -> T {
        self.fallback.clone()
    }
}

pub fn quake(source: EventSource, time: i64, mag: f64) -> Event {
    Event::builder(source, time)
        .magnitude(Some(mag))
        .coordinates(35.5, 31.5)
        .build()
}

pub fn ionosphere(normalized: f64) -> IonosphereReading {
    IonosphereReading {
        tec: "Connected".to_string(),
        tec_anomaly: "N/A".to_string(),
        normalized,
    }
}

/// Scripts for all six feeds
pub struct Scripts {
    pub gsi: Script<Vec<Event>>,
    pub usgs: Script<Vec<Event>>,
    pub felt: Script<FeltReport>,
    pub ionosphere: Script<IonosphereReading>,
    pub pressure: Script<PressureReading>,
    pub alert: Script<AlertStatus>,
}

impl Default for Scripts {
    fn default() -> Self {
        Self {
            gsi: Script::Ok(Vec::new()),
            usgs: Script::Ok(Vec::new()),
            felt: Script::Ok(FeltReport::default()),
            ionosphere: Script::Ok(IonosphereReading::no_data()),
            pressure: Script::Ok(PressureReading::baseline()),
            alert: Script::Ok(AlertStatus::inactive()),
        }
    }
}

impl Scripts {
    pub fn all_failing() -> Self {
        Self {
            gsi: Script::Fail,
            usgs: Script::Fail,
            felt: Script::Fail,
            ionosphere: Script::Fail,
            pressure: Script::Fail,
            alert: Script::Fail,
        }
    }

    pub fn into_feeds(self) -> FeedSet {
        FeedSet {
            gsi: ScriptedFeed::new("gsi", self.gsi, Vec::new()).shared(),
            usgs: ScriptedFeed::new("usgs", self.usgs, Vec::new()).shared(),
            felt: ScriptedFeed::new("emsc", self.felt, FeltReport::default()).shared(),
            ionosphere: ScriptedFeed::new("nasa", self.ionosphere, IonosphereReading::no_data())
                .shared(),
            pressure: ScriptedFeed::new("pressure", self.pressure, PressureReading::baseline())
                .shared(),
            alert: ScriptedFeed::new("alert", self.alert, AlertStatus::inactive()).shared(),
        }
    }
}
