//! Aggregation cycle
//!
//! One cycle:
//! 1. Fetch all six feeds concurrently, each time-bounded and isolated
//! 2. Merge the two seismicity lists
//! 3. ETAS probability of the merged list at "now" drives the seismic reading
//! 4. The other readings come straight from their feeds
//! 5. Score
//! 6. Official alert overrides everything
//! 7. Publish score and events together
//!
//! Anything that fails before step 7 leaves the cache untouched.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use radar_core::{
    max_magnitude, merge_events, ComponentInputs, CompositeScore, CrowdIndicator, EtasModel,
    EtasParams, Event, IonosphereIndicator, RecurrenceModel, ScoreError, SeismicIndicator,
};
use radar_feeds::{
    AlertFeed, AlertStatus, EmscFeed, FeedError, FeedsConfig, FeltReport, GsiFeed,
    IonosphereReading, NasaFeed, PressureFeed, PressureReading, SharedFeed, UsgsFeed,
};

use crate::{score_cache, CacheEntry, CacheReader, CacheWriter, RadarConfig};

/// Typical regional event count shown beside the seismic reading
pub const SEISMIC_BASELINE_EVENTS: f64 = 12.5;

/// Typical daily felt reports shown beside the crowd reading
pub const CROWD_AVERAGE_FELT: u32 = 12;

/// Errors that abort a cycle
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Scoring failed: {0}")]
    Score(#[from] ScoreError),

    #[error("ETAS intensity is not a number")]
    NanIntensity,

    #[error("Cycle task failed: {0}")]
    Panicked(String),
}

/// How a feed call ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    Live,
    Failed(String),
    TimedOut,
    Panicked,
}

impl FeedStatus {
    pub fn is_live(&self) -> bool {
        matches!(self, FeedStatus::Live)
    }
}

impl fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedStatus::Live => f.write_str("live"),
            FeedStatus::Failed(e) => write!(f, "failed ({})", e),
            FeedStatus::TimedOut => f.write_str("timed out"),
            FeedStatus::Panicked => f.write_str("panicked"),
        }
    }
}

/// A feed's value, real or substituted
#[derive(Debug)]
pub struct Fetched<T> {
    pub name: String,
    pub value: T,
    pub status: FeedStatus,
}

/// Per-feed outcome in a cycle report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedReport {
    pub name: String,
    pub status: FeedStatus,
}

impl<T> From<&Fetched<T>> for FeedReport {
    fn from(fetched: &Fetched<T>) -> Self {
        Self {
            name: fetched.name.clone(),
            status: fetched.status.clone(),
        }
    }
}

/// Summary of a completed cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: u64,
    pub id: Uuid,
    pub feeds: Vec<FeedReport>,
    pub total_score: u8,
    pub event_count: usize,
    pub official_alert: bool,
    pub duration: Duration,
}

impl CycleReport {
    /// Feeds that delivered a fallback this cycle
    pub fn degraded(&self) -> usize {
        self.feeds.iter().filter(|f| !f.status.is_live()).count()
    }
}

/// Fetch one feed under a timeout, substituting its fallback on any fault.
///
/// The call runs in its own task so a panicking adapter is contained.
pub async fn fetch_isolated<T: Send + 'static>(feed: SharedFeed<T>, timeout: Duration) -> Fetched<T> {
    let name = feed.name().to_string();
    let task_feed = feed.clone();
    let handle = tokio::spawn(async move { tokio::time::timeout(timeout, task_feed.fetch()).await });

    let status = match handle.await {
        Ok(Ok(Ok(value))) => {
            debug!("Feed {} delivered", name);
            return Fetched {
                name,
                value,
                status: FeedStatus::Live,
            };
        }
        Ok(Ok(Err(e))) => FeedStatus::Failed(e.to_string()),
        Ok(Err(_elapsed)) => FeedStatus::TimedOut,
        Err(_join) => FeedStatus::Panicked,
    };

    warn!("Feed {} {}, using fallback", name, status);
    Fetched {
        name,
        value: feed.fallback(),
        status,
    }
}

/// The six feeds a cycle consults
#[derive(Clone)]
pub struct FeedSet {
    /// Regional bulletin; merged first, so it wins timestamp ties
    pub gsi: SharedFeed<Vec<Event>>,
    pub usgs: SharedFeed<Vec<Event>>,
    pub felt: SharedFeed<FeltReport>,
    pub ionosphere: SharedFeed<IonosphereReading>,
    pub pressure: SharedFeed<PressureReading>,
    pub alert: SharedFeed<AlertStatus>,
}

impl FeedSet {
    /// Build the live adapters
    pub fn from_config(config: &FeedsConfig) -> Result<Self, FeedError> {
        let http = &config.http;
        Ok(Self {
            gsi: Arc::new(GsiFeed::new(config.gsi.clone(), http)?),
            usgs: Arc::new(UsgsFeed::new(config.usgs.clone(), config.region.clone(), http)?),
            felt: Arc::new(EmscFeed::new(config.emsc.clone(), config.region.clone(), http)?),
            ionosphere: Arc::new(NasaFeed::new(config.nasa.clone(), http)?),
            pressure: Arc::new(PressureFeed::new(config.pressure.clone(), http)?),
            alert: Arc::new(AlertFeed::new(config.alert.clone(), http)?),
        })
    }
}

/// Output of a successful computation, not yet published
#[derive(Debug)]
pub struct CycleOutput {
    pub score: CompositeScore,
    pub quakes: Vec<Event>,
    pub feeds: Vec<FeedReport>,
}

/// Everything a cycle needs except the cache; cheap to clone into a task
#[derive(Clone)]
pub struct Pipeline {
    feeds: FeedSet,
    etas: Arc<EtasModel>,
    recurrence: RecurrenceModel,
    feed_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        feeds: FeedSet,
        etas: EtasModel,
        recurrence: RecurrenceModel,
        feed_timeout: Duration,
    ) -> Self {
        Self {
            feeds,
            etas: Arc::new(etas),
            recurrence,
            feed_timeout,
        }
    }

    pub fn etas(&self) -> &EtasModel {
        &self.etas
    }

    /// Fetch, merge, model and score. No side effects.
    pub async fn compute(&self) -> Result<CycleOutput, CycleError> {
        let t = self.feed_timeout;
        let (gsi, usgs, felt, ionosphere, pressure, alert) = futures::join!(
            fetch_isolated(self.feeds.gsi.clone(), t),
            fetch_isolated(self.feeds.usgs.clone(), t),
            fetch_isolated(self.feeds.felt.clone(), t),
            fetch_isolated(self.feeds.ionosphere.clone(), t),
            fetch_isolated(self.feeds.pressure.clone(), t),
            fetch_isolated(self.feeds.alert.clone(), t),
        );

        let feeds = vec![
            FeedReport::from(&gsi),
            FeedReport::from(&usgs),
            FeedReport::from(&felt),
            FeedReport::from(&ionosphere),
            FeedReport::from(&pressure),
            FeedReport::from(&alert),
        ];

        let quakes = merge_events([gsi.value, usgs.value]);

        let now = Utc::now();
        let rate = self.etas.intensity(&quakes, now.timestamp_millis());
        // An infinite rate saturates to 100; only NaN is unusable
        if rate.is_nan() {
            return Err(CycleError::NanIntensity);
        }
        let probability = self.etas.probability(rate);
        debug!("ETAS rate {:.4} -> probability {:.1}%", rate, probability);

        let seismic = SeismicIndicator {
            normalized: probability,
            events48h: quakes.len(),
            baseline: SEISMIC_BASELINE_EVENTS,
            etas_prob: round1(probability),
            max_mag: round1(max_magnitude(&quakes).unwrap_or(0.0)),
        };

        let ionosphere = IonosphereIndicator {
            normalized: ionosphere.value.normalized,
            tec: ionosphere.value.tec,
            tec_anomaly: ionosphere.value.tec_anomaly,
            pressure: pressure.value.display_pressure(),
            pressure_anomaly: pressure.value.anomaly.to_string(),
        };

        let felt_reports = felt.value.simulated_felt_reports;
        let crowd = CrowdIndicator {
            normalized: felt.value.normalized(),
            felt24h: felt_reports,
            felt1h: felt_reports / 10,
            avg: CROWD_AVERAGE_FELT,
        };

        let inputs = ComponentInputs {
            seismic,
            ionosphere,
            time: self.recurrence.indicator(now),
            crowd,
        };

        let mut score = CompositeScore::compute_at(inputs, now)?;

        // Applied last and unconditionally
        if alert.value.active_alert {
            score.apply_official_alert();
        }

        Ok(CycleOutput {
            score,
            quakes,
            feeds,
        })
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Runs cycles and is the only writer of the cache
pub struct Orchestrator {
    pipeline: Pipeline,
    cache: CacheWriter,
    cycle: u64,
}

impl Orchestrator {
    pub fn new(pipeline: Pipeline) -> (Self, CacheReader) {
        let (cache, reader) = score_cache();
        let orchestrator = Self {
            pipeline,
            cache,
            cycle: 0,
        };
        (orchestrator, reader)
    }

    /// Build live feeds and models from configuration
    pub fn from_config(config: &RadarConfig) -> Result<(Self, CacheReader), anyhow::Error> {
        let feeds = FeedSet::from_config(&config.feeds)?;
        let params = EtasParams::load_or_default(config.calibration_path.as_deref());
        let etas = EtasModel::new(params).with_scale_factor(config.etas_scale_factor);

        let pipeline = Pipeline::new(
            feeds,
            etas,
            config.recurrence.clone(),
            config.feed_timeout(),
        );
        Ok(Self::new(pipeline))
    }

    pub fn reader(&self) -> CacheReader {
        self.cache.reader()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Run one cycle and publish its result
    pub async fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        self.cycle += 1;
        let cycle = self.cycle;
        let id = Uuid::new_v4();
        let started = Instant::now();

        debug!("Cycle {} ({}) starting", cycle, id);

        let pipeline = self.pipeline.clone();
        let output = tokio::spawn(async move { pipeline.compute().await })
            .await
            .map_err(|e| CycleError::Panicked(e.to_string()))??;

        let report = CycleReport {
            cycle,
            id,
            feeds: output.feeds,
            total_score: output.score.total_score,
            event_count: output.quakes.len(),
            official_alert: output.score.is_official_alert,
            duration: started.elapsed(),
        };

        self.cache.publish(CacheEntry {
            cycle,
            score: output.score,
            quakes: output.quakes,
        });

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ionosphere, quake, Script, ScriptedFeed, Scripts};
    use radar_core::EventSource;
    use std::sync::atomic::Ordering;

    const FEED_TIMEOUT: Duration = Duration::from_secs(5);
    const HOUR: i64 = 3_600_000;

    fn orchestrator(scripts: Scripts) -> (Orchestrator, CacheReader) {
        let pipeline = Pipeline::new(
            scripts.into_feeds(),
            EtasModel::default(),
            RecurrenceModel::default(),
            FEED_TIMEOUT,
        );
        Orchestrator::new(pipeline)
    }

    fn now_ms() -> i64 {
        Utc::now().timestamp_millis()
    }

    #[tokio::test]
    async fn test_all_fallbacks_no_alert() {
        let (mut orch, reader) = orchestrator(Scripts::all_failing());

        let report = orch.run_cycle().await.unwrap();
        assert_eq!(report.degraded(), 6);

        let entry = reader.read().unwrap();
        let c = &entry.score.components;
        assert_eq!(c.seismic.score, 0);
        assert_eq!(c.ionosphere.score, 0);
        assert_eq!(c.crowd.score, 0);
        // Only the recurrence model contributes: capped at 95 -> 19 of 20
        assert_eq!(c.time.score, 19);
        assert_eq!(entry.score.total_score, 19);
        assert!(!entry.score.is_official_alert);
        assert!(entry.quakes.is_empty());
        assert_eq!(c.ionosphere.indicator.pressure, "1012.0 hPa");
        assert_eq!(c.ionosphere.indicator.tec, "--");
    }

    #[tokio::test]
    async fn test_merged_events_drive_seismic_component() {
        let t = now_ms() - HOUR;
        let scripts = Scripts {
            gsi: Script::Ok(vec![quake(EventSource::Gsi, t, 4.5)]),
            usgs: Script::Ok(vec![
                quake(EventSource::Usgs, t, 4.4),
                quake(EventSource::Usgs, t - 2 * HOUR, 3.0),
            ]),
            ..Default::default()
        };
        let (mut orch, reader) = orchestrator(scripts);

        let report = orch.run_cycle().await.unwrap();
        assert_eq!(report.degraded(), 0);
        assert_eq!(report.event_count, 2);

        let entry = reader.read().unwrap();
        assert_eq!(entry.quakes.len(), 2);
        assert_eq!(entry.quakes[0].source, EventSource::Gsi);

        let seismic = &entry.score.components.seismic;
        assert!(seismic.indicator.normalized > 0.0);
        assert!(seismic.score > 0);
        assert_eq!(seismic.indicator.max_mag, 4.5);
        assert_eq!(seismic.indicator.events48h, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_feed_times_out() {
        let scripts = Scripts {
            felt: Script::Hang,
            ionosphere: Script::Ok(ionosphere(50.0)),
            ..Default::default()
        };
        let (mut orch, reader) = orchestrator(scripts);

        let report = orch.run_cycle().await.unwrap();
        let timed_out: Vec<_> = report
            .feeds
            .iter()
            .filter(|f| f.status == FeedStatus::TimedOut)
            .collect();
        assert_eq!(timed_out.len(), 1);
        assert_eq!(timed_out[0].name, "emsc");
        assert_eq!(report.degraded(), 1);

        let entry = reader.read().unwrap();
        assert_eq!(entry.score.components.ionosphere.score, 15);
        assert_eq!(entry.score.components.crowd.score, 0);
        assert_eq!(entry.score.components.crowd.indicator.felt24h, 0);
    }

    #[tokio::test]
    async fn test_panicking_feed_is_contained() {
        let scripts = Scripts {
            usgs: Script::Panic,
            ..Default::default()
        };
        let (mut orch, reader) = orchestrator(scripts);

        let report = orch.run_cycle().await.unwrap();
        assert!(report
            .feeds
            .iter()
            .any(|f| f.name == "usgs" && f.status == FeedStatus::Panicked));
        assert!(reader.is_warm());
    }

    #[tokio::test]
    async fn test_official_alert_overrides() {
        let scripts = Scripts {
            alert: Script::Ok(AlertStatus {
                active_alert: true,
                data: None,
            }),
            ..Default::default()
        };
        let (mut orch, reader) = orchestrator(scripts);

        let report = orch.run_cycle().await.unwrap();
        assert!(report.official_alert);

        let score = &reader.read().unwrap().score;
        assert_eq!(score.total_score, 100);
        assert!(score.is_official_alert);
        assert_eq!(score.components.seismic.score, 40);
        assert_eq!(score.components.ionosphere.score, 30);
        assert_eq!(score.components.time.score, 20);
        assert_eq!(score.components.crowd.score, 10);
    }

    #[tokio::test]
    async fn test_failed_alert_feed_means_no_alert() {
        let scripts = Scripts {
            alert: Script::Fail,
            ..Default::default()
        };
        let (mut orch, reader) = orchestrator(scripts);

        orch.run_cycle().await.unwrap();
        assert!(!reader.read().unwrap().score.is_official_alert);
    }

    #[tokio::test]
    async fn test_cycle_fault_leaves_cache_unchanged() {
        let good = Scripts {
            gsi: Script::Ok(vec![quake(EventSource::Gsi, now_ms() - HOUR, 3.0)]),
            ..Default::default()
        };
        let (mut orch, reader) = orchestrator(good);
        orch.run_cycle().await.unwrap();
        let before = reader.read().unwrap();

        // Three feeds succeed, then scoring rejects a corrupt reading
        let bad = Scripts {
            gsi: Script::Ok(Vec::new()),
            usgs: Script::Ok(Vec::new()),
            felt: Script::Ok(FeltReport::default()),
            ionosphere: Script::Ok(ionosphere(f64::NAN)),
            ..Default::default()
        };
        orch.pipeline.feeds = bad.into_feeds();

        let err = orch.run_cycle().await.unwrap_err();
        assert!(matches!(err, CycleError::Score(_)));

        let after = reader.read().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.cycle, 1);

        // Next good cycle overwrites
        orch.pipeline.feeds = Scripts::default().into_feeds();
        orch.run_cycle().await.unwrap();
        assert_eq!(reader.read().unwrap().cycle, 3);
        assert!(reader.read().unwrap().quakes.is_empty());
    }

    #[tokio::test]
    async fn test_overflowing_rate_saturates_seismic() {
        let scripts = Scripts {
            gsi: Script::Ok(vec![quake(EventSource::Gsi, now_ms() - HOUR, 800.0)]),
            usgs: Script::Ok(vec![quake(EventSource::Usgs, now_ms() - 2 * HOUR, 3.0)]),
            ..Default::default()
        };
        let (mut orch, reader) = orchestrator(scripts);

        let report = orch.run_cycle().await.unwrap();
        assert_eq!(report.event_count, 2);

        let entry = reader.read().unwrap();
        let seismic = &entry.score.components.seismic;
        assert_eq!(seismic.score, 40);
        assert_eq!(seismic.indicator.normalized, 100.0);
        assert_eq!(seismic.indicator.etas_prob, 100.0);
        assert_eq!(seismic.indicator.max_mag, 800.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_feeds_fetched_concurrently() {
        let slow = |name| {
            ScriptedFeed::new(name, Script::Ok(Vec::<Event>::new()), Vec::new())
                .with_delay(Duration::from_millis(200))
        };
        let gsi = slow("gsi");
        let gsi_calls = gsi.calls.clone();
        let usgs = slow("usgs");
        let mut feeds = Scripts::default().into_feeds();
        feeds.gsi = gsi.shared();
        feeds.usgs = usgs.shared();

        let pipeline = Pipeline::new(
            feeds,
            EtasModel::default(),
            RecurrenceModel::default(),
            FEED_TIMEOUT,
        );
        let started = tokio::time::Instant::now();
        pipeline.compute().await.unwrap();

        // Sequential calls would take 400ms
        assert!(started.elapsed() < Duration::from_millis(400));
        assert_eq!(gsi_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_isolated_fallback() {
        let feed = ScriptedFeed::new("x", Script::Fail, vec![quake(EventSource::Gsi, 1, 2.0)]).shared();
        let fetched = fetch_isolated(feed, FEED_TIMEOUT).await;
        assert!(matches!(fetched.status, FeedStatus::Failed(_)));
        assert_eq!(fetched.value.len(), 1);
    }
}
