//! Periodic cycle driver
//!
//! Runs the first cycle once the startup delay has passed, then one per
//! interval. Cycles run inline in the loop, so a slow cycle delays the
//! next tick instead of overlapping it.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::Orchestrator;

/// Scheduler timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub interval: Duration,
    pub startup_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(120),
            startup_delay: Duration::from_secs(2),
        }
    }
}

/// Handle to a running scheduler
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop scheduling. An in-progress cycle finishes first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!("Scheduler task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Start driving the orchestrator in the background
pub fn spawn_scheduler(orchestrator: Orchestrator, config: SchedulerConfig) -> SchedulerHandle {
    let (shutdown, rx) = watch::channel(false);
    let task = tokio::spawn(run(orchestrator, config, rx));
    SchedulerHandle { shutdown, task }
}

async fn run(mut orchestrator: Orchestrator, config: SchedulerConfig, mut shutdown: watch::Receiver<bool>) {
    info!(
        "Scheduler starting in {:?}, refreshing every {:?}",
        config.startup_delay, config.interval
    );

    tokio::select! {
        biased;
        _ = shutdown.changed() => {
            info!("Scheduler stopped before first cycle");
            return;
        }
        _ = tokio::time::sleep(config.startup_delay) => {}
    }

    let mut ticker = interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        // Shutdown wins over a tick that became ready during a long cycle
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        match orchestrator.run_cycle().await {
            Ok(report) => {
                info!(
                    "Cycle {} published: score {}{}, {} events, {}/{} feeds live, {:?}",
                    report.cycle,
                    report.total_score,
                    if report.official_alert { " (official alert)" } else { "" },
                    report.event_count,
                    report.feeds.len() - report.degraded(),
                    report.feeds.len(),
                    report.duration
                );
            }
            Err(e) => {
                error!("Cycle failed, keeping previous result: {}", e);
            }
        }
    }

    info!("Scheduler stopped");
}
