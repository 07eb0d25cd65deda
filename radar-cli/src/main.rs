//! Seismic Radar CLI
//!
//! Composite seismic-risk score for Israel and the Dead Sea Transform.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use radar_api::AppState;
use radar_core::{EtasModel, EtasParams};
use radar_runtime::{spawn_scheduler, Orchestrator, RadarConfig};

#[derive(Parser)]
#[command(name = "seismic-radar")]
#[command(author, version, about = "Seismic Radar: composite seismic-risk score service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,

    /// TOML configuration file
    #[arg(short, long, global = true, env = "RADAR_CONFIG")]
    config: Option<PathBuf>,

    /// ETAS calibration JSON (overrides the config file)
    #[arg(long, global = true, env = "RADAR_CALIBRATION")]
    calibration: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler and HTTP API until Ctrl-C
    Serve {
        /// Address to bind, e.g. 0.0.0.0:3000
        #[arg(short, long, env = "RADAR_BIND")]
        bind: Option<String>,

        /// Seconds between refresh cycles
        #[arg(long)]
        interval: Option<u64>,

        /// Per-feed timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Run a single cycle and print the score
    Once {
        /// Per-feed timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Also print the merged event list
        #[arg(long)]
        quakes: bool,
    },

    /// Print the effective ETAS parameters
    Params,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let mut config = load_config(cli.config.as_deref())?;
    if cli.calibration.is_some() {
        config.calibration_path = cli.calibration;
    }

    match cli.command {
        Commands::Serve {
            bind,
            interval,
            timeout,
        } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            if let Some(interval) = interval {
                config.refresh_interval_secs = interval;
            }
            if let Some(timeout) = timeout {
                config.feed_timeout_secs = timeout;
            }
            config.validate()?;
            serve(config).await?;
        }
        Commands::Once { timeout, quakes } => {
            if let Some(timeout) = timeout {
                config.feed_timeout_secs = timeout;
            }
            config.validate()?;
            run_once(config, quakes).await?;
        }
        Commands::Params => {
            show_params(&config)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<RadarConfig> {
    match path {
        Some(path) => RadarConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(RadarConfig::default()),
    }
}

async fn serve(config: RadarConfig) -> Result<()> {
    let (orchestrator, reader) = Orchestrator::from_config(&config)?;
    let scheduler = spawn_scheduler(orchestrator, config.scheduler());

    radar_api::serve(AppState::new(reader), &config.bind_addr, shutdown_signal())
        .await
        .with_context(|| format!("HTTP server on {} failed", config.bind_addr))?;

    info!("Stopping scheduler");
    scheduler.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        return;
    }
    info!("Shutdown requested");
}

async fn run_once(config: RadarConfig, show_quakes: bool) -> Result<()> {
    let (mut orchestrator, reader) = Orchestrator::from_config(&config)?;
    let report = orchestrator.run_cycle().await?;

    for feed in &report.feeds {
        eprintln!("  {:<10} {}", feed.name, feed.status);
    }
    eprintln!(
        "📊 Score {} from {} events in {:?}{}",
        report.total_score,
        report.event_count,
        report.duration,
        if report.official_alert { " 🚨 official alert" } else { "" }
    );

    let entry = reader
        .read()
        .context("Cycle completed but nothing was published")?;
    println!("{}", serde_json::to_string_pretty(&entry.score)?);
    if show_quakes {
        println!("{}", serde_json::to_string_pretty(&entry.quake_list())?);
    }

    Ok(())
}

fn show_params(config: &RadarConfig) -> Result<()> {
    let params = EtasParams::load_or_default(config.calibration_path.as_deref());
    let model = EtasModel::new(params).with_scale_factor(config.etas_scale_factor);

    println!("{}", serde_json::to_string_pretty(model.params())?);
    println!("scale factor: {}", model.scale_factor());
    Ok(())
}
