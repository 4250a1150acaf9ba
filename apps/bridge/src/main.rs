//! haptic-bridge: drives a haptic suit from F1 UDP telemetry.

mod config;
mod session;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use haptic_ingest_core::TelemetrySource;
use haptic_ingest_f1::F1Source;
use haptic_playlist::{Actuator, MemoryActuator, Playlist};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::BridgeConfig;
use session::BridgeSession;

#[derive(Parser)]
#[command(name = "haptic-bridge", version)]
#[command(about = "Turns racing telemetry into haptic feedback")]
struct Cli {
    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for F1 telemetry and drive the haptic assets
    Run {
        /// UDP address to listen on
        #[arg(long)]
        bind: Option<String>,
        /// Directory holding the haptic assets
        #[arg(long)]
        assets: Option<PathBuf>,
        /// Record decoded frames to this NDJSON file
        #[arg(long)]
        record: Option<PathBuf>,
    },
    /// Feed a recorded capture through the pumps
    Replay {
        capture: PathBuf,
        #[arg(long)]
        assets: Option<PathBuf>,
        /// Write every classified event to this CSV file
        #[arg(long)]
        events_csv: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut cfg = match &cli.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };

    match cli.command {
        Commands::Run { bind, assets, record } => {
            if let Some(bind) = bind {
                cfg.bind_addr = bind;
            }
            if let Some(assets) = assets {
                cfg.assets_dir = assets;
            }
            if record.is_some() {
                cfg.record_path = record;
            }
            run(cfg).await
        }
        Commands::Replay { capture, assets, events_csv } => {
            if let Some(assets) = assets {
                cfg.assets_dir = assets;
            }
            replay(cfg, capture, events_csv)
        }
    }
}

fn actuator() -> Arc<dyn Actuator> {
    warn!("no device backend linked, driving the in-memory actuator");
    Arc::new(MemoryActuator::new())
}

fn load_playlist(cfg: &BridgeConfig) -> Result<Arc<Playlist>> {
    let playlist = Playlist::load(actuator(), &cfg.assets_dir, &cfg.asset_extension)
        .with_context(|| format!("load assets from {}", cfg.assets_dir.display()))?;
    if playlist.is_empty() {
        warn!(dir = %cfg.assets_dir.display(), "no haptic assets found");
    }
    Ok(Arc::new(playlist))
}

async fn run(cfg: BridgeConfig) -> Result<()> {
    let playlist = load_playlist(&cfg)?;
    let (sinks, session) = BridgeSession::start(playlist, cfg.channel_capacity, cfg.record_path.clone())?;
    let source = F1Source::new(cfg.f1());

    let result = tokio::select! {
        r = source.run(sinks) => r.context("F1 source"),
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, shutting down");
            Ok(())
        }
    };

    // the source future (and with it the sinks) is gone, so the pumps drain and exit
    tokio::task::spawn_blocking(move || session.finish()).await?;
    result
}

fn replay(cfg: BridgeConfig, capture: PathBuf, events_csv: Option<PathBuf>) -> Result<()> {
    let frames = iox::import_ndjson(&capture)?;
    let playlist = load_playlist(&cfg)?;
    let rows = session::replay(playlist.clone(), &frames);
    info!(frames = frames.len(), events = rows.len(), "replay finished");
    if let Some(path) = events_csv {
        iox::export_events_csv(&rows, &path)?;
        info!(path = %path.display(), "events written");
    }
    playlist.shutdown();
    Ok(())
}
