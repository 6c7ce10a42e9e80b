//! trailmark - record and browse GPS tracking sessions
//!
//! Wires together:
//! - Configuration loading
//! - The SQLite-backed session history
//! - A replay location provider feeding the tracking core
//!
//! and exposes them as subcommands.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use trailmark_api::{TrackerEvent, TrackingSession};
use trailmark_config::{load_config_or_default, Config, CURRENT_CONFIG_VERSION};
use trailmark_core::Tracker;
use trailmark_location::{load_track, ReplayProvider};
use trailmark_store::{KeyValueStore, SessionStore, SqliteKv};
use trailmark_util::{
    default_config_path, format_datetime, format_distance, format_duration_millis, format_time,
    SessionId, DATABASE_FILENAME,
};

/// trailmark - GPS session tracker
#[derive(Parser, Debug)]
#[command(name = "trailmark", version)]
#[command(about = "Record and browse GPS tracking sessions", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/trailmark/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set TRAILMARK_DATA_DIR env var)
    #[arg(short, long, env = "TRAILMARK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Track a recorded GPS trace as if it were live, then save the session
    Replay {
        /// JSON array of {latitude, longitude, timestamp?} fixes
        track: PathBuf,

        /// Delay between fixes in milliseconds (default: deliver all at once)
        #[arg(long)]
        pace_ms: Option<u64>,
    },

    /// Browse or edit saved sessions
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Validate the configuration file and print the effective settings
    CheckConfig,
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// List saved sessions, most recent first
    List,

    /// Show one session
    Show {
        id: String,

        /// Print the stored record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete one session
    Delete { id: String },

    /// Delete every session
    Clear,
}

fn load_settings(args: &Args) -> Result<Config> {
    let mut config = load_config_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    if let Some(data_dir) = &args.data_dir {
        config.storage.data_dir = data_dir.clone();
    }

    Ok(config)
}

fn open_kv(data_dir: &Path) -> Result<Arc<dyn KeyValueStore>> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    let db_path = data_dir.join(DATABASE_FILENAME);
    let kv = SqliteKv::open(&db_path)
        .with_context(|| format!("Failed to open database {:?}", db_path))?;

    info!(db_path = %db_path.display(), "Store initialized");
    Ok(Arc::new(kv))
}

async fn run_replay(config: &Config, track: &Path, pace_ms: Option<u64>) -> Result<()> {
    let samples =
        load_track(track).with_context(|| format!("Failed to load track {:?}", track))?;

    let mut provider = ReplayProvider::new(samples);
    if let Some(ms) = pace_ms {
        provider = provider.with_pace(Duration::from_millis(ms));
    }
    info!(track = %track.display(), fixes = provider.track_len(), "Track loaded");

    let kv = open_kv(&config.storage.data_dir)?;
    let mut tracker = Tracker::open(Arc::new(provider), kv, config);

    tracker
        .request_permission()
        .await
        .context("Location permission request failed")?;
    tracker.start().await.context("Failed to start tracking")?;

    loop {
        tokio::select! {
            event = tracker.process_next_sample() => match event {
                Some(TrackerEvent::PointRecorded { point, distance, point_count, .. }) => {
                    let elapsed = tracker
                        .current_session()
                        .map(|s| s.stats_at(point.timestamp))
                        .map(|stats| (stats.duration, stats.average_speed))
                        .unwrap_or_default();
                    println!(
                        "{:>4}  {}  {:>10.6} {:>11.6}  {:>9}  {:>9}  {:.2} m/s",
                        point_count,
                        format_time(point.timestamp),
                        point.latitude,
                        point.longitude,
                        format_distance(distance),
                        format_duration_millis(elapsed.0),
                        elapsed.1,
                    );
                }
                Some(other) => debug!(event = ?other, "Ignoring event"),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping early");
                break;
            }
        }
    }

    let Some(session) = tracker.stop().await else {
        warn!("Tracking ended without a session");
        return Ok(());
    };

    println!();
    print_summary(&session);
    if session.has_path() && tracker.store().get(&session.id).is_some() {
        println!("Saved as {}", session.id);
    } else if session.has_path() {
        anyhow::bail!("Session {} could not be saved", session.id);
    } else {
        println!("No points recorded; session discarded");
    }

    Ok(())
}

fn print_summary(session: &TrackingSession) {
    println!("Session   {}", session.id);
    println!("Started   {}", format_datetime(session.start_time));
    if let Some(end_time) = session.end_time {
        println!("Ended     {}", format_datetime(end_time));
    }
    if let Some(duration) = session.duration {
        println!("Duration  {}", format_duration_millis(duration));
    }
    println!("Distance  {}", format_distance(session.distance));
    println!("Points    {}", session.path.len());
    if let Some(stats) = session.stats() {
        println!("Avg speed {:.2} m/s", stats.average_speed);
    }
}

fn run_history(config: &Config, action: &HistoryAction) -> Result<()> {
    let kv = open_kv(&config.storage.data_dir)?;
    let mut store = SessionStore::new(kv, config.storage.storage_key.clone());
    store.load();

    if store.load_failed() {
        warn!("Saved history could not be read; changes are disabled");
    }

    match action {
        HistoryAction::List => {
            if store.load_failed() {
                anyhow::bail!("Saved history could not be read");
            }
            if store.is_empty() {
                println!("No saved sessions");
                return Ok(());
            }
            for session in store.sessions() {
                println!(
                    "{}  {}  {:>9}  {:>10}  {} pts",
                    session.id,
                    format_datetime(session.start_time),
                    format_duration_millis(session.duration.unwrap_or_default()),
                    format_distance(session.distance),
                    session.path.len(),
                );
            }
        }
        HistoryAction::Show { id, json } => {
            let id = SessionId::from(id.as_str());
            let session = store
                .get(&id)
                .with_context(|| format!("No session with id {}", id))?;

            if *json {
                println!("{}", serde_json::to_string_pretty(session)?);
            } else {
                print_summary(session);
            }
        }
        HistoryAction::Delete { id } => {
            let id = SessionId::from(id.as_str());
            let removed = store
                .delete(&id)
                .with_context(|| format!("Failed to delete session {}", id))?;

            if removed {
                println!("Deleted {}", id);
            } else {
                println!("No session with id {}", id);
            }
        }
        HistoryAction::Clear => {
            let count = store.len();
            store.delete_all().context("Failed to clear sessions")?;
            println!("Deleted {} session(s)", count);
        }
    }

    Ok(())
}

fn run_check_config(args: &Args, config: &Config) -> Result<()> {
    if args.config.exists() {
        println!("✓ Configuration is valid: {}", args.config.display());
    } else {
        println!("No configuration file at {}; using defaults", args.config.display());
    }

    let sampling = &config.tracking.sampling;
    println!();
    println!("Summary:");
    println!("  Config version: {}", CURRENT_CONFIG_VERSION);
    println!("  Accuracy: {:?}", sampling.accuracy);
    println!("  Min interval: {} ms", sampling.min_interval.as_millis());
    println!("  Min distance: {} m", sampling.min_distance_m);
    println!("  Distance mode: {:?}", config.tracking.distance_mode);
    println!("  Data directory: {}", config.storage.data_dir.display());
    println!("  Storage key: {}", config.storage.storage_key);

    let kv = open_kv(&config.storage.data_dir)?;
    let mut store = SessionStore::new(kv, config.storage.storage_key.clone());
    store.load();

    println!();
    println!("Storage:");
    println!(
        "  Database: {}",
        if store.is_healthy() { "ok" } else { "unavailable" }
    );
    if store.load_failed() {
        println!("  History: unreadable");
    } else {
        println!("  History: {} session(s)", store.len());
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    debug!(version = env!("CARGO_PKG_VERSION"), "trailmark starting");

    if trailmark_util::is_mock_time_active() {
        warn!("Mock time is active; timestamps are not real");
    }

    let config = load_settings(&args)?;

    match &args.command {
        Command::Replay { track, pace_ms } => run_replay(&config, track, *pace_ms).await,
        Command::History { action } => run_history(&config, action),
        Command::CheckConfig => run_check_config(&args, &config),
    }
}
