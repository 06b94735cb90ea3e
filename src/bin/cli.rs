//! CLI binary for alertsync.

use alertsync::config::AlertConfig;
use alertsync::feed::{HttpFeed, RemoteFeed};
use alertsync::notify::{FixedLocation, GeoPoint, LocationProvider, LogSink, NoLocation};
use alertsync::scheduler::{PermissionFlag, TriggerConfig, run_with_retries};
use alertsync::store::{FileSeenStore, SeenStore};
use alertsync::surface::{BroadcastRefresher, SummarySurface};
use alertsync::sync::Outcome;
use alertsync::{RenderingNotifier, SyncEngine, TriggerCoordinator, app_dirs};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// alertsync: deduplicated notifications for nearby time-boxed alerts.
#[derive(Parser)]
#[command(name = "alertsync", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Poll the feed on the periodic and exact-time paths until Ctrl+C.
    Run,

    /// Run a single sync fire (with retries) and exit.
    Once,

    /// List delivered alert identities, oldest first.
    Seen,

    /// Clear the delivered alert identities.
    Forget,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    let _log_guard = init_tracing(&config);

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::Once => once(config).await,
        Command::Seen => list_seen(&config),
        Command::Forget => forget(&config),
    }
}

/// Explicit path, else the default config file if present, else defaults.
fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AlertConfig> {
    let config = match path {
        Some(path) => AlertConfig::from_file(path)?,
        None => {
            let default_path = app_dirs::config_file();
            if default_path.is_file() {
                AlertConfig::from_file(&default_path)?
            } else {
                AlertConfig::default()
            }
        }
    };
    config.validate()?;
    Ok(config)
}

fn init_tracing(config: &AlertConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("alertsync=info"));

    let (file_layer, guard) = if config.logging.file {
        let appender = tracing_appender::rolling::daily(app_dirs::logs_dir(), "alertsync.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    guard
}

fn open_store(config: &AlertConfig) -> Arc<FileSeenStore> {
    Arc::new(FileSeenStore::with_capacity(
        config.seen_store_path(),
        config.store.max_seen,
    ))
}

fn build_engine(
    config: &AlertConfig,
    feed: Arc<dyn RemoteFeed>,
    refresher: &BroadcastRefresher,
) -> SyncEngine {
    let location: Arc<dyn LocationProvider> =
        match (config.notify.home_latitude, config.notify.home_longitude) {
            (Some(lat), Some(lon)) => Arc::new(FixedLocation(GeoPoint::new(lat, lon))),
            _ => Arc::new(NoLocation),
        };
    let notifier = RenderingNotifier::new(Arc::new(LogSink))
        .with_location(location)
        .with_config(&config.notify);

    SyncEngine::new(feed, open_store(config), Arc::new(notifier))
        .with_refresher(Arc::new(refresher.clone()))
        .with_max_retries(config.sync.max_retries)
}

async fn run(config: AlertConfig) -> anyhow::Result<()> {
    println!("alertsync v{}", env!("CARGO_PKG_VERSION"));

    let feed: Arc<dyn RemoteFeed> = Arc::new(HttpFeed::new(&config.feed)?);
    let refresher = BroadcastRefresher::new();
    let engine = Arc::new(build_engine(&config, feed.clone(), &refresher));

    // No platform permission on the desktop: the exact path is always allowed.
    let coordinator = TriggerCoordinator::new(
        engine,
        Arc::new(PermissionFlag::new(true)),
        TriggerConfig::from(&config),
    );

    let cancel = CancellationToken::new();
    let surface = Arc::new(SummarySurface::new(feed));
    let mut summaries = surface.subscribe();
    let surface_task = surface.spawn(refresher.subscribe(), cancel.clone());
    let summary_cancel = cancel.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = summary_cancel.cancelled() => break,
                changed = summaries.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let summary = summaries.borrow_and_update().clone();
                    for row in &summary.rows {
                        info!(title = %row.title, subtitle = %row.subtitle, "active alert");
                    }
                    info!(rows = summary.rows.len(), updated_at = %summary.updated_at, "summary refreshed");
                }
            }
        }
    });

    let _initial_fire = coordinator.start();
    println!(
        "Polling {} every {}s. Press Ctrl+C to stop.",
        config.feed.url, config.schedule.periodic_interval_secs
    );

    tokio::signal::ctrl_c().await?;
    info!("received Ctrl+C, shutting down...");
    coordinator.shutdown();
    cancel.cancel();
    let _ = surface_task.await;
    Ok(())
}

async fn once(config: AlertConfig) -> anyhow::Result<()> {
    let feed: Arc<dyn RemoteFeed> = Arc::new(HttpFeed::new(&config.feed)?);
    let engine = build_engine(&config, feed, &BroadcastRefresher::new());
    let outcome = run_with_retries(
        &engine,
        config.sync.retry_backoff(),
        &CancellationToken::new(),
    )
    .await;

    println!("{outcome}");
    if outcome == Outcome::Fail {
        anyhow::bail!("sync failed after {} attempts", engine.max_retries());
    }
    Ok(())
}

fn list_seen(config: &AlertConfig) -> anyhow::Result<()> {
    let store = open_store(config);
    let seen = store.get()?;
    for id in seen.iter() {
        println!("{id}");
    }
    eprintln!("{} of {} identities ({})", seen.len(), store.capacity(), store.path().display());
    Ok(())
}

fn forget(config: &AlertConfig) -> anyhow::Result<()> {
    let store = open_store(config);
    store.clear()?;
    println!("Cleared {}", store.path().display());
    Ok(())
}
