use std::sync::Arc;

use anyhow::{Context, Result};
use notification_service::{NotificationConfig, TelegramClient};
use scan_engine::{AccountScanner, ScanScheduler, TenantSweep};
use shadowban_core::{Notifier, WatchlistStore};
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use watchlist_store::SqliteWatchlistStore;

mod commands;
mod config;
mod poller;

use commands::CommandHandler;
use config::BotConfig;
use poller::Poller;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter()).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter()).init();
    }

    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));

    tracing::info!("Starting shadowban watch bot");

    let config = BotConfig::from_env()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Database: {}", config.database_url);
    tracing::info!("  Status site: {}", config.base_url);
    tracing::info!("  Fetch backend: {:?}", config.fetcher.backend);
    tracing::info!("  Fetch timeout: {}s", config.fetch_timeout.as_secs());
    tracing::info!("  Scheduled scans: {}", config.schedule_label());
    tracing::info!(
        "  Max concurrent sweeps: {}",
        config.schedule.max_concurrent_sweeps
    );

    let store: Arc<dyn WatchlistStore> = Arc::new(
        SqliteWatchlistStore::connect(&config.database_url)
            .await
            .context("Failed to open watchlist database")?,
    );

    let fetcher =
        page_fetcher::build_fetcher(&config.fetcher).context("Failed to build page fetcher")?;
    tracing::info!("Page fetcher ready ({})", fetcher.name());

    let telegram = Arc::new(
        TelegramClient::new(&NotificationConfig::new(config.bot_token.clone()))
            .context("Failed to build Telegram client")?,
    );
    let notifier: Arc<dyn Notifier> = telegram.clone();

    let scanner = Arc::new(
        AccountScanner::new(fetcher, config.base_url.clone()).with_timeout(config.fetch_timeout),
    );
    let sweep = Arc::new(TenantSweep::new(
        Arc::clone(&store),
        Arc::clone(&scanner),
        Arc::clone(&notifier),
    ));
    let scheduler = Arc::new(ScanScheduler::new(
        Arc::clone(&store),
        sweep,
        config.schedule.clone(),
    ));
    let handler = Arc::new(CommandHandler::new(
        store,
        scanner,
        notifier,
        config.schedule_label(),
    ));

    // Graceful shutdown (SIGINT + SIGTERM) fanned out to every loop
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut sigterm = tokio::signal::unix::signal(SignalKind::terminate())?;
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received SIGINT");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM");
            }
        }
        let _ = shutdown_tx.send(true);
    });

    let scheduler_task = tokio::spawn(scheduler.run_until(shutdown_signal(shutdown_rx.clone())));

    Poller::new(telegram, handler)
        .run(shutdown_signal(shutdown_rx))
        .await;

    if let Err(e) = scheduler_task.await {
        tracing::error!("Scheduler task failed: {}", e);
    }

    tracing::info!("Shadowban watch bot stopped");
    Ok(())
}

async fn shutdown_signal(mut rx: watch::Receiver<bool>) {
    // A dropped sender also means shutdown.
    let _ = rx.wait_for(|stop| *stop).await;
}
