//! Operator entry point: resolve settings, wire backends, run the batch,
//! report totals.

mod config;

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use fares::{
    run_batch, EngineConfig, FsStore, NoopNotifier, Notifier, TelegramNotifier, WebDriverBrowser,
};

use crate::config::{Args, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::resolve(Args::parse())?;
    tracing::info!(
        urls = settings.urls.len(),
        workers = settings.workers,
        webdriver = %settings.webdriver_url,
        snapshot_dir = %settings.snapshot_dir.display(),
        "Starting watcher run"
    );

    let engine_config = EngineConfig::default().with_alert_threshold(settings.alert_threshold);
    let store = Arc::new(FsStore::new(&settings.snapshot_dir));
    let notifier: Arc<dyn Notifier> = match TelegramNotifier::from_env() {
        Ok(telegram) => Arc::new(telegram),
        Err(e) => {
            tracing::warn!(error = %e, "Telegram not configured; alerts disabled");
            Arc::new(NoopNotifier)
        }
    };

    let endpoint = settings.webdriver_url.clone();
    let totals = run_batch(
        settings.urls,
        settings.workers,
        move |_worker| {
            let endpoint = endpoint.clone();
            async move { WebDriverBrowser::connect(&endpoint).await }
        },
        store,
        notifier,
        engine_config,
    )
    .await;

    println!(
        "Processed {} URLs: {} flights saved, {} alerts sent, {} queries failed",
        totals.urls_processed, totals.flights_saved, totals.alerts_sent, totals.queries_failed
    );

    if !totals.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
