//! Settings resolution: CLI flags layered over environment variables.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// Track flight-search prices and alert on significant drops.
#[derive(Parser, Debug)]
#[command(name = "watcher")]
pub struct Args {
    /// Search-result URLs to process
    pub urls: Vec<String>,

    /// File with one search URL per line (# comments allowed)
    #[arg(long)]
    pub urls_file: Option<PathBuf>,

    /// Worker pool size (env: WORKER_COUNT)
    #[arg(long)]
    pub workers: Option<usize>,

    /// WebDriver endpoint (env: WEBDRIVER_URL)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Snapshot directory (env: SNAPSHOT_DIR)
    #[arg(long)]
    pub snapshot_dir: Option<PathBuf>,

    /// Alert threshold as a fraction of the previous price
    /// (env: TELEGRAM_ALERT_THRESHOLD)
    #[arg(long)]
    pub alert_threshold: Option<f64>,
}

/// Fully resolved run settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub urls: Vec<String>,
    pub workers: usize,
    pub webdriver_url: String,
    pub snapshot_dir: PathBuf,
    pub alert_threshold: f64,
}

impl Settings {
    /// Resolve flags over env vars over defaults.
    pub fn resolve(args: Args) -> Result<Self> {
        let mut urls = args.urls;
        if let Some(path) = &args.urls_file {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading URL file {}", path.display()))?;
            urls.extend(
                contents
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty() && !line.starts_with('#'))
                    .map(str::to_string),
            );
        }
        anyhow::ensure!(!urls.is_empty(), "no search URLs given");

        let workers = match args.workers {
            Some(workers) => workers,
            None => env_parsed("WORKER_COUNT")?.unwrap_or(fares::DEFAULT_WORKERS),
        };
        let webdriver_url = args
            .webdriver_url
            .or_else(|| std::env::var("WEBDRIVER_URL").ok())
            .unwrap_or_else(|| "http://localhost:9515".to_string());
        let snapshot_dir = args
            .snapshot_dir
            .or_else(|| std::env::var("SNAPSHOT_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("snapshots"));
        let alert_threshold = match args.alert_threshold {
            Some(threshold) => threshold,
            None => env_parsed("TELEGRAM_ALERT_THRESHOLD")?.unwrap_or(0.01),
        };

        Ok(Self {
            urls,
            workers,
            webdriver_url,
            snapshot_dir,
            alert_threshold,
        })
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("parsing env var {key}={raw}")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_args(urls: Vec<String>) -> Args {
        Args {
            urls,
            urls_file: None,
            workers: None,
            webdriver_url: None,
            snapshot_dir: None,
            alert_threshold: None,
        }
    }

    #[test]
    fn test_defaults_apply() {
        let settings =
            Settings::resolve(bare_args(vec!["https://www.google.com/travel".to_string()]))
                .unwrap();
        assert_eq!(settings.workers, fares::DEFAULT_WORKERS);
        assert_eq!(settings.alert_threshold, 0.01);
        assert_eq!(settings.webdriver_url, "http://localhost:9515");
    }

    #[test]
    fn test_empty_url_set_is_rejected() {
        assert!(Settings::resolve(bare_args(Vec::new())).is_err());
    }

    #[test]
    fn test_flags_win() {
        let mut args = bare_args(vec!["https://www.google.com/travel".to_string()]);
        args.workers = Some(2);
        args.alert_threshold = Some(0.05);
        let settings = Settings::resolve(args).unwrap();
        assert_eq!(settings.workers, 2);
        assert_eq!(settings.alert_threshold, 0.05);
    }
}
