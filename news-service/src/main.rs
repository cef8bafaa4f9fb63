use std::path::PathBuf;
use std::process::ExitCode;

use news_core::{Aggregator, FeedFetcher, IngestConfig, JsonFileStore, Scheduler};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config_path = config_path();
    let config = match IngestConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, path = %config_path.display(), "failed to load config");
            return ExitCode::FAILURE;
        }
    };
    if config.feeds.is_empty() {
        warn!(path = %config_path.display(), "no feeds configured");
    }

    let client = match config.build_client() {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to build HTTP client");
            return ExitCode::FAILURE;
        }
    };

    let store_path = match config.store_path() {
        Ok(path) => path,
        Err(e) => {
            error!(error = %e, "no location for the news store");
            return ExitCode::FAILURE;
        }
    };
    let store = match JsonFileStore::load_from(&store_path).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, path = %store_path.display(), "failed to open news store");
            return ExitCode::FAILURE;
        }
    };
    info!(path = %store.path().display(), posts = store.len().await, "news store opened");

    let fetcher = FeedFetcher::new(client).with_policy(config.item_policy);
    let aggregator = Aggregator::new(fetcher, config.feeds.clone(), config.limits());
    let scheduler = Scheduler::new(aggregator, store, config.period());

    let worker = tokio::spawn(scheduler.run());

    if let Err(e) = shutdown_signal().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutdown requested");
    worker.abort();
    let _ = worker.await;

    ExitCode::SUCCESS
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn config_path() -> PathBuf {
    if let Some(arg) = std::env::args_os().nth(1) {
        return PathBuf::from(arg);
    }
    IngestConfig::default_path().unwrap_or_else(|_| {
        let mut dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        dir.push(".news-ingest.json");
        dir
    })
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
