use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed publication date: {value:?}")]
pub struct MalformedDateError {
    pub value: String,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("network error fetching {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("feed parsing error for {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: rss::Error,
    },
    #[error("item in {url} rejected: {source}")]
    MalformedDate {
        url: String,
        #[source]
        source: MalformedDateError,
    },
    #[error("fetching {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },
    #[error("fetch task for {url} ended without reporting")]
    Task { url: String },
}

impl FeedError {
    pub fn url(&self) -> &str {
        match self {
            FeedError::Fetch { url, .. }
            | FeedError::Parse { url, .. }
            | FeedError::MalformedDate { url, .. }
            | FeedError::Timeout { url, .. }
            | FeedError::Task { url } => url,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("store backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("request_period_minutes must be at least 1")]
    ZeroPeriod,
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("no configuration directory available")]
    NoConfigDir,
}
