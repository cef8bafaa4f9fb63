use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{redirect, Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::aggregator::FetchLimits;
use crate::error::ConfigError;
use crate::fetcher::ItemPolicy;

const APP_DIR: &str = "news-ingest";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub feeds: Vec<String>,
    pub request_period_minutes: u64,
    pub request_timeout_seconds: Option<u64>,
    pub max_concurrent_fetches: Option<usize>,
    pub item_policy: ItemPolicy,
    pub store_path: Option<PathBuf>,
    pub user_agent: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            feeds: Vec::new(),
            request_period_minutes: 5,
            request_timeout_seconds: Some(30),
            max_concurrent_fetches: None,
            item_policy: ItemPolicy::AbortFeed,
            store_path: None,
            user_agent: concat!("news-ingest/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl IngestConfig {
    /// Directory holding the config file and the default store.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Parses a config document. Feed urls that do not parse are dropped
    /// with a warning; the remaining feeds are kept.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: IngestConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Like [`from_file`](Self::from_file), but a missing file yields the
    /// defaults. A file that exists and fails to parse is still an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match Self::from_file(path) {
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        if self.request_period_minutes == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        self.feeds.retain(|feed| match url::Url::parse(feed) {
            Ok(_) => true,
            Err(e) => {
                warn!(url = %feed, error = %e, "ignoring invalid feed url");
                false
            }
        });
        Ok(())
    }

    /// Wait between cycles, never shorter than one minute.
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.request_period_minutes.max(1).saturating_mul(60))
    }

    pub fn limits(&self) -> FetchLimits {
        FetchLimits {
            max_concurrent_fetches: self.max_concurrent_fetches,
            request_timeout: self.request_timeout_seconds.map(Duration::from_secs),
        }
    }

    pub fn store_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.store_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("news.json")),
        }
    }

    pub fn build_client(&self) -> Result<Client, ConfigError> {
        let client = ClientBuilder::new()
            .redirect(redirect::Policy::limited(5))
            .user_agent(self.user_agent.as_str())
            .build()?;
        Ok(client)
    }
}
