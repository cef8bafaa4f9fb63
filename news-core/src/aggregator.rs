use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};

use crate::error::FeedError;
use crate::fetcher::FeedFetcher;
use crate::models::Post;

/// Bounds applied to the per-cycle fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchLimits {
    /// `None` fetches every feed at once.
    pub max_concurrent_fetches: Option<usize>,
    /// `None` waits for the transport however long it takes.
    pub request_timeout: Option<Duration>,
}

/// The result of fetching one feed during a cycle.
#[derive(Debug)]
pub struct FeedReport {
    pub url: String,
    pub outcome: Result<Vec<Post>, FeedError>,
}

pub struct Aggregator {
    fetcher: Arc<FeedFetcher>,
    urls: Vec<String>,
    limits: FetchLimits,
}

impl Aggregator {
    pub fn new(fetcher: FeedFetcher, urls: Vec<String>, limits: FetchLimits) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            urls,
            limits,
        }
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Fetches every configured feed concurrently and returns one report per
    /// feed, in completion order.
    pub async fn gather(&self) -> Vec<FeedReport> {
        let (report_tx, mut report_rx) = mpsc::channel(self.urls.len().max(1));
        let permits = self
            .limits
            .max_concurrent_fetches
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));

        for (index, url) in self.urls.iter().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let permits = permits.clone();
            let report_tx = report_tx.clone();
            let url = url.clone();
            let timeout = self.limits.request_timeout;

            tokio::spawn(async move {
                let _permit = match permits {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                let outcome = fetch_with_timeout(&fetcher, &url, timeout).await;
                let report = FeedReport { url, outcome };
                if report_tx.send((index, report)).await.is_err() {
                    warn!("feed report receiver dropped");
                }
            });
        }
        drop(report_tx);

        let mut reported = vec![false; self.urls.len()];
        let mut reports = Vec::with_capacity(self.urls.len());
        while reports.len() < self.urls.len() {
            match report_rx.recv().await {
                Some((index, report)) => {
                    reported[index] = true;
                    reports.push(report);
                }
                None => break,
            }
        }

        // A task that panicked drops its sender without reporting.
        for (url, _) in self.urls.iter().zip(reported).filter(|(_, done)| !done) {
            reports.push(FeedReport {
                url: url.clone(),
                outcome: Err(FeedError::Task { url: url.clone() }),
            });
        }

        reports
    }

    /// Runs [`gather`](Self::gather) and merges the successful feeds into a
    /// single batch. Failed feeds are logged and contribute nothing.
    pub async fn collect(&self) -> Vec<Post> {
        let reports = self.gather().await;
        let mut batch = Vec::new();
        let mut failed = 0usize;

        for report in reports {
            match report.outcome {
                Ok(posts) => batch.extend(posts),
                Err(err) => {
                    failed += 1;
                    warn!(url = %report.url, error = %err, "failed to read feed");
                }
            }
        }

        info!(
            feeds = self.urls.len(),
            failed,
            posts = batch.len(),
            "feeds aggregated"
        );
        batch
    }
}

async fn fetch_with_timeout(
    fetcher: &FeedFetcher,
    url: &str,
    timeout: Option<Duration>,
) -> Result<Vec<Post>, FeedError> {
    match timeout {
        Some(after) => tokio::time::timeout(after, fetcher.fetch(url))
            .await
            .unwrap_or_else(|_| {
                Err(FeedError::Timeout {
                    url: url.to_owned(),
                    after,
                })
            }),
        None => fetcher.fetch(url).await,
    }
}
