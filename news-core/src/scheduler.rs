use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use crate::aggregator::Aggregator;
use crate::store::NewsStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// What happened during one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    pub fetched: usize,
    pub stored: bool,
}

/// Drives ingestion cycles one after another.
///
/// The wait between cycles starts once the previous cycle has finished
/// writing, so a slow cycle pushes the next one back.
pub struct Scheduler<S> {
    aggregator: Aggregator,
    store: S,
    period: Duration,
    state: watch::Sender<SchedulerState>,
}

impl<S: NewsStore> Scheduler<S> {
    pub fn new(aggregator: Aggregator, store: S, period: Duration) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self {
            aggregator,
            store,
            period,
            state,
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn run_cycle(&mut self) -> CycleSummary {
        self.state.send_replace(SchedulerState::Running);

        let batch = self.aggregator.collect().await;
        let stored = match self.store.write_news(&batch).await {
            Ok(()) => true,
            Err(err) => {
                error!(error = %err, posts = batch.len(), "failed to write posts to store");
                false
            }
        };

        self.state.send_replace(SchedulerState::Idle);
        CycleSummary {
            fetched: batch.len(),
            stored,
        }
    }

    /// Runs cycles forever. Stop it by dropping or aborting the task that
    /// polls this future.
    pub async fn run(mut self) {
        info!(
            feeds = self.aggregator.urls().len(),
            period = ?self.period,
            "news scheduler started"
        );
        loop {
            let summary = self.run_cycle().await;
            info!(
                fetched = summary.fetched,
                stored = summary.stored,
                next_in = ?self.period,
                "ingestion cycle finished"
            );
            tokio::time::sleep(self.period).await;
        }
    }
}
