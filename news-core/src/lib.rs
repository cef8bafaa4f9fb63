pub mod aggregator;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod normalize;
pub mod scheduler;
pub mod store;

pub use aggregator::{Aggregator, FeedReport, FetchLimits};
pub use config::IngestConfig;
pub use error::{ConfigError, FeedError, MalformedDateError, StoreError};
pub use fetcher::{FeedFetcher, ItemPolicy};
pub use models::{Post, RawItem};
pub use normalize::normalize;
pub use scheduler::{CycleSummary, Scheduler, SchedulerState};
pub use store::{JsonFileStore, MemoryStore, NewsStore};
