//! Cache prewarming.
//!
//! Discovers every cacheable storefront URL and drives it through the page
//! cache in small, rate-limited batches so visitors rarely meet a cold miss.
//! Progress lives in a JSON state file and survives restarts.

mod config;
mod enumerator;
mod error;
mod fetch;
mod job;
mod scheduler;

pub use config::PrewarmConfig;
pub use enumerator::UrlEnumerator;
pub use error::PrewarmError;
pub use fetch::{FetchError, HttpFetcher, PageFetcher};
pub use job::{PrewarmJob, PrewarmStateFile, PrewarmStatus};
pub use scheduler::{PendingAction, PrewarmScheduler, PrewarmSnapshot};

pub(crate) use scheduler::{METRIC_PREWARM_FETCH, METRIC_PREWARM_TICK_MS};
