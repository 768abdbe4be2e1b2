//! Vitrine page cache.
//!
//! Stores fully rendered storefront pages on local disk and serves them to
//! anonymous visitors:
//!
//! - **keys**: request path + query to a stable SHA-256 key and sharded path
//! - **gate**: the safety policy deciding what may be served and stored
//! - **store**: the on-disk entries with TTL expiry and atomic writes
//! - **events / planner / trigger**: content mutations to invalidation
//!
//! ## Configuration
//!
//! Cache behavior is controlled via `vitrine.toml`:
//!
//! ```toml
//! [cache]
//! enabled = true
//! directory = "cache/pages"
//! ttl_seconds = 3600
//! exclusions = "/private/*"
//! # ... see config.rs for all options
//! ```

mod config;
mod events;
mod gate;
mod keys;
mod lock;
mod middleware;
mod planner;
mod store;
mod trigger;

pub use config::{
    CacheConfig, DEFAULT_AUTH_COOKIE_PREFIXES, DEFAULT_BODY_SIGNATURES, DEFAULT_CART_COOKIES,
    DEFAULT_SESSION_COOKIE_PREFIXES,
};
pub use events::{CacheEvent, EventKind};
pub use gate::{
    CART_MUTATION_MARKERS, EXCLUDED_SEGMENTS, Rejection, RequestContext, SafetyGate,
    exclusion_pattern,
};
pub use keys::{CacheKey, TRACKING_PARAMS, is_tracking_param};
pub use middleware::{CACHE_STATUS_HEADER, CacheState, response_cache_layer};
pub use planner::InvalidationPlan;
pub use store::{
    CacheStatsSnapshot, CacheStoreError, CachedPage, CleanupAction, CleanupLogEntry, HTACCESS,
    INDEX_STUB, ResponseStore, annotate, annotation, format_timestamp,
};
pub use trigger::{CacheTrigger, DispatchOutcome, FlushObserver};

pub(crate) use middleware::METRIC_CACHE_BYPASS;
pub(crate) use store::{
    METRIC_CACHE_FLUSH, METRIC_CACHE_HIT, METRIC_CACHE_INVALIDATE, METRIC_CACHE_MISS,
    METRIC_CACHE_STORE, METRIC_CACHE_STORE_SKIPPED,
};
