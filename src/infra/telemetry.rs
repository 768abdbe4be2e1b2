use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::cache::{
    METRIC_CACHE_BYPASS, METRIC_CACHE_FLUSH, METRIC_CACHE_HIT, METRIC_CACHE_INVALIDATE,
    METRIC_CACHE_MISS, METRIC_CACHE_STORE, METRIC_CACHE_STORE_SKIPPED,
};
use crate::config::{LogFormat, LoggingSettings};
use crate::prewarm::{METRIC_PREWARM_FETCH, METRIC_PREWARM_TICK_MS};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_CACHE_HIT,
            Unit::Count,
            "Total number of pages served from the disk cache."
        );
        describe_counter!(
            METRIC_CACHE_MISS,
            Unit::Count,
            "Total number of cacheable requests without a fresh entry."
        );
        describe_counter!(
            METRIC_CACHE_BYPASS,
            Unit::Count,
            "Total number of requests the safety gate kept away from the cache."
        );
        describe_counter!(
            METRIC_CACHE_STORE,
            Unit::Count,
            "Total number of rendered pages written to the cache."
        );
        describe_counter!(
            METRIC_CACHE_STORE_SKIPPED,
            Unit::Count,
            "Total number of rendered pages not stored, labelled by reason."
        );
        describe_counter!(
            METRIC_CACHE_INVALIDATE,
            Unit::Count,
            "Total number of cache entries removed by targeted invalidation."
        );
        describe_counter!(
            METRIC_CACHE_FLUSH,
            Unit::Count,
            "Total number of full cache flushes."
        );
        describe_counter!(
            METRIC_PREWARM_FETCH,
            Unit::Count,
            "Total number of prewarm fetches, labelled by outcome."
        );
        describe_histogram!(
            METRIC_PREWARM_TICK_MS,
            Unit::Milliseconds,
            "Prewarm tick latency in milliseconds."
        );
    });
}
