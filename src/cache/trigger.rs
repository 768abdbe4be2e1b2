//! Cache trigger service.
//!
//! Executes invalidation plans against the store and tells interested
//! parties when the whole cache was flushed.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::events::{CacheEvent, EventKind};
use super::planner::InvalidationPlan;
use super::store::ResponseStore;

/// Notified after a full flush completes.
#[async_trait]
pub trait FlushObserver: Send + Sync {
    async fn cache_flushed(&self);
}

/// Result of dispatching one event.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    pub event_id: Uuid,
    pub kind: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub received_at: OffsetDateTime,
    pub flushed: bool,
    pub removed: usize,
}

/// Cache trigger for content-mutation events.
///
/// ```ignore
/// // After a product's stock level changed:
/// trigger.stock_changed("/product/widget/", vec!["/shop/".into()]).await;
/// ```
#[derive(Clone)]
pub struct CacheTrigger {
    store: Arc<ResponseStore>,
    home_path: String,
    observer: Option<Arc<dyn FlushObserver>>,
}

impl CacheTrigger {
    pub fn new(store: Arc<ResponseStore>) -> Self {
        Self {
            store,
            home_path: "/".to_string(),
            observer: None,
        }
    }

    /// Path of the storefront home page, invalidated with every content
    /// change. Defaults to `/`.
    pub fn with_home_path(mut self, home_path: impl Into<String>) -> Self {
        self.home_path = home_path.into();
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn FlushObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn store(&self) -> &Arc<ResponseStore> {
        &self.store
    }

    /// Plan and execute `kind`. Returns once the affected files are gone.
    pub async fn dispatch(&self, kind: EventKind) -> DispatchOutcome {
        let event = CacheEvent::new(kind);
        let plan = InvalidationPlan::from_event(&event.kind, &self.home_path);

        let removed = match &plan {
            InvalidationPlan::Urls(urls) => {
                let mut removed = 0;
                for url in urls {
                    if self.store.invalidate_url(url).await {
                        removed += 1;
                    }
                }
                removed
            }
            InvalidationPlan::Flush => self.store.invalidate_all().await,
        };

        let elapsed = OffsetDateTime::now_utc() - event.received_at;
        info!(
            target = "cache::trigger",
            event_id = %event.id,
            event_kind = event.kind.as_str(),
            plan = %plan,
            removed,
            elapsed_ms = elapsed.whole_milliseconds() as i64,
            "cache event dispatched"
        );

        if plan.is_flush()
            && let Some(observer) = &self.observer
        {
            observer.cache_flushed().await;
        }

        DispatchOutcome {
            event_id: event.id,
            kind: event.kind.as_str(),
            received_at: event.received_at,
            flushed: plan.is_flush(),
            removed,
        }
    }

    pub async fn content_published(&self, url: &str, listing_urls: Vec<String>) -> DispatchOutcome {
        self.dispatch(EventKind::ContentPublished {
            url: url.to_string(),
            listing_urls,
        })
        .await
    }

    pub async fn stock_changed(&self, url: &str, listing_urls: Vec<String>) -> DispatchOutcome {
        self.dispatch(EventKind::StockChanged {
            url: url.to_string(),
            listing_urls,
        })
        .await
    }

    pub async fn theme_switched(&self) -> DispatchOutcome {
        self.dispatch(EventKind::ThemeSwitched).await
    }

    pub async fn navigation_edited(&self) -> DispatchOutcome {
        self.dispatch(EventKind::NavigationEdited).await
    }

    pub async fn clear_all(&self) -> DispatchOutcome {
        self.dispatch(EventKind::ClearAll).await
    }
}
