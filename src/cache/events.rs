//! Cache events.
//!
//! Content mutations the cache must react to. Events arrive as tagged JSON
//! through the admin API and are dispatched synchronously.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A received event with an identity for logs and responses.
#[derive(Debug, Clone)]
pub struct CacheEvent {
    /// Unique identifier (UUIDv4).
    pub id: Uuid,
    /// The type of cache event.
    pub kind: EventKind,
    /// When the event was received.
    pub received_at: OffsetDateTime,
}

impl CacheEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            received_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Types of content mutations that trigger invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// A post, page or catalog item was published or updated.
    ContentPublished {
        url: String,
        #[serde(default)]
        listing_urls: Vec<String>,
    },
    /// Stock level of a catalog item changed.
    StockChanged {
        url: String,
        #[serde(default)]
        listing_urls: Vec<String>,
    },
    /// The storefront theme changed; every page renders differently.
    ThemeSwitched,
    /// A navigation menu was edited; every page carries it.
    NavigationEdited,
    /// Operator asked for a full flush.
    ClearAll,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContentPublished { .. } => "content_published",
            Self::StockChanged { .. } => "stock_changed",
            Self::ThemeSwitched => "theme_switched",
            Self::NavigationEdited => "navigation_edited",
            Self::ClearAll => "clear_all",
        }
    }
}
