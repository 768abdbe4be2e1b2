//! Invalidation planning.
//!
//! The static dispatch table from event kind to cache action.

use std::collections::HashSet;
use std::fmt;

use super::events::EventKind;

/// What a single event does to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationPlan {
    /// Remove these entries, in order, without duplicates.
    Urls(Vec<String>),
    /// Remove everything.
    Flush,
}

impl fmt::Display for InvalidationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Urls(urls) => write!(f, "InvalidationPlan {{ urls: {} }}", urls.len()),
            Self::Flush => f.write_str("InvalidationPlan { flush }"),
        }
    }
}

impl InvalidationPlan {
    /// Plan the cache work for `kind`. `home` is the storefront home path.
    pub fn from_event(kind: &EventKind, home: &str) -> Self {
        match kind {
            EventKind::ContentPublished { url, listing_urls }
            | EventKind::StockChanged { url, listing_urls } => {
                let mut seen = HashSet::new();
                let urls = std::iter::once(url.as_str())
                    .chain(std::iter::once(home))
                    .chain(listing_urls.iter().map(String::as_str))
                    .filter(|candidate| !candidate.trim().is_empty())
                    .filter(|candidate| seen.insert(*candidate))
                    .map(str::to_string)
                    .collect();
                Self::Urls(urls)
            }
            EventKind::ThemeSwitched | EventKind::NavigationEdited | EventKind::ClearAll => {
                Self::Flush
            }
        }
    }

    pub fn is_flush(&self) -> bool {
        matches!(self, Self::Flush)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn published_content_invalidates_url_home_and_listings() {
        let plan = InvalidationPlan::from_event(
            &EventKind::ContentPublished {
                url: "/blog/launch/".to_string(),
                listing_urls: vec!["/blog/".to_string(), "/".to_string(), "/blog/".to_string()],
            },
            "/",
        );

        assert_eq!(
            plan,
            InvalidationPlan::Urls(vec![
                "/blog/launch/".to_string(),
                "/".to_string(),
                "/blog/".to_string(),
            ])
        );
    }

    #[test]
    fn stock_change_is_scoped_to_item() {
        let plan = InvalidationPlan::from_event(
            &EventKind::StockChanged {
                url: "/product/widget/".to_string(),
                listing_urls: vec!["/shop/".to_string()],
            },
            "/",
        );
        assert_eq!(
            plan,
            InvalidationPlan::Urls(vec![
                "/product/widget/".to_string(),
                "/".to_string(),
                "/shop/".to_string(),
            ])
        );
    }

    #[test]
    fn sitewide_events_flush() {
        for kind in [
            EventKind::ThemeSwitched,
            EventKind::NavigationEdited,
            EventKind::ClearAll,
        ] {
            let plan = InvalidationPlan::from_event(&kind, "/");
            assert!(plan.is_flush(), "{kind:?}");
            assert_eq!(plan.to_string(), "InvalidationPlan { flush }");
        }
    }
}
