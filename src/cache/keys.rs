//! Cache key derivation.
//!
//! Turns a request path plus query string into a stable [`CacheKey`] and the
//! sharded location of its entry under the cache root.

use std::path::PathBuf;

use sha2::{Digest, Sha256};
use url::{Url, form_urlencoded};

/// Attribution parameters that never change the rendered page.
///
/// They are dropped before hashing so campaign links share one entry with the
/// plain URL. Every other parameter is kept and flags the key as ineligible.
pub const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "utm_id",
    "gclid",
    "fbclid",
    "msclkid",
    "dclid",
    "mc_cid",
    "mc_eid",
    "_ga",
    "_gl",
];

/// Stable identity of one cached page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    normalized: String,
    digest: String,
    unrecognized: bool,
}

impl CacheKey {
    /// Derive a key from a raw request path and query string.
    pub fn derive(path: &str, query: Option<&str>) -> Self {
        let path = if path.is_empty() { "/" } else { path };

        let mut kept: Vec<(String, String)> = query
            .map(|raw| {
                form_urlencoded::parse(raw.as_bytes())
                    .filter(|(name, _)| !is_tracking_param(name))
                    .map(|(name, value)| (name.into_owned(), value.into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        kept.sort();

        let normalized = if kept.is_empty() {
            path.to_string()
        } else {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&kept)
                .finish();
            format!("{path}?{query}")
        };

        Self {
            digest: hash_normalized(&normalized),
            unrecognized: !kept.is_empty(),
            normalized,
        }
    }

    /// Derive a key from either an absolute URL or a site-relative path.
    pub fn from_url(raw: &str) -> Self {
        match Url::parse(raw) {
            Ok(url) if url.has_host() => Self::derive(url.path(), url.query()),
            _ => match raw.split_once('?') {
                Some((path, query)) => Self::derive(path, Some(query)),
                None => Self::derive(raw, None),
            },
        }
    }

    /// Normalized `path[?query]` the digest was computed from.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Lowercase hex SHA-256 of the normalized URL.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// True when a non-tracking query parameter survived normalization.
    pub fn has_unrecognized_params(&self) -> bool {
        self.unrecognized
    }

    /// Entry location relative to the cache root: `ab/cd/abcd….html`.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(&self.digest[0..2])
            .join(&self.digest[2..4])
            .join(format!("{}.html", self.digest))
    }
}

pub fn is_tracking_param(name: &str) -> bool {
    TRACKING_PARAMS
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(name))
}

fn hash_normalized(normalized: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_params_do_not_change_key() {
        let plain = CacheKey::derive("/product/widget/", None);
        let tracked = CacheKey::derive(
            "/product/widget/",
            Some("utm_source=news&utm_campaign=spring&gclid=abc"),
        );
        let partially = CacheKey::derive("/product/widget/", Some("fbclid=1"));

        assert_eq!(plain, tracked);
        assert_eq!(plain, partially);
        assert!(!tracked.has_unrecognized_params());
    }

    #[test]
    fn tracking_params_match_case_insensitively() {
        let plain = CacheKey::derive("/shop/", None);
        let shouting = CacheKey::derive("/shop/", Some("UTM_SOURCE=x"));
        assert_eq!(plain, shouting);
    }

    #[test]
    fn unknown_params_are_kept_and_flagged() {
        let key = CacheKey::derive("/shop/", Some("utm_medium=x&page=2&color=red"));
        assert!(key.has_unrecognized_params());
        assert_eq!(key.normalized(), "/shop/?color=red&page=2");
    }

    #[test]
    fn parameter_order_does_not_matter() {
        let first = CacheKey::derive("/shop/", Some("a=1&b=2"));
        let second = CacheKey::derive("/shop/", Some("b=2&a=1"));
        assert_eq!(first.digest(), second.digest());
    }

    #[test]
    fn distinct_paths_produce_distinct_digests() {
        let first = CacheKey::derive("/shop/", None);
        let second = CacheKey::derive("/shop", None);
        assert_ne!(first.digest(), second.digest());
    }

    #[test]
    fn empty_path_is_root() {
        assert_eq!(CacheKey::derive("", None), CacheKey::derive("/", None));
    }

    #[test]
    fn relative_path_is_sharded_by_digest_prefix() {
        let key = CacheKey::derive("/", None);
        let digest = key.digest().to_string();
        assert_eq!(digest.len(), 64);

        let expected = PathBuf::from(&digest[0..2])
            .join(&digest[2..4])
            .join(format!("{digest}.html"));
        assert_eq!(key.relative_path(), expected);
    }

    #[test]
    fn from_url_accepts_absolute_and_relative_forms() {
        let absolute = CacheKey::from_url("https://shop.example/product/widget/?utm_source=x");
        let relative = CacheKey::from_url("/product/widget/");
        let relative_tracked = CacheKey::from_url("/product/widget/?utm_term=y");

        assert_eq!(absolute, relative);
        assert_eq!(relative, relative_tracked);
    }
}
