//! Cache configuration.
//!
//! Controls the on-disk page cache and the safety gate via `vitrine.toml`.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DIRECTORY: &str = "cache/pages";
const DEFAULT_TTL_SECS: u64 = 3600;
const DEFAULT_BODY_LIMIT_BYTES: usize = 4 * 1024 * 1024;

pub const DEFAULT_AUTH_COOKIE_PREFIXES: &[&str] = &["wordpress_logged_in_", "wp-postpass_"];
pub const DEFAULT_SESSION_COOKIE_PREFIXES: &[&str] = &["wp_woocommerce_session_"];
pub const DEFAULT_CART_COOKIES: &[&str] = &["woocommerce_items_in_cart", "woocommerce_cart_hash"];
pub const DEFAULT_BODY_SIGNATURES: &[&str] = &[
    "woocommerce-mini-cart-item",
    "mini_cart_item",
    "id=\"wpadminbar\"",
];

/// Page cache configuration, constructed once and threaded into the store,
/// the gate and the middleware.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Serve and capture pages at all.
    pub enabled: bool,
    /// Root directory of the entry tree.
    pub directory: PathBuf,
    /// Maximum entry age before it is discarded on read.
    pub ttl: Duration,
    /// Rendered bodies larger than this are passed through uncached.
    pub body_limit_bytes: usize,
    /// Newline-delimited exclusion patterns; `*` is a wildcard.
    pub exclusions: String,
    /// Cookie name prefixes that mark an authenticated visitor.
    pub auth_cookie_prefixes: Vec<String>,
    /// Cookie name prefixes that mark a visitor-specific session.
    pub session_cookie_prefixes: Vec<String>,
    /// Cookies whose non-empty, non-zero value means the cart has items.
    pub cart_cookies: Vec<String>,
    /// Body fragments that only appear in personalized renders.
    pub body_signatures: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            exclusions: String::new(),
            auth_cookie_prefixes: owned(DEFAULT_AUTH_COOKIE_PREFIXES),
            session_cookie_prefixes: owned(DEFAULT_SESSION_COOKIE_PREFIXES),
            cart_cookies: owned(DEFAULT_CART_COOKIES),
            body_signatures: owned(DEFAULT_BODY_SIGNATURES),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            directory: settings.directory.clone(),
            ttl: settings.ttl,
            body_limit_bytes: settings.body_limit_bytes.get(),
            exclusions: settings.exclusions.clone(),
            auth_cookie_prefixes: settings.auth_cookie_prefixes.clone(),
            session_cookie_prefixes: settings.session_cookie_prefixes.clone(),
            cart_cookies: settings.cart_cookies.clone(),
            body_signatures: settings.body_signatures.clone(),
        }
    }
}

impl CacheConfig {
    /// Configuration rooted at `directory`, everything else default.
    pub fn at(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Default::default()
        }
    }
}

pub(crate) fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
