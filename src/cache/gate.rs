//! Safety gate.
//!
//! Pure decisions about whether a request may be answered from the cache and
//! whether a rendered response may be written to it. The gate runs twice per
//! miss: once on the inbound request and once on the rendered body together
//! with the cookies the origin set while rendering.

use std::fmt;
use std::sync::LazyLock;

use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use regex::{RegexSet, bytes};
use tracing::warn;
use url::form_urlencoded;

use super::config::CacheConfig;
use super::keys::CacheKey;

/// Path segments that always belong to a visitor-specific flow.
pub const EXCLUDED_SEGMENTS: &[&str] = &[
    "cart",
    "checkout",
    "my-account",
    "account",
    "order-received",
    "order-confirmation",
    "lost-password",
    "wc-api",
];

/// Markers of a request that mutates the cart.
pub const CART_MUTATION_MARKERS: &[&str] = &[
    "add-to-cart",
    "remove_item",
    "undo_item",
    "removed_item",
    "added-to-cart",
];

const PRIVATE_PATH_PREFIXES: &[&str] = &[
    "/wp-admin",
    "/wp-json",
    "/wp-login.php",
    "/wp-cron.php",
    "/xmlrpc.php",
];

const AJAX_ENDPOINT: &str = "admin-ajax.php";
const AJAX_QUERY_PARAM: &str = "wc-ajax";
const AJAX_REQUESTED_WITH: &str = "xmlhttprequest";
const SOURCE: &str = "cache::gate";

/// Closing tag of a complete document, in any case.
pub(crate) static CLOSING_HTML: LazyLock<bytes::Regex> = LazyLock::new(|| {
    bytes::Regex::new(r"(?i)</html>").expect("closing tag pattern is valid")
});

/// Why the gate refused a request or a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Method,
    Authenticated,
    CartNotEmpty,
    ExcludedPath,
    CartMutation,
    PrivateSurface,
    UnrecognizedQuery,
    Status,
    Truncated,
    Personalized,
}

impl Rejection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Method => "method",
            Self::Authenticated => "authenticated",
            Self::CartNotEmpty => "cart_not_empty",
            Self::ExcludedPath => "excluded_path",
            Self::CartMutation => "cart_mutation",
            Self::PrivateSurface => "private_surface",
            Self::UnrecognizedQuery => "unrecognized_query",
            Self::Status => "status",
            Self::Truncated => "truncated",
            Self::Personalized => "personalized",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The parts of a request the gate looks at.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    path: String,
    query: Option<String>,
    cookies: Vec<(String, String)>,
    ajax: bool,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>, query: Option<&str>) -> Self {
        Self {
            method,
            path: path.into(),
            query: query.map(str::to_string),
            cookies: Vec::new(),
            ajax: false,
        }
    }

    /// Build a context from an inbound request head.
    pub fn from_request(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        let mut context = Self::new(method.clone(), uri.path(), uri.query());

        for value in headers.get_all(header::COOKIE) {
            if let Ok(raw) = value.to_str() {
                context.cookies.extend(parse_cookie_header(raw));
            }
        }

        context.ajax = headers
            .get("x-requested-with")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.trim().eq_ignore_ascii_case(AJAX_REQUESTED_WITH));

        context
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    pub fn with_ajax(mut self, ajax: bool) -> Self {
        self.ajax = ajax;
        self
    }

    /// The post-render context: request cookies plus every cookie the
    /// response sets.
    pub fn with_response_cookies(&self, headers: &HeaderMap) -> Self {
        let mut context = self.clone();
        for value in headers.get_all(header::SET_COOKIE) {
            if let Some(cookie) = value.to_str().ok().and_then(parse_set_cookie) {
                context.cookies.push(cookie);
            }
        }
        context
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn cookies(&self) -> &[(String, String)] {
        &self.cookies
    }

    pub fn key(&self) -> CacheKey {
        CacheKey::derive(&self.path, self.query.as_deref())
    }
}

/// Eligibility policy built once from [`CacheConfig`].
///
/// Configured exclusions and body signatures are compiled into regex sets so
/// each request or body is scanned once regardless of how many patterns are
/// configured.
#[derive(Debug, Clone)]
pub struct SafetyGate {
    exclusions: RegexSet,
    auth_cookie_prefixes: Vec<String>,
    session_cookie_prefixes: Vec<String>,
    cart_cookies: Vec<String>,
    body_signatures: bytes::RegexSet,
}

impl SafetyGate {
    pub fn new(config: &CacheConfig) -> Self {
        let exclusions = config
            .exclusions
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(exclusion_pattern)
            .collect::<Vec<_>>();

        let signatures = config
            .body_signatures
            .iter()
            .filter(|signature| !signature.is_empty())
            .map(|signature| format!("(?i){}", regex::escape(signature)))
            .collect::<Vec<_>>();

        Self {
            exclusions: compile_exclusions(exclusions),
            auth_cookie_prefixes: config.auth_cookie_prefixes.clone(),
            session_cookie_prefixes: config.session_cookie_prefixes.clone(),
            cart_cookies: config.cart_cookies.clone(),
            body_signatures: compile_signatures(signatures),
        }
    }

    pub fn may_attempt_cache(&self, ctx: &RequestContext) -> bool {
        self.rejection(ctx).is_none()
    }

    pub fn may_store(&self, body: &[u8], status: StatusCode, ctx: &RequestContext) -> bool {
        self.store_rejection(body, status, ctx).is_none()
    }

    /// First reason the request must bypass the cache, if any.
    pub fn rejection(&self, ctx: &RequestContext) -> Option<Rejection> {
        if ctx.method != Method::GET {
            return Some(Rejection::Method);
        }

        if self.carries_identity(ctx) {
            return Some(Rejection::Authenticated);
        }

        if self.carries_cart(ctx) {
            return Some(Rejection::CartNotEmpty);
        }

        if self.is_excluded_path(&ctx.path) {
            return Some(Rejection::ExcludedPath);
        }

        if is_cart_mutation(ctx) {
            return Some(Rejection::CartMutation);
        }

        if is_private_surface(ctx) {
            return Some(Rejection::PrivateSurface);
        }

        if ctx.key().has_unrecognized_params() {
            return Some(Rejection::UnrecognizedQuery);
        }

        None
    }

    /// First reason a rendered response must not be captured, if any.
    pub fn store_rejection(
        &self,
        body: &[u8],
        status: StatusCode,
        ctx: &RequestContext,
    ) -> Option<Rejection> {
        if status != StatusCode::OK {
            return Some(Rejection::Status);
        }

        if body.is_empty() || !CLOSING_HTML.is_match(body) {
            return Some(Rejection::Truncated);
        }

        if let Some(rejection) = self.rejection(ctx) {
            return Some(rejection);
        }

        if self.body_signatures.is_match(body) {
            return Some(Rejection::Personalized);
        }

        None
    }

    fn carries_identity(&self, ctx: &RequestContext) -> bool {
        ctx.cookies.iter().any(|(name, _)| {
            self.auth_cookie_prefixes
                .iter()
                .chain(self.session_cookie_prefixes.iter())
                .any(|prefix| name.starts_with(prefix.as_str()))
        })
    }

    fn carries_cart(&self, ctx: &RequestContext) -> bool {
        ctx.cookies.iter().any(|(name, value)| {
            let value = value.trim();
            self.cart_cookies.iter().any(|cart| cart == name) && !value.is_empty() && value != "0"
        })
    }

    fn is_excluded_path(&self, path: &str) -> bool {
        let builtin = path.split('/').any(|segment| {
            EXCLUDED_SEGMENTS
                .iter()
                .any(|excluded| excluded.eq_ignore_ascii_case(segment))
        });

        builtin || self.exclusions.is_match(path)
    }
}

fn is_cart_mutation(ctx: &RequestContext) -> bool {
    let path = ctx.path.to_ascii_lowercase();
    let query = ctx.query.as_deref().unwrap_or_default().to_ascii_lowercase();
    CART_MUTATION_MARKERS
        .iter()
        .any(|marker| path.contains(marker) || query.contains(marker))
}

fn is_private_surface(ctx: &RequestContext) -> bool {
    if ctx.ajax {
        return true;
    }

    let path = ctx.path.to_ascii_lowercase();
    if PRIVATE_PATH_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
        || path.contains(AJAX_ENDPOINT)
    {
        return true;
    }

    ctx.query.as_deref().is_some_and(|query| {
        form_urlencoded::parse(query.as_bytes())
            .any(|(name, _)| name.eq_ignore_ascii_case(AJAX_QUERY_PARAM))
    })
}

/// Regex source for one exclusion line. A pattern containing `*` must match
/// the whole path, each `*` standing for any run of characters. A pattern
/// without `*` matches anywhere in the path.
pub fn exclusion_pattern(pattern: &str) -> String {
    if !pattern.contains('*') {
        return regex::escape(pattern);
    }

    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    format!("(?s)^{body}$")
}

fn compile_exclusions(patterns: Vec<String>) -> RegexSet {
    let valid = patterns
        .into_iter()
        .filter(|pattern| match regex::Regex::new(pattern) {
            Ok(_) => true,
            Err(err) => {
                warn!(
                    target = SOURCE,
                    op = "compile_exclusions",
                    pattern = %pattern,
                    error = %err,
                    "Invalid cache exclusion pattern ignored"
                );
                false
            }
        })
        .collect::<Vec<_>>();

    RegexSet::new(&valid).unwrap_or_else(|err| {
        warn!(
            target = SOURCE,
            op = "compile_exclusions",
            error = %err,
            "Failed to build cache exclusions; configured patterns disabled"
        );
        RegexSet::empty()
    })
}

fn compile_signatures(patterns: Vec<String>) -> bytes::RegexSet {
    bytes::RegexSet::new(&patterns).unwrap_or_else(|err| {
        warn!(
            target = SOURCE,
            op = "compile_signatures",
            error = %err,
            "Failed to build personalization signatures; body scan disabled"
        );
        bytes::RegexSet::empty()
    })
}

fn parse_cookie_header(raw: &str) -> impl Iterator<Item = (String, String)> + '_ {
    raw.split(';').filter_map(parse_cookie_pair)
}

fn parse_set_cookie(raw: &str) -> Option<(String, String)> {
    raw.split(';').next().and_then(parse_cookie_pair)
}

fn parse_cookie_pair(pair: &str) -> Option<(String, String)> {
    let pair = pair.trim();
    if pair.is_empty() {
        return None;
    }
    match pair.split_once('=') {
        Some((name, value)) => Some((
            name.trim().to_string(),
            value.trim().trim_matches('"').to_string(),
        )),
        None => Some((pair.to_string(), String::new())),
    }
}
