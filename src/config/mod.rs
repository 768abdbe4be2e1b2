//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    num::{NonZeroU64, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::cache::{
    DEFAULT_AUTH_COOKIE_PREFIXES, DEFAULT_BODY_SIGNATURES, DEFAULT_CART_COOKIES,
    DEFAULT_SESSION_COOKIE_PREFIXES,
};

mod cli;

pub use cli::{
    CacheDirectoryOverride, CatalogOverrides, CliArgs, Command, EnumerateArgs, FlushArgs,
    ServeArgs, ServeOverrides,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "vitrine";
const ENV_PREFIX: &str = "VITRINE";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_ADMIN_HOST: &str = "127.0.0.1";
const DEFAULT_PUBLIC_PORT: u16 = 8080;
const DEFAULT_ADMIN_PORT: u16 = 8081;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_ORIGIN_URL: &str = "http://127.0.0.1:3000/";
const DEFAULT_ORIGIN_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ORIGIN_MAX_REQUEST_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_CACHE_DIR: &str = "cache/pages";
const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_CACHE_BODY_LIMIT_BYTES: u64 = 4 * 1024 * 1024;
const DEFAULT_PREWARM_BATCH_SIZE: u64 = 5;
const DEFAULT_PREWARM_REQUEST_DELAY_MS: u64 = 500;
const DEFAULT_PREWARM_TICK_DELAY_SECS: u64 = 5;
const DEFAULT_PREWARM_COOLDOWN_SECS: u64 = 3600;
const DEFAULT_PREWARM_CADENCE_SECS: u64 = 60;
const DEFAULT_PREWARM_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PREWARM_STATE_FILE: &str = "cache/prewarm-state.json";
const DEFAULT_CATALOG_MANIFEST: &str = "config/catalog.toml";

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub origin: OriginSettings,
    pub cache: CacheSettings,
    pub prewarm: PrewarmSettings,
    pub catalog: CatalogSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub public_addr: SocketAddr,
    pub admin_addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct OriginSettings {
    pub url: Url,
    pub timeout: Duration,
    pub max_request_bytes: NonZeroU64,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub directory: PathBuf,
    pub ttl: Duration,
    pub body_limit_bytes: NonZeroUsize,
    pub exclusions: String,
    pub auth_cookie_prefixes: Vec<String>,
    pub session_cookie_prefixes: Vec<String>,
    pub cart_cookies: Vec<String>,
    pub body_signatures: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PrewarmSettings {
    pub auto_enabled: bool,
    pub batch_size: NonZeroUsize,
    pub request_delay: Duration,
    pub tick_delay: Duration,
    pub cooldown: Duration,
    pub cadence: Duration,
    pub fetch_timeout: Duration,
    pub state_file: PathBuf,
    /// Where prewarm requests are sent; the public listener when unset.
    pub base_url: Url,
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub manifest: PathBuf,
    /// Public storefront URL permalinks are resolved against.
    pub site_url: Url,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Flush(args)) => raw.apply_cache_directory_override(&args.cache),
        Some(Command::Enumerate(args)) => raw.apply_catalog_overrides(&args.catalog),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    origin: RawOriginSettings,
    cache: RawCacheSettings,
    prewarm: RawPrewarmSettings,
    catalog: RawCatalogSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(host) = overrides.server_admin_host.as_ref() {
            self.server.admin_host = Some(host.clone());
        }
        if let Some(port) = overrides.public_port {
            self.server.public_port = Some(port);
        }
        if let Some(port) = overrides.admin_port {
            self.server.admin_port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.origin_url.as_ref() {
            self.origin.url = Some(url.clone());
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
        if let Some(ttl) = overrides.cache_ttl_seconds {
            self.cache.ttl_seconds = Some(ttl);
        }
        if let Some(auto) = overrides.prewarm_auto {
            self.prewarm.auto_enabled = Some(auto);
        }
        if let Some(path) = overrides.prewarm_state_file.as_ref() {
            self.prewarm.state_file = Some(path.clone());
        }
        if let Some(url) = overrides.prewarm_base_url.as_ref() {
            self.prewarm.base_url = Some(url.clone());
        }

        self.apply_cache_directory_override(&overrides.cache);
        self.apply_catalog_overrides(&overrides.catalog);
    }

    fn apply_cache_directory_override(&mut self, overrides: &CacheDirectoryOverride) {
        if let Some(directory) = overrides.cache_directory.as_ref() {
            self.cache.directory = Some(directory.clone());
        }
    }

    fn apply_catalog_overrides(&mut self, overrides: &CatalogOverrides) {
        if let Some(path) = overrides.catalog_manifest.as_ref() {
            self.catalog.manifest = Some(path.clone());
        }
        if let Some(url) = overrides.catalog_site_url.as_ref() {
            self.catalog.site_url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            origin,
            cache,
            prewarm,
            catalog,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let origin = build_origin_settings(origin)?;
        let cache = build_cache_settings(cache)?;
        let prewarm = build_prewarm_settings(prewarm, server.public_addr)?;
        let catalog = build_catalog_settings(catalog, &origin.url)?;

        Ok(Self {
            server,
            logging,
            origin,
            cache,
            prewarm,
            catalog,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let admin_host = server
        .admin_host
        .unwrap_or_else(|| DEFAULT_ADMIN_HOST.to_string());

    let public_port = server.public_port.unwrap_or(DEFAULT_PUBLIC_PORT);
    if public_port == 0 {
        return Err(LoadError::invalid(
            "server.public_port",
            "port must be greater than zero",
        ));
    }

    let admin_port = server.admin_port.unwrap_or(DEFAULT_ADMIN_PORT);
    if admin_port == 0 {
        return Err(LoadError::invalid(
            "server.admin_port",
            "port must be greater than zero",
        ));
    }

    let public_addr = parse_socket_addr(&host, public_port)
        .map_err(|reason| LoadError::invalid("server.public_addr", reason))?;
    let admin_addr = parse_socket_addr(&admin_host, admin_port)
        .map_err(|reason| LoadError::invalid("server.admin_addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        public_addr,
        admin_addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_origin_settings(origin: RawOriginSettings) -> Result<OriginSettings, LoadError> {
    let url = parse_http_url(
        origin.url.as_deref().unwrap_or(DEFAULT_ORIGIN_URL),
        "origin.url",
    )?;

    let timeout_secs = origin.timeout_seconds.unwrap_or(DEFAULT_ORIGIN_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "origin.timeout_seconds",
            "must be greater than zero",
        ));
    }

    let max_request_bytes = NonZeroU64::new(
        origin
            .max_request_bytes
            .unwrap_or(DEFAULT_ORIGIN_MAX_REQUEST_BYTES),
    )
    .ok_or_else(|| LoadError::invalid("origin.max_request_bytes", "must be greater than zero"))?;

    Ok(OriginSettings {
        url,
        timeout: Duration::from_secs(timeout_secs),
        max_request_bytes,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let directory = cache
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid("cache.directory", "must not be empty"));
    }

    let ttl_secs = cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS);
    if ttl_secs == 0 {
        return Err(LoadError::invalid(
            "cache.ttl_seconds",
            "must be greater than zero",
        ));
    }

    let body_limit_bytes = non_zero_usize(
        cache
            .body_limit_bytes
            .unwrap_or(DEFAULT_CACHE_BODY_LIMIT_BYTES),
        "cache.body_limit_bytes",
    )?;

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        directory,
        ttl: Duration::from_secs(ttl_secs),
        body_limit_bytes,
        exclusions: cache.exclusions.unwrap_or_default(),
        auth_cookie_prefixes: list_or_default(
            cache.auth_cookie_prefixes,
            DEFAULT_AUTH_COOKIE_PREFIXES,
        ),
        session_cookie_prefixes: list_or_default(
            cache.session_cookie_prefixes,
            DEFAULT_SESSION_COOKIE_PREFIXES,
        ),
        cart_cookies: list_or_default(cache.cart_cookies, DEFAULT_CART_COOKIES),
        body_signatures: list_or_default(cache.body_signatures, DEFAULT_BODY_SIGNATURES),
    })
}

fn build_prewarm_settings(
    prewarm: RawPrewarmSettings,
    public_addr: SocketAddr,
) -> Result<PrewarmSettings, LoadError> {
    let batch_size = non_zero_usize(
        prewarm.batch_size.unwrap_or(DEFAULT_PREWARM_BATCH_SIZE),
        "prewarm.batch_size",
    )?;

    let tick_delay_secs = prewarm
        .tick_delay_seconds
        .unwrap_or(DEFAULT_PREWARM_TICK_DELAY_SECS);
    if tick_delay_secs == 0 {
        return Err(LoadError::invalid(
            "prewarm.tick_delay_seconds",
            "must be greater than zero",
        ));
    }

    let cadence_secs = prewarm
        .cadence_seconds
        .unwrap_or(DEFAULT_PREWARM_CADENCE_SECS);
    if cadence_secs == 0 {
        return Err(LoadError::invalid(
            "prewarm.cadence_seconds",
            "must be greater than zero",
        ));
    }

    let fetch_timeout_secs = prewarm
        .fetch_timeout_seconds
        .unwrap_or(DEFAULT_PREWARM_FETCH_TIMEOUT_SECS);
    if fetch_timeout_secs == 0 {
        return Err(LoadError::invalid(
            "prewarm.fetch_timeout_seconds",
            "must be greater than zero",
        ));
    }

    let state_file = prewarm
        .state_file
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PREWARM_STATE_FILE));
    if state_file.as_os_str().is_empty() {
        return Err(LoadError::invalid("prewarm.state_file", "must not be empty"));
    }

    let base_url = match prewarm.base_url.as_deref() {
        Some(value) => parse_http_url(value, "prewarm.base_url")?,
        None => local_url(public_addr, "prewarm.base_url")?,
    };

    Ok(PrewarmSettings {
        auto_enabled: prewarm.auto_enabled.unwrap_or(false),
        batch_size,
        request_delay: Duration::from_millis(
            prewarm
                .request_delay_ms
                .unwrap_or(DEFAULT_PREWARM_REQUEST_DELAY_MS),
        ),
        tick_delay: Duration::from_secs(tick_delay_secs),
        cooldown: Duration::from_secs(
            prewarm
                .cooldown_seconds
                .unwrap_or(DEFAULT_PREWARM_COOLDOWN_SECS),
        ),
        cadence: Duration::from_secs(cadence_secs),
        fetch_timeout: Duration::from_secs(fetch_timeout_secs),
        state_file,
        base_url,
    })
}

fn build_catalog_settings(
    catalog: RawCatalogSettings,
    origin_url: &Url,
) -> Result<CatalogSettings, LoadError> {
    let manifest = catalog
        .manifest
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_MANIFEST));
    if manifest.as_os_str().is_empty() {
        return Err(LoadError::invalid("catalog.manifest", "must not be empty"));
    }

    let site_url = match catalog.site_url.as_deref() {
        Some(value) => parse_http_url(value, "catalog.site_url")?,
        None => origin_url.clone(),
    };

    Ok(CatalogSettings { manifest, site_url })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    admin_host: Option<String>,
    public_port: Option<u16>,
    admin_port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawOriginSettings {
    url: Option<String>,
    timeout_seconds: Option<u64>,
    max_request_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    directory: Option<PathBuf>,
    ttl_seconds: Option<u64>,
    body_limit_bytes: Option<u64>,
    exclusions: Option<String>,
    auth_cookie_prefixes: Option<Vec<String>>,
    session_cookie_prefixes: Option<Vec<String>>,
    cart_cookies: Option<Vec<String>>,
    body_signatures: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPrewarmSettings {
    auto_enabled: Option<bool>,
    batch_size: Option<u64>,
    request_delay_ms: Option<u64>,
    tick_delay_seconds: Option<u64>,
    cooldown_seconds: Option<u64>,
    cadence_seconds: Option<u64>,
    fetch_timeout_seconds: Option<u64>,
    state_file: Option<PathBuf>,
    base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCatalogSettings {
    manifest: Option<PathBuf>,
    site_url: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn parse_http_url(value: &str, key: &'static str) -> Result<Url, LoadError> {
    let url = Url::parse(value.trim())
        .map_err(|err| LoadError::invalid(key, format!("failed to parse: {err}")))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(LoadError::invalid(key, "must be an absolute http(s) URL")),
    }
}

/// Loopback URL for a listener address; wildcard binds map to loopback.
fn local_url(addr: SocketAddr, key: &'static str) -> Result<Url, LoadError> {
    let ip = match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    let target = SocketAddr::new(ip, addr.port());
    parse_http_url(&format!("http://{target}/"), key)
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value: usize = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))?;
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn list_or_default(values: Option<Vec<String>>, defaults: &[&str]) -> Vec<String> {
    match values {
        Some(values) => values
            .into_iter()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .collect(),
        None => defaults.iter().map(|value| value.to_string()).collect(),
    }
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
