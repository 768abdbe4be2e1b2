use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the Vitrine binary.
#[derive(Debug, Parser)]
#[command(name = "vitrine", version, about = "Vitrine storefront page accelerator")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "VITRINE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the public accelerator and the admin API.
    Serve(Box<ServeArgs>),
    /// Remove every cached page and exit.
    ///
    /// Meant for a stopped server: the next `serve` restarts prewarm when auto
    /// mode is on. Flush a running server through `POST /cache/clear`.
    Flush(FlushArgs),
    /// Print the URLs a prewarm run would visit, one per line.
    Enumerate(EnumerateArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CacheDirectoryOverride {
    /// Override the cache root directory.
    #[arg(long = "cache-directory", value_name = "PATH")]
    pub cache_directory: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CatalogOverrides {
    /// Override the catalog manifest path.
    #[arg(long = "catalog-manifest", value_name = "PATH")]
    pub catalog_manifest: Option<PathBuf>,

    /// Override the public site URL permalinks are resolved against.
    #[arg(long = "catalog-site-url", value_name = "URL")]
    pub catalog_site_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct FlushArgs {
    #[command(flatten)]
    pub cache: CacheDirectoryOverride,
}

#[derive(Debug, Args, Default, Clone)]
pub struct EnumerateArgs {
    #[command(flatten)]
    pub catalog: CatalogOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub cache: CacheDirectoryOverride,

    #[command(flatten)]
    pub catalog: CatalogOverrides,

    /// Override the public listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the administrative listener host.
    #[arg(long = "server-admin-host", value_name = "HOST")]
    pub server_admin_host: Option<String>,

    /// Override the public listener port.
    #[arg(long = "server-public-port", value_name = "PORT")]
    pub public_port: Option<u16>,

    /// Override the administrative listener port.
    #[arg(long = "server-admin-port", value_name = "PORT")]
    pub admin_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the origin URL requests are proxied to.
    #[arg(long = "origin-url", value_name = "URL")]
    pub origin_url: Option<String>,

    /// Toggle the page cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the cache entry lifetime.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS")]
    pub cache_ttl_seconds: Option<u64>,

    /// Override the initial auto-prewarm flag (only used before state exists).
    #[arg(
        long = "prewarm-auto",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub prewarm_auto: Option<bool>,

    /// Override the prewarm state file.
    #[arg(long = "prewarm-state-file", value_name = "PATH")]
    pub prewarm_state_file: Option<PathBuf>,

    /// Override the base URL prewarm requests are sent to.
    #[arg(long = "prewarm-base-url", value_name = "URL")]
    pub prewarm_base_url: Option<String>,
}
