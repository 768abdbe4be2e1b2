use std::{io::Write, process, sync::Arc};

use tokio::{sync::watch, try_join};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;
use vitrine::{
    application::{error::AppError, repos::CatalogRepo},
    cache::{CacheConfig, CacheState, CacheTrigger, ResponseStore},
    config,
    infra::{
        catalog::TomlCatalog,
        error::InfraError,
        http::{self, AdminState},
        origin::OriginProxy,
        prewarm_driver, telemetry,
    },
    prewarm::{HttpFetcher, PrewarmConfig, PrewarmScheduler, PrewarmStateFile, UrlEnumerator},
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Flush(_) => run_flush(settings).await,
        config::Command::Enumerate(_) => run_enumerate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let cache_config = CacheConfig::from(&settings.cache);
    let store = Arc::new(ResponseStore::new(&cache_config));
    if let Err(err) = store.ensure_root() {
        warn!(
            target = "vitrine::serve",
            error = %err,
            "cache root not writable, pages will not be stored"
        );
    }

    let scheduler = Arc::new(build_scheduler(&settings).await?);
    let trigger = CacheTrigger::new(store.clone())
        .with_home_path(settings.catalog.site_url.path())
        .with_observer(scheduler.clone());
    let cache_state = CacheState::with_store(cache_config.clone(), store);
    let origin = OriginProxy::new(&settings.origin).map_err(AppError::from)?;

    let admin_state = AdminState {
        cache: cache_config,
        trigger,
        prewarm: scheduler.clone(),
    };

    info!(
        target = "vitrine::serve",
        public_addr = %settings.server.public_addr,
        admin_addr = %settings.server.admin_addr,
        origin = %settings.origin.url,
        cache_enabled = settings.cache.enabled,
        "starting vitrine"
    );

    let driver_handle = prewarm_driver::spawn(scheduler);

    let result = serve_http(&settings, cache_state, origin, admin_state).await;

    driver_handle.abort();
    let _ = driver_handle.await;

    result
}

async fn run_flush(settings: config::Settings) -> Result<(), AppError> {
    let store = ResponseStore::new(&CacheConfig::from(&settings.cache));
    let removed = store.invalidate_all().await;
    info!(
        target = "vitrine::flush",
        directory = %store.root().display(),
        removed,
        "cache flushed"
    );

    let state_file = PrewarmStateFile::new(&settings.prewarm.state_file);
    match state_file.request_restart(settings.prewarm.auto_enabled).await {
        Ok(true) => info!(
            target = "vitrine::flush",
            state_file = %state_file.path().display(),
            "prewarm restart requested for next start"
        ),
        Ok(false) => {}
        Err(err) => warn!(
            target = "vitrine::flush",
            error = %err,
            "failed to request prewarm restart"
        ),
    }
    Ok(())
}

async fn run_enumerate(settings: config::Settings) -> Result<(), AppError> {
    let enumerator = build_enumerator(&settings);
    let paths = enumerator.enumerate().await;

    let mut stdout = std::io::stdout().lock();
    for path in &paths {
        writeln!(stdout, "{path}").map_err(|err| AppError::from(InfraError::Io(err)))?;
    }
    Ok(())
}

fn build_enumerator(settings: &config::Settings) -> UrlEnumerator {
    let catalog: Arc<dyn CatalogRepo> = Arc::new(TomlCatalog::new(&settings.catalog.manifest));
    UrlEnumerator::new(catalog, settings.catalog.site_url.clone())
}

async fn build_scheduler(settings: &config::Settings) -> Result<PrewarmScheduler, AppError> {
    let fetcher = HttpFetcher::new(
        settings.prewarm.base_url.clone(),
        settings.prewarm.fetch_timeout,
    )
    .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))?;

    Ok(PrewarmScheduler::load(
        PrewarmConfig::from(&settings.prewarm),
        build_enumerator(settings),
        Arc::new(fetcher),
        PrewarmStateFile::new(&settings.prewarm.state_file),
    )
    .await)
}

async fn serve_http(
    settings: &config::Settings,
    cache_state: CacheState,
    origin: OriginProxy,
    admin_state: AdminState,
) -> Result<(), AppError> {
    let public_router = http::build_public_router(cache_state, origin);
    let admin_router = http::build_admin_router(admin_state);

    let public_listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let admin_listener = tokio::net::TcpListener::bind(settings.server.admin_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(target = "vitrine::serve", "shutdown requested");
            let _ = stop_tx.send(true);
        }
    });

    let public_server = axum::serve(public_listener, public_router.into_make_service())
        .with_graceful_shutdown(stopped(stop_rx.clone()));
    let admin_server = axum::serve(admin_listener, admin_router.into_make_service())
        .with_graceful_shutdown(stopped(stop_rx.clone()));

    let servers = async { try_join!(public_server, admin_server) };
    let grace = settings.server.graceful_shutdown;
    let deadline = async move {
        stopped(stop_rx).await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = servers => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = deadline => {
            warn!(
                target = "vitrine::serve",
                grace_seconds = grace.as_secs(),
                "graceful shutdown timed out, dropping open connections"
            );
        }
    }

    Ok(())
}

async fn stopped(mut stop: watch::Receiver<bool>) {
    let _ = stop.wait_for(|stop| *stop).await;
}
