//! HTTP API and command-line entry points for the birth statistics service.
#![forbid(unsafe_code)]

use std::{net::SocketAddr, sync::Arc};

use birthstats_core::{QueryService, ReadCache, SqliteBirthStore};
use birthstats_data::{
    HttpStatisticsSource, RecordNormalizer, ReferenceData, RefreshReport, Refresher, regions,
};
use camino::Utf8Path;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

pub mod api;
mod config;
mod error;

pub use config::{
    DEFAULT_DATA_DIR, DEFAULT_DATABASE, DEFAULT_PORT, RefreshArgs, RefreshConfig, ServeArgs,
    ServerConfig,
};
pub use error::ServerError;

/// Run the birthstats CLI with the current process arguments and environment.
pub async fn run() -> Result<(), ServerError> {
    let cli = Cli::try_parse()?;
    match cli.command {
        Command::Serve(args) => serve(args.into_config()?).await,
        Command::Refresh(args) => {
            refresh_once(args.into_config()?).await?;
            Ok(())
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "birthstats",
    about = "Birth statistics per Swedish municipality",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API.
    Serve(ServeArgs),
    /// Refresh the database from Statistics Sweden and exit.
    Refresh(RefreshArgs),
}

/// Open the database and wrap it in a query service reading through `cache`.
pub fn open_service(
    database: &Utf8Path,
    cache: ReadCache,
) -> Result<QueryService<SqliteBirthStore>, ServerError> {
    let store = SqliteBirthStore::open(database).map_err(|source| ServerError::OpenStore {
        path: database.to_path_buf(),
        source,
    })?;
    Ok(QueryService::new(store, cache))
}

/// Build a refresher for the configured statistics endpoint, naming
/// municipalities from the built-in table.
pub fn build_refresher(config: &RefreshConfig) -> Result<Refresher, ServerError> {
    let source =
        HttpStatisticsSource::new(config.source_config()).map_err(ServerError::BuildSource)?;
    Ok(Refresher::new(
        Arc::new(source),
        RecordNormalizer::new(regions::municipality_names()),
    ))
}

/// Serve the API until interrupted.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let service = open_service(&config.refresh.database, ReadCache::new(config.cache_ttl))?;
    let refresher = build_refresher(&config.refresh)?;
    warn_if_missing_data_dir(&config.data_dir);
    let reference = ReferenceData::new(config.data_dir.clone());
    let state = Arc::new(api::AppState::new(service, refresher, reference));
    let app = api::router(state, api::cors_layer(config.allowed_origin.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            port: config.port,
            source,
        })?;
    log::info!(
        "serving birth statistics on {addr} from {}",
        config.refresh.database
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;
    log::info!("server stopped");
    Ok(())
}

/// Run a single refresh against the configured database.
pub async fn refresh_once(config: RefreshConfig) -> Result<RefreshReport, ServerError> {
    let service = open_service(&config.database, ReadCache::default())?;
    let refresher = build_refresher(&config)?;
    log::info!("refreshing {} from {}", config.database, refresher.endpoint());
    let response = refresher.fetch().await.map_err(birthstats_data::RefreshError::from)?;
    let report = tokio::task::spawn_blocking(move || refresher.apply(&service, &response))
        .await?
        .map_err(birthstats_data::RefreshError::from)?;
    Ok(report)
}

fn warn_if_missing_data_dir(data_dir: &Utf8Path) {
    match birthstats_fs::dir_exists(data_dir) {
        Ok(true) => {}
        Ok(false) => log::warn!("reference data directory {data_dir} does not exist"),
        Err(err) => log::warn!("failed to inspect reference data directory {data_dir}: {err}"),
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("shutdown signal received"),
        Err(err) => {
            log::warn!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests;
