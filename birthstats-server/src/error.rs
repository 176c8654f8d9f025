//! Error types emitted by the birthstats binary.

use std::sync::Arc;

use birthstats_core::StoreError;
use birthstats_data::{FetchError, RefreshError};
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors emitted while configuring or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A setting was present but unusable.
    #[error("invalid {field} {value:?}: {reason}")]
    InvalidArgument {
        field: &'static str,
        value: String,
        reason: &'static str,
    },
    /// The database could not be opened.
    #[error("failed to open database at {path}: {source}")]
    OpenStore {
        path: Utf8PathBuf,
        #[source]
        source: StoreError,
    },
    /// The statistics client could not be built.
    #[error("failed to configure the statistics source: {0}")]
    BuildSource(#[source] FetchError),
    /// The listening socket could not be bound.
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
    /// The server stopped with an I/O failure.
    #[error("server failed: {0}")]
    Serve(#[source] std::io::Error),
    /// A one-off refresh failed.
    #[error(transparent)]
    Refresh(#[from] RefreshError),
    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
