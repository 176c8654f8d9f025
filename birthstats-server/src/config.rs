//! Layered configuration for the `serve` and `refresh` subcommands.

use std::time::Duration;

use axum::http::HeaderValue;
use birthstats_core::DEFAULT_CACHE_TTL;
use birthstats_data::HttpSourceConfig;
use birthstats_data::scb::{DEFAULT_REQUEST_TIMEOUT, DEFAULT_SCB_API_URL, DEFAULT_USER_AGENT};
use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::ServerError;

pub(crate) const ARG_SCB_API_URL: &str = "scb-api-url";
pub(crate) const ARG_DATABASE: &str = "database";
pub(crate) const ARG_CACHE_TTL_SECS: &str = "cache-ttl-secs";
pub(crate) const ARG_PORT: &str = "port";
pub(crate) const ARG_ALLOWED_ORIGIN: &str = "allowed-origin";
pub(crate) const ARG_DATA_DIR: &str = "data-dir";
pub(crate) const ARG_REQUEST_TIMEOUT_SECS: &str = "request-timeout-secs";
pub(crate) const ARG_USER_AGENT: &str = "user-agent";

/// Database location used when none is configured.
pub const DEFAULT_DATABASE: &str = "data/birthstats.sqlite";
/// Reference data directory used when none is configured.
pub const DEFAULT_DATA_DIR: &str = "data";
/// Listening port used when none is configured.
pub const DEFAULT_PORT: u16 = 5001;

/// CLI arguments for the `serve` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Serve the birth statistics API. Settings can come from CLI \
                 flags, configuration files, or environment variables.",
    about = "Run the HTTP API"
)]
#[ortho_config(prefix = "BIRTHSTATS")]
pub struct ServeArgs {
    /// Statistics Sweden table endpoint.
    #[arg(long = ARG_SCB_API_URL, value_name = "url")]
    #[serde(default)]
    pub scb_api_url: Option<String>,
    /// Path to the SQLite database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub database: Option<Utf8PathBuf>,
    /// Lifetime of the cached record list, in seconds.
    #[arg(long = ARG_CACHE_TTL_SECS, value_name = "secs")]
    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,
    /// Port to listen on.
    #[arg(long = ARG_PORT, value_name = "port")]
    #[serde(default)]
    pub port: Option<u16>,
    /// Origin allowed by CORS. Any origin when unset.
    #[arg(long = ARG_ALLOWED_ORIGIN, value_name = "origin")]
    #[serde(default)]
    pub allowed_origin: Option<String>,
    /// Directory holding the reference JSON files.
    #[arg(long = ARG_DATA_DIR, value_name = "dir")]
    #[serde(default)]
    pub data_dir: Option<Utf8PathBuf>,
    /// Timeout for the statistics request, in seconds.
    #[arg(long = ARG_REQUEST_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// `User-Agent` sent to the statistics service.
    #[arg(long = ARG_USER_AGENT, value_name = "agent")]
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl ServeArgs {
    pub(crate) fn into_config(self) -> Result<ServerConfig, ServerError> {
        let merged = self.load_and_merge().map_err(ServerError::Configuration)?;
        ServerConfig::try_from(merged)
    }
}

/// CLI arguments for the `refresh` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Fetch the configured selection from Statistics Sweden, \
                 store it and exit.",
    about = "Refresh the database once"
)]
#[ortho_config(prefix = "BIRTHSTATS")]
pub struct RefreshArgs {
    /// Statistics Sweden table endpoint.
    #[arg(long = ARG_SCB_API_URL, value_name = "url")]
    #[serde(default)]
    pub scb_api_url: Option<String>,
    /// Path to the SQLite database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub database: Option<Utf8PathBuf>,
    /// Timeout for the statistics request, in seconds.
    #[arg(long = ARG_REQUEST_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// `User-Agent` sent to the statistics service.
    #[arg(long = ARG_USER_AGENT, value_name = "agent")]
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl RefreshArgs {
    pub(crate) fn into_config(self) -> Result<RefreshConfig, ServerError> {
        let merged = self.load_and_merge().map_err(ServerError::Configuration)?;
        RefreshConfig::try_from(merged)
    }
}

/// Resolved `serve` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Statistics endpoint and database shared with `refresh`.
    pub refresh: RefreshConfig,
    /// Lifetime of the cached record list.
    pub cache_ttl: Duration,
    /// Port to listen on.
    pub port: u16,
    /// Origin allowed by CORS; `None` allows any.
    pub allowed_origin: Option<HeaderValue>,
    /// Directory holding the reference JSON files.
    pub data_dir: Utf8PathBuf,
}

impl TryFrom<ServeArgs> for ServerConfig {
    type Error = ServerError;

    fn try_from(args: ServeArgs) -> Result<Self, Self::Error> {
        let refresh = RefreshConfig::try_from(RefreshArgs {
            scb_api_url: args.scb_api_url,
            database: args.database,
            request_timeout_secs: args.request_timeout_secs,
            user_agent: args.user_agent,
        })?;
        let cache_ttl = positive_secs(args.cache_ttl_secs, ARG_CACHE_TTL_SECS)?
            .unwrap_or(DEFAULT_CACHE_TTL);
        let allowed_origin = args
            .allowed_origin
            .filter(|origin| !origin.trim().is_empty())
            .map(|origin| {
                HeaderValue::from_str(origin.trim()).map_err(|_| ServerError::InvalidArgument {
                    field: ARG_ALLOWED_ORIGIN,
                    value: origin.clone(),
                    reason: "not a valid header value",
                })
            })
            .transpose()?;
        Ok(Self {
            refresh,
            cache_ttl,
            port: args.port.unwrap_or(DEFAULT_PORT),
            allowed_origin,
            data_dir: args
                .data_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATA_DIR)),
        })
    }
}

/// Resolved `refresh` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Statistics Sweden table endpoint.
    pub scb_api_url: String,
    /// Path to the SQLite database.
    pub database: Utf8PathBuf,
    /// Timeout for the statistics request.
    pub request_timeout: Duration,
    /// `User-Agent` sent to the statistics service.
    pub user_agent: String,
}

impl RefreshConfig {
    /// Client settings for the statistics source.
    #[must_use]
    pub fn source_config(&self) -> HttpSourceConfig {
        HttpSourceConfig::default()
            .with_endpoint(self.scb_api_url.clone())
            .with_timeout(self.request_timeout)
            .with_user_agent(self.user_agent.clone())
    }
}

impl TryFrom<RefreshArgs> for RefreshConfig {
    type Error = ServerError;

    fn try_from(args: RefreshArgs) -> Result<Self, Self::Error> {
        let request_timeout = positive_secs(args.request_timeout_secs, ARG_REQUEST_TIMEOUT_SECS)?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let user_agent = match args.user_agent {
            Some(agent) if agent.trim().is_empty() => {
                return Err(ServerError::InvalidArgument {
                    field: ARG_USER_AGENT,
                    value: agent,
                    reason: "must not be blank",
                });
            }
            Some(agent) => agent,
            None => DEFAULT_USER_AGENT.to_owned(),
        };
        Ok(Self {
            scb_api_url: args
                .scb_api_url
                .unwrap_or_else(|| DEFAULT_SCB_API_URL.to_owned()),
            database: args
                .database
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
            request_timeout,
            user_agent,
        })
    }
}

fn positive_secs(value: Option<u64>, field: &'static str) -> Result<Option<Duration>, ServerError> {
    match value {
        Some(0) => Err(ServerError::InvalidArgument {
            field,
            value: "0".to_owned(),
            reason: "must be greater than zero",
        }),
        other => Ok(other.map(Duration::from_secs)),
    }
}
