//! Focused unit tests covering server configuration validation.

use std::time::Duration;

use super::*;
use crate::config::{
    ARG_ALLOWED_ORIGIN, ARG_CACHE_TTL_SECS, ARG_REQUEST_TIMEOUT_SECS, ARG_USER_AGENT,
};
use birthstats_data::scb::{DEFAULT_SCB_API_URL, DEFAULT_USER_AGENT};
use camino::Utf8PathBuf;
use rstest::rstest;

#[rstest]
fn defaults_fill_every_unset_field() {
    let config = ServerConfig::try_from(ServeArgs::default()).expect("defaults are valid");

    assert_eq!(config.refresh.scb_api_url, DEFAULT_SCB_API_URL);
    assert_eq!(config.refresh.database, Utf8PathBuf::from(DEFAULT_DATABASE));
    assert_eq!(config.refresh.request_timeout, Duration::from_secs(30));
    assert_eq!(config.refresh.user_agent, DEFAULT_USER_AGENT);
    assert_eq!(config.cache_ttl, Duration::from_secs(3600));
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.allowed_origin, None);
    assert_eq!(config.data_dir, Utf8PathBuf::from(DEFAULT_DATA_DIR));
}

#[rstest]
fn supplied_values_override_defaults() {
    let args = ServeArgs {
        scb_api_url: Some("http://127.0.0.1:9000/table".to_owned()),
        database: Some(Utf8PathBuf::from("/var/lib/birthstats/births.db")),
        cache_ttl_secs: Some(60),
        port: Some(8080),
        allowed_origin: Some("http://localhost:3000".to_owned()),
        data_dir: Some(Utf8PathBuf::from("/srv/reference")),
        request_timeout_secs: Some(5),
        user_agent: Some("dashboard-sync/2".to_owned()),
    };

    let config = ServerConfig::try_from(args).expect("values are valid");

    assert_eq!(config.refresh.scb_api_url, "http://127.0.0.1:9000/table");
    assert_eq!(config.cache_ttl, Duration::from_secs(60));
    assert_eq!(config.port, 8080);
    assert_eq!(
        config.allowed_origin.as_ref().map(|origin| origin.as_bytes()),
        Some(&b"http://localhost:3000"[..])
    );
    assert_eq!(config.refresh.source_config().timeout, Duration::from_secs(5));
    assert_eq!(config.refresh.source_config().user_agent, "dashboard-sync/2");
    assert_eq!(
        config.refresh.source_config().endpoint,
        "http://127.0.0.1:9000/table"
    );
}

#[rstest]
#[case(
    ServeArgs { cache_ttl_secs: Some(0), ..ServeArgs::default() },
    ARG_CACHE_TTL_SECS
)]
#[case(
    ServeArgs { request_timeout_secs: Some(0), ..ServeArgs::default() },
    ARG_REQUEST_TIMEOUT_SECS
)]
#[case(
    ServeArgs { allowed_origin: Some("bad\norigin".to_owned()), ..ServeArgs::default() },
    ARG_ALLOWED_ORIGIN
)]
#[case(
    ServeArgs { user_agent: Some("  ".to_owned()), ..ServeArgs::default() },
    ARG_USER_AGENT
)]
fn unusable_values_are_rejected(#[case] args: ServeArgs, #[case] expected: &str) {
    let err = ServerConfig::try_from(args).expect_err("value should be rejected");

    match err {
        ServerError::InvalidArgument { field, .. } => assert_eq!(field, expected),
        other => panic!("expected InvalidArgument, found {other:?}"),
    }
}

#[rstest]
fn blank_origin_allows_any() {
    let args = ServeArgs {
        allowed_origin: Some("  ".to_owned()),
        ..ServeArgs::default()
    };

    let config = ServerConfig::try_from(args).expect("blank origin is valid");

    assert_eq!(config.allowed_origin, None);
}

#[rstest]
fn serve_flags_parse_into_arguments() {
    let cli = Cli::try_parse_from([
        "birthstats",
        "serve",
        "--port",
        "6000",
        "--database",
        "births.db",
        "--cache-ttl-secs",
        "120",
    ])
    .expect("flags parse");

    match cli.command {
        Command::Serve(args) => {
            assert_eq!(args.port, Some(6000));
            assert_eq!(args.database, Some(Utf8PathBuf::from("births.db")));
            assert_eq!(args.cache_ttl_secs, Some(120));
            assert_eq!(args.allowed_origin, None);
        }
        other => panic!("expected serve, found {other:?}"),
    }
}

#[rstest]
fn refresh_rejects_serve_only_flags() {
    let err = Cli::try_parse_from(["birthstats", "refresh", "--port", "6000"])
        .expect_err("refresh has no port");

    assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
}

#[rstest]
fn refresh_config_defaults() {
    let config = RefreshConfig::try_from(RefreshArgs::default()).expect("defaults are valid");

    assert_eq!(config.database, Utf8PathBuf::from(DEFAULT_DATABASE));
    assert_eq!(config.request_timeout, Duration::from_secs(30));
}

#[rstest]
fn build_refresher_rejects_invalid_urls() {
    let config = RefreshConfig {
        scb_api_url: "not a url".to_owned(),
        database: Utf8PathBuf::from(DEFAULT_DATABASE),
        request_timeout: Duration::from_secs(1),
        user_agent: DEFAULT_USER_AGENT.to_owned(),
    };

    let err = build_refresher(&config).expect_err("url is invalid");

    assert!(matches!(err, ServerError::BuildSource(_)));
}

#[rstest]
fn open_service_creates_the_database_directory() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
    let database = root.join("nested").join("births.sqlite");

    let service =
        open_service(&database, birthstats_core::ReadCache::default()).expect("open database");

    assert!(service.all_records().expect("list").is_empty());
    assert!(database.exists());
}
