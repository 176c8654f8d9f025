//! Builders shared by the router tests and behaviour steps.

use std::{fs, sync::Arc};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use birthstats_core::{
    BirthRecord, BirthStore, QueryService, ReadCache, RegionNames, SqliteBirthStore,
};
use birthstats_data::reference::{CITIES_FILE, MUNICIPALITIES_FILE};
use birthstats_data::scb::test_support::StubSource;
use birthstats_data::{RecordNormalizer, ReferenceData, Refresher};
use camino::Utf8PathBuf;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::api::{self, AppState};

/// A router over `store` and `source`, with reference files in a temp dir.
pub(super) struct TestApp<S> {
    pub(super) router: Router,
    pub(super) state: Arc<AppState<S>>,
    _reference_dir: TempDir,
}

impl<S: BirthStore + 'static> TestApp<S> {
    pub(super) fn new(store: S, source: StubSource) -> Self {
        Self::with_reference_files(store, source, true)
    }

    pub(super) fn with_reference_files(store: S, source: StubSource, write_files: bool) -> Self {
        let reference_dir = TempDir::new().expect("create reference dir");
        let data_dir = Utf8PathBuf::from_path_buf(reference_dir.path().to_path_buf())
            .expect("utf-8 reference dir");
        if write_files {
            fs::write(
                data_dir.join(MUNICIPALITIES_FILE),
                r#"{"type":"FeatureCollection","features":[]}"#,
            )
            .expect("write municipalities");
            fs::write(
                data_dir.join(CITIES_FILE),
                r#"[{"city":"Stockholm","lat":"59.3294","lng":"18.0686"}]"#,
            )
            .expect("write cities");
        }
        let refresher = Refresher::new(
            Arc::new(source),
            RecordNormalizer::new(RegionNames::from_pairs([("0114", "Upplands Väsby")])),
        );
        let state = Arc::new(AppState::new(
            QueryService::new(store, ReadCache::default()),
            refresher,
            ReferenceData::new(data_dir),
        ));
        let router = api::router(Arc::clone(&state), api::cors_layer(None));
        Self {
            router,
            state,
            _reference_dir: reference_dir,
        }
    }

    pub(super) async fn get(&self, uri: &str) -> (StatusCode, Value) {
        get_json(self.router.clone(), uri).await
    }
}

/// A SQLite-backed app holding `records`.
pub(super) fn sqlite_app(
    records: &[BirthRecord],
    source: StubSource,
) -> TestApp<SqliteBirthStore> {
    let store = SqliteBirthStore::open_in_memory().expect("open store");
    store.upsert_records(records).expect("seed store");
    TestApp::new(store, source)
}

/// Issue a GET and decode the JSON body.
pub(super) async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let response = router.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = serde_json::from_slice(&bytes).expect("response body is JSON");
    (status, body)
}
