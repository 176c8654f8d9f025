//! HTTP handlers for the birth data API.
//!
//! Store access is blocking, so every handler that reads or writes records
//! runs its work on the blocking pool.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use birthstats_core::{
    BirthRecord, BirthStore, BirthSummary, QueryError, QueryService, RegionCode, RegionTotal,
    RegionYearTotal, YearGenderTotal,
};
use birthstats_data::RefreshError;
use serde::Serialize;
use serde_json::Value;

use super::AppState;
use super::error::ApiError;
use super::params::{CompareParams, FilterParams, TopParams, parse_value};

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"`; failures are reported as errors.
    pub status: &'static str,
    /// Server version.
    pub version: &'static str,
}

/// Outcome of `GET /api/birth-data/update`.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// Human-readable summary.
    pub message: String,
    /// Records upserted.
    pub applied: usize,
    /// Entries skipped as malformed.
    pub skipped: usize,
}

/// Health check: the process is up and the store answers a query.
pub async fn health<S: BirthStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<HealthResponse>, ApiError> {
    run_query(&state, "store is unavailable", QueryService::check_store).await?;
    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

async fn run_query<S, T, F>(
    state: &Arc<AppState<S>>,
    message: &'static str,
    work: F,
) -> Result<T, ApiError>
where
    S: BirthStore + 'static,
    T: Send + 'static,
    F: FnOnce(&QueryService<S>) -> Result<T, QueryError> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || work(&state.service))
        .await
        .map_err(ApiError::context(message))?
        .map_err(ApiError::context(message))
}

/// Every stored record, served from the read cache when warm.
pub async fn list_all<S: BirthStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Response, ApiError> {
    let records = run_query(
        &state,
        "failed to fetch birth data",
        QueryService::all_records,
    )
    .await?;
    log::debug!("returning {} birth records", records.len());
    Ok(Json(&records[..]).into_response())
}

/// Fetch the latest statistics and store them.
pub async fn refresh<S: BirthStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<RefreshResponse>, ApiError> {
    const FAILED: &str = "failed to update birth data";
    log::info!("refreshing birth data from {}", state.refresher.endpoint());
    let response = state
        .refresher
        .fetch()
        .await
        .map_err(|err| ApiError::new(FAILED, RefreshError::from(err)))?;
    let worker = Arc::clone(&state);
    let report = tokio::task::spawn_blocking(move || {
        worker.refresher.apply(&worker.service, &response)
    })
    .await
    .map_err(ApiError::context(FAILED))?
    .map_err(|err| ApiError::new(FAILED, RefreshError::from(err)))?;
    Ok(Json(RefreshResponse {
        message: format!(
            "birth data updated: {} records applied, {} skipped",
            report.applied, report.skipped
        ),
        applied: report.applied,
        skipped: report.skipped,
    }))
}

/// Records for one municipality.
pub async fn by_region<S: BirthStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(region_code): Path<String>,
) -> Result<Json<Vec<BirthRecord>>, ApiError> {
    const FAILED: &str = "failed to fetch municipality data";
    let region: RegionCode =
        parse_value("regionCode", &region_code).map_err(ApiError::context(FAILED))?;
    let records = run_query(&state, FAILED, move |service| {
        service.records_for_region(&region)
    })
    .await?;
    Ok(Json(records))
}

/// Totals per municipality and year.
pub async fn aggregated<S: BirthStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<RegionYearTotal>>, ApiError> {
    run_query(
        &state,
        "failed to fetch aggregated data",
        QueryService::region_year_totals,
    )
    .await
    .map(Json)
}

/// Totals per year and gender.
pub async fn trends<S: BirthStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<YearGenderTotal>>, ApiError> {
    run_query(
        &state,
        "failed to fetch trend data",
        QueryService::year_gender_totals,
    )
    .await
    .map(Json)
}

/// Totals per municipality and year for the listed municipalities.
pub async fn compare<S: BirthStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<CompareParams>,
) -> Result<Json<Vec<RegionYearTotal>>, ApiError> {
    const FAILED: &str = "failed to fetch comparison data";
    let regions = params.region_codes().map_err(ApiError::context(FAILED))?;
    run_query(&state, FAILED, move |service| service.compare_regions(&regions))
        .await
        .map(Json)
}

/// Municipalities with the most births in a year.
pub async fn top<S: BirthStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<TopParams>,
) -> Result<Json<Vec<RegionTotal>>, ApiError> {
    const FAILED: &str = "failed to fetch top list";
    let year = params.year().map_err(ApiError::context(FAILED))?;
    let limit = params.limit().map_err(ApiError::context(FAILED))?;
    run_query(&state, FAILED, move |service| service.top_regions(year, limit))
        .await
        .map(Json)
}

/// Records matching every supplied filter field.
pub async fn filter<S: BirthStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<FilterParams>,
) -> Result<Json<Vec<BirthRecord>>, ApiError> {
    const FAILED: &str = "failed to fetch filtered data";
    let filter = params.to_filter().map_err(ApiError::context(FAILED))?;
    run_query(&state, FAILED, move |service| service.filtered(&filter))
        .await
        .map(Json)
}

/// Global sum, mean and extremes.
pub async fn statistics<S: BirthStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<BirthSummary>, ApiError> {
    run_query(&state, "failed to fetch statistics", QueryService::summary)
        .await
        .map(Json)
}

/// Municipality boundaries as GeoJSON.
pub async fn municipalities<S: BirthStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Value>, ApiError> {
    const FAILED: &str = "failed to read municipality boundaries";
    let reference = state.reference.clone();
    tokio::task::spawn_blocking(move || reference.municipalities())
        .await
        .map_err(ApiError::context(FAILED))?
        .map(Json)
        .map_err(ApiError::context(FAILED))
}

/// City reference data.
pub async fn cities<S: BirthStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Value>, ApiError> {
    const FAILED: &str = "failed to read city data";
    let reference = state.reference.clone();
    tokio::task::spawn_blocking(move || reference.cities())
        .await
        .map_err(ApiError::context(FAILED))?
        .map(Json)
        .map_err(ApiError::context(FAILED))
}
