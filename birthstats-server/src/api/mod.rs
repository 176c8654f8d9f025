//! Router and shared state for the birth data API.
//!
//! # Endpoints
//!
//! - `GET /api/birth-data` - every record (cached)
//! - `GET /api/birth-data/update` - refresh from Statistics Sweden
//! - `GET /api/birth-data/aggregated` - totals per municipality and year
//! - `GET /api/birth-data/trends` - totals per year and gender
//! - `GET /api/birth-data/compare?regionCodes=` - aggregated, restricted
//! - `GET /api/birth-data/top?year=&limit=` - top municipalities for a year
//! - `GET /api/birth-data/filter?year=&gender=&regionCode=` - filtered records
//! - `GET /api/birth-data/statistics` - global summary
//! - `GET /api/birth-data/{regionCode}` - records for one municipality
//! - `GET /api/municipalities` - municipality boundaries (GeoJSON)
//! - `GET /api/cities` - city reference data
//! - `GET /health` - liveness and store check

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::get,
};
use birthstats_core::{BirthStore, QueryService, SqliteBirthStore};
use birthstats_data::{ReferenceData, Refresher};
use tower_http::cors::{Any, CorsLayer};

mod error;
pub mod handlers;
pub mod params;

pub use error::{ApiError, ApiErrorKind};

/// State shared by every handler.
#[derive(Debug)]
pub struct AppState<S = SqliteBirthStore> {
    /// Store and read cache.
    pub service: QueryService<S>,
    /// Fetches and applies fresh statistics.
    pub refresher: Refresher,
    /// Static reference files.
    pub reference: ReferenceData,
}

impl<S: BirthStore> AppState<S> {
    /// Bundle the handler dependencies.
    pub const fn new(
        service: QueryService<S>,
        refresher: Refresher,
        reference: ReferenceData,
    ) -> Self {
        Self {
            service,
            refresher,
            reference,
        }
    }
}

/// CORS policy allowing `origin`, or any origin when `None`.
#[must_use]
pub fn cors_layer(origin: Option<HeaderValue>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);
    match origin {
        Some(origin) => layer.allow_origin(origin),
        None => layer.allow_origin(Any),
    }
}

/// Build the application router.
pub fn router<S: BirthStore + 'static>(state: Arc<AppState<S>>, cors: CorsLayer) -> Router {
    let birth_data = Router::new()
        .route("/", get(handlers::list_all::<S>))
        .route("/update", get(handlers::refresh::<S>))
        .route("/aggregated", get(handlers::aggregated::<S>))
        .route("/trends", get(handlers::trends::<S>))
        .route("/compare", get(handlers::compare::<S>))
        .route("/top", get(handlers::top::<S>))
        .route("/filter", get(handlers::filter::<S>))
        .route("/statistics", get(handlers::statistics::<S>))
        .route("/{region_code}", get(handlers::by_region::<S>));

    Router::new()
        .nest("/api/birth-data", birth_data)
        .route("/api/municipalities", get(handlers::municipalities::<S>))
        .route("/api/cities", get(handlers::cities::<S>))
        .route("/health", get(handlers::health::<S>))
        .layer(cors)
        .with_state(state)
}
