//! Data access and ingestion for the birth statistics service.
//!
//! Responsibilities:
//! - Query the Statistics Sweden API for births per municipality.
//! - Normalise the raw response into [`birthstats_core::BirthRecord`] values.
//! - Drive the refresh: fetch, normalise, upsert, invalidate.
//! - Serve static reference files from the data directory.
//!
//! Boundaries:
//! - Domain types and storage live in `birthstats-core`.
//! - Keep blocking store access off async executors.

pub mod etl;
pub mod reference;
pub mod refresh;
pub mod regions;
pub mod scb;

pub use etl::{NormalizedBatch, RecordNormalizer, SkipReason, SkippedEntry};
pub use reference::{ReferenceData, ReferenceError};
pub use refresh::{RefreshError, RefreshReport, Refresher};
pub use scb::{
    FetchError, HttpSourceConfig, HttpStatisticsSource, QuerySelection, ScbResponse,
    StatisticsSource,
};
