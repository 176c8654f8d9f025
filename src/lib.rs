//! Facade crate for the birth statistics service.
//!
//! This crate re-exports the core domain types and query service, and exposes
//! the SQLite store and the Statistics Sweden ingestion behind feature flags.

#![forbid(unsafe_code)]

pub use birthstats_core::{
    BirthFilter, BirthRecord, BirthStore, BirthSummary, Gender, InvalidRequest, PersistError,
    QueryError, QueryService, ReadCache, RegionCode, RegionNames, RegionTotal, RegionYearTotal,
    StoreError, Year, YearGenderTotal,
};

#[cfg(feature = "store-sqlite")]
pub use birthstats_core::{SchemaError, SqliteBirthStore};

#[cfg(feature = "etl")]
pub use birthstats_data::{
    FetchError, HttpSourceConfig, HttpStatisticsSource, RecordNormalizer, ReferenceData,
    RefreshError, RefreshReport, Refresher, StatisticsSource,
};
