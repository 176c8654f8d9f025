//! Core domain types for the birth statistics service.
//!
//! A [`BirthRecord`] counts births for one municipality, gender and year.
//! Records are persisted through a [`BirthStore`] keyed by their
//! [`NaturalKey`], and read back through a [`QueryService`] that caches the
//! unfiltered listing in a [`ReadCache`].
//!
//! The SQLite backend lives behind the default `store-sqlite` feature.

mod aggregate;
pub mod cache;
mod error;
pub mod query;
mod record;
mod region;
pub mod store;
#[cfg(test)]
mod behaviour;
#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support;

pub use aggregate::{BirthFilter, BirthSummary, RegionTotal, RegionYearTotal, YearGenderTotal};
pub use cache::{CacheStats, Clock, DEFAULT_CACHE_TTL, Generation, ReadCache, SystemClock};
pub use error::{InvalidRequest, PersistError, QueryError, StoreError};
pub use query::{DEFAULT_TOP_LIMIT, QueryService};
pub use record::{BirthRecord, Gender, NaturalKey, RecordFieldError, RegionCode, Year};
pub use region::{RegionNames, UNKNOWN_REGION_NAME};
pub use store::BirthStore;
#[cfg(feature = "store-sqlite")]
pub use store::{SchemaError, SqliteBirthStore, UPSERT_CHUNK_SIZE};
