//! Persistence traits for birth records.
//!
//! [`BirthStore`] is the seam between the query service and the database. A
//! store upserts records keyed by their [`NaturalKey`](crate::NaturalKey) and
//! answers the read-side aggregations directly, so callers never load the full
//! table to compute a total.

use crate::{
    BirthFilter, BirthRecord, BirthSummary, PersistError, RegionCode, RegionTotal,
    RegionYearTotal, StoreError, Year, YearGenderTotal,
};

#[cfg(feature = "store-sqlite")]
mod schema;
#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use schema::{SCHEMA_VERSION, SchemaError, initialise_schema};
#[cfg(feature = "store-sqlite")]
pub use sqlite::{SqliteBirthStore, UPSERT_CHUNK_SIZE};

/// Storage for [`BirthRecord`] values.
///
/// Listing operations return records ordered by region code, gender and year.
///
/// # Examples
///
/// ```rust
/// use birthstats_core::{BirthRecord, BirthStore, Gender, RegionCode, SqliteBirthStore, Year};
///
/// let store = SqliteBirthStore::open_in_memory().unwrap();
/// let record = BirthRecord {
///     region_code: RegionCode::new("0114").unwrap(),
///     region_name: "Upplands Väsby".into(),
///     gender: Gender::Male,
///     year: Year::new(2020),
///     value: 123,
/// };
///
/// store.upsert_records(&[record.clone()]).unwrap();
/// store.upsert_records(&[record.clone()]).unwrap();
/// assert_eq!(store.all_records().unwrap(), vec![record]);
/// ```
pub trait BirthStore: Send + Sync {
    /// Insert or update each record by natural key.
    ///
    /// An existing row keeps its key and has `value` and `region_name`
    /// replaced. Each record is applied atomically but the batch is not:
    /// on failure the error reports how many records were already committed.
    fn upsert_records(&self, records: &[BirthRecord]) -> Result<usize, PersistError>;

    /// Every stored record.
    fn all_records(&self) -> Result<Vec<BirthRecord>, StoreError>;

    /// Records matching every constraint in `filter`.
    fn find_records(&self, filter: &BirthFilter) -> Result<Vec<BirthRecord>, StoreError>;

    /// Births summed per (region, year), sorted by year then region code.
    ///
    /// When `regions` is supplied only those municipalities are included.
    fn region_year_totals(
        &self,
        regions: Option<&[RegionCode]>,
    ) -> Result<Vec<RegionYearTotal>, StoreError>;

    /// Births summed per (year, gender), sorted by year then gender.
    fn year_gender_totals(&self) -> Result<Vec<YearGenderTotal>, StoreError>;

    /// The `limit` municipalities with the most births in `year`.
    ///
    /// Sorted by total descending; ties are broken by region code.
    fn top_regions(&self, year: Year, limit: usize) -> Result<Vec<RegionTotal>, StoreError>;

    /// Global sum, mean, maximum and minimum over every record.
    fn summary(&self) -> Result<BirthSummary, StoreError>;
}
