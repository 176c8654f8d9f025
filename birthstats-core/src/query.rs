//! Read-side operations over a [`BirthStore`].

use std::{collections::BTreeSet, sync::Arc};

use crate::{
    BirthFilter, BirthRecord, BirthStore, BirthSummary, InvalidRequest, QueryError, ReadCache,
    RegionCode, RegionTotal, RegionYearTotal, Year, YearGenderTotal,
};

/// Number of municipalities returned by [`QueryService::top_regions`] when no
/// limit is given.
pub const DEFAULT_TOP_LIMIT: usize = 10;

/// Query service answering the dashboard's read operations.
///
/// Only [`QueryService::all_records`] consults the cache; every other
/// operation is evaluated against the store at call time.
///
/// # Examples
/// ```
/// use birthstats_core::{
///     BirthRecord, BirthStore, Gender, QueryService, ReadCache, RegionCode, SqliteBirthStore,
///     Year,
/// };
///
/// let store = SqliteBirthStore::open_in_memory().unwrap();
/// store
///     .upsert_records(&[BirthRecord {
///         region_code: RegionCode::new("0114").unwrap(),
///         region_name: "Upplands Väsby".into(),
///         gender: Gender::Male,
///         year: Year::new(2020),
///         value: 123,
///     }])
///     .unwrap();
/// let service = QueryService::new(store, ReadCache::default());
///
/// let first = service.all_records().unwrap();
/// let second = service.all_records().unwrap();
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// assert_eq!(service.cache().stats().hits, 1);
/// ```
#[derive(Debug)]
pub struct QueryService<S> {
    store: S,
    cache: ReadCache,
}

impl<S: BirthStore> QueryService<S> {
    /// Build a service over `store` that caches through `cache`.
    pub const fn new(store: S, cache: ReadCache) -> Self {
        Self { store, cache }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The record cache.
    pub const fn cache(&self) -> &ReadCache {
        &self.cache
    }

    /// Every stored record, from the cache when a live entry exists.
    pub fn all_records(&self) -> Result<Arc<[BirthRecord]>, QueryError> {
        if let Some(records) = self.cache.get() {
            return Ok(records);
        }
        let generation = self.cache.generation();
        let records = self.store.all_records()?;
        log::debug!("caching {} birth records", records.len());
        Ok(self.cache.set_if_current(generation, records))
    }

    /// Records for one municipality.
    pub fn records_for_region(&self, region: &RegionCode) -> Result<Vec<BirthRecord>, QueryError> {
        Ok(self
            .store
            .find_records(&BirthFilter::for_region(region.clone()))?)
    }

    /// Births per (region, year), sorted by year then region code.
    pub fn region_year_totals(&self) -> Result<Vec<RegionYearTotal>, QueryError> {
        Ok(self.store.region_year_totals(None)?)
    }

    /// Births per (year, gender), sorted by year then gender.
    pub fn year_gender_totals(&self) -> Result<Vec<YearGenderTotal>, QueryError> {
        Ok(self.store.year_gender_totals()?)
    }

    /// Births per (region, year) restricted to `regions`.
    ///
    /// Duplicate codes are ignored. An empty set is rejected before the
    /// store is consulted.
    pub fn compare_regions(
        &self,
        regions: &[RegionCode],
    ) -> Result<Vec<RegionYearTotal>, QueryError> {
        let unique: Vec<RegionCode> = regions
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if unique.is_empty() {
            return Err(InvalidRequest::EmptyRegionSet.into());
        }
        Ok(self.store.region_year_totals(Some(&unique))?)
    }

    /// The municipalities with the most births in `year`.
    ///
    /// `limit` defaults to [`DEFAULT_TOP_LIMIT`]. A missing year or a zero
    /// limit is rejected before the store is consulted.
    pub fn top_regions(
        &self,
        year: Option<Year>,
        limit: Option<usize>,
    ) -> Result<Vec<RegionTotal>, QueryError> {
        let year = year.ok_or(InvalidRequest::MissingYear)?;
        let limit = limit.unwrap_or(DEFAULT_TOP_LIMIT);
        if limit == 0 {
            return Err(InvalidRequest::ZeroLimit.into());
        }
        Ok(self.store.top_regions(year, limit)?)
    }

    /// Global sum, mean and extremes.
    pub fn summary(&self) -> Result<BirthSummary, QueryError> {
        Ok(self.store.summary()?)
    }

    /// Records matching every supplied field of `filter`.
    pub fn filtered(&self, filter: &BirthFilter) -> Result<Vec<BirthRecord>, QueryError> {
        Ok(self.store.find_records(filter)?)
    }

    /// Drop the cached record list.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }

    /// Upsert `records` and invalidate the cache once the write succeeds.
    ///
    /// On failure the cache is left untouched.
    pub fn apply_records(&self, records: &[BirthRecord]) -> Result<usize, crate::PersistError> {
        let applied = self.store.upsert_records(records)?;
        self.cache.invalidate();
        Ok(applied)
    }

    /// Confirm the store answers a trivial query. Bypasses the cache.
    pub fn check_store(&self) -> Result<(), QueryError> {
        self.store.summary()?;
        Ok(())
    }
}
