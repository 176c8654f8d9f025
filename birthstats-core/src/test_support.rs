//! Test-only, in-memory `BirthStore` implementation and helpers used by unit
//! and behaviour tests across the workspace.
//!
//! Compiled for this crate's own tests and, elsewhere, only when the
//! `test-support` feature is enabled.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use crate::{
    BirthFilter, BirthRecord, BirthStore, BirthSummary, Clock, Gender, NaturalKey, PersistError,
    RegionCode, RegionTotal, RegionYearTotal, StoreError, Year, YearGenderTotal,
};

/// Build a record named `Region <code>`.
///
/// # Panics
/// Panics when `code` is blank.
pub fn record(code: &str, gender: Gender, year: u16, value: u64) -> BirthRecord {
    let region_code = RegionCode::new(code).expect("region code must not be blank");
    BirthRecord {
        region_name: format!("Region {code}"),
        region_code,
        gender,
        year: Year::new(year),
        value,
    }
}

#[derive(Debug, Default)]
struct Rows {
    next_seq: u64,
    by_key: BTreeMap<NaturalKey, (u64, BirthRecord)>,
}

/// In-memory `BirthStore` that counts reads and can be told to fail writes.
///
/// Aggregations perform linear scans and are intended only for small datasets.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Rows>,
    list_calls: AtomicUsize,
    aggregate_calls: AtomicUsize,
    fail_after: Mutex<Option<usize>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    /// Create a store holding `records`.
    pub fn with_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = BirthRecord>,
    {
        let store = Self::default();
        let records: Vec<_> = records.into_iter().collect();
        if let Err(err) = store.upsert_records(&records) {
            log::error!("failed to seed memory store: {err}");
        }
        store
    }

    /// Number of `all_records` calls made so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of aggregation calls made so far.
    pub fn aggregate_calls(&self) -> usize {
        self.aggregate_calls.load(Ordering::SeqCst)
    }

    /// Make subsequent batch upserts fail once `applied` records have been
    /// written.
    pub fn fail_writes_after(&self, applied: usize) {
        if let Ok(mut guard) = self.fail_after.lock() {
            *guard = Some(applied);
        }
    }

    /// Make every subsequent operation fail as if the store were down.
    pub fn set_unavailable(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.rows().map_or(0, |rows| rows.by_key.len())
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn rows(&self) -> Result<MutexGuard<'_, Rows>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                message: "store is offline".into(),
            });
        }
        self.rows.lock().map_err(|_| StoreError::Poisoned)
    }

    fn sorted_by_seq(rows: &Rows) -> Vec<&(u64, BirthRecord)> {
        let mut ordered: Vec<_> = rows.by_key.values().collect();
        ordered.sort_by_key(|(seq, _)| *seq);
        ordered
    }
}

impl BirthStore for MemoryStore {
    fn upsert_records(&self, records: &[BirthRecord]) -> Result<usize, PersistError> {
        let fail_after = self.fail_after.lock().ok().and_then(|guard| *guard);
        let mut rows = self.rows().map_err(|err| PersistError::new(0, err))?;
        for (applied, incoming) in records.iter().enumerate() {
            if fail_after.is_some_and(|limit| applied >= limit) {
                return Err(PersistError::new(
                    applied,
                    StoreError::Unavailable {
                        message: "injected write failure".into(),
                    },
                ));
            }
            let seq = rows.next_seq;
            rows.next_seq += 1;
            rows.by_key
                .entry(incoming.key())
                .and_modify(|(_, existing)| {
                    existing.value = incoming.value;
                    existing.region_name.clone_from(&incoming.region_name);
                })
                .or_insert_with(|| (seq, incoming.clone()));
        }
        Ok(records.len())
    }

    fn all_records(&self) -> Result<Vec<BirthRecord>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.find_records(&BirthFilter::default())
    }

    fn find_records(&self, filter: &BirthFilter) -> Result<Vec<BirthRecord>, StoreError> {
        let rows = self.rows()?;
        Ok(rows
            .by_key
            .values()
            .map(|(_, record)| record)
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    fn region_year_totals(
        &self,
        regions: Option<&[RegionCode]>,
    ) -> Result<Vec<RegionYearTotal>, StoreError> {
        self.aggregate_calls.fetch_add(1, Ordering::SeqCst);
        let wanted: Option<BTreeSet<&RegionCode>> = regions.map(|codes| codes.iter().collect());
        let rows = self.rows()?;
        let mut groups: BTreeMap<(Year, RegionCode), RegionYearTotal> = BTreeMap::new();
        for (_, record) in Self::sorted_by_seq(&rows) {
            if wanted
                .as_ref()
                .is_some_and(|set| !set.contains(&record.region_code))
            {
                continue;
            }
            groups
                .entry((record.year, record.region_code.clone()))
                .or_insert_with(|| RegionYearTotal {
                    region_code: record.region_code.clone(),
                    region_name: record.region_name.clone(),
                    year: record.year,
                    total_births: 0,
                })
                .total_births += record.value;
        }
        Ok(groups.into_values().collect())
    }

    fn year_gender_totals(&self) -> Result<Vec<YearGenderTotal>, StoreError> {
        self.aggregate_calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows()?;
        let mut groups: BTreeMap<(Year, Gender), u64> = BTreeMap::new();
        for (_, record) in rows.by_key.values() {
            *groups.entry((record.year, record.gender)).or_default() += record.value;
        }
        Ok(groups
            .into_iter()
            .map(|((year, gender), total_births)| YearGenderTotal {
                year,
                gender,
                total_births,
            })
            .collect())
    }

    fn top_regions(&self, year: Year, limit: usize) -> Result<Vec<RegionTotal>, StoreError> {
        self.aggregate_calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows()?;
        let mut groups: BTreeMap<RegionCode, RegionTotal> = BTreeMap::new();
        for (_, record) in Self::sorted_by_seq(&rows) {
            if record.year != year {
                continue;
            }
            groups
                .entry(record.region_code.clone())
                .or_insert_with(|| RegionTotal {
                    region_code: record.region_code.clone(),
                    region_name: record.region_name.clone(),
                    total_births: 0,
                })
                .total_births += record.value;
        }
        let mut ranked: Vec<_> = groups.into_values().collect();
        ranked.sort_by(|a, b| {
            b.total_births
                .cmp(&a.total_births)
                .then_with(|| a.region_code.cmp(&b.region_code))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }

    fn summary(&self) -> Result<BirthSummary, StoreError> {
        self.aggregate_calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows()?;
        let values: Vec<u64> = rows.by_key.values().map(|(_, record)| record.value).collect();
        if values.is_empty() {
            return Ok(BirthSummary::empty());
        }
        let total: u64 = values.iter().sum();
        let average = total as f64 / values.len() as f64;
        Ok(BirthSummary {
            record_count: values.len() as u64,
            total_births: total,
            average_births: Some(average),
            max_births: values.iter().max().copied(),
            min_births: values.iter().min().copied(),
        })
    }
}

/// [`Clock`] that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }
}

impl ManualClock {
    /// Move the clock forward by `step`.
    pub fn advance(&self, step: Duration) {
        match self.offset.lock() {
            Ok(mut offset) => *offset += step,
            Err(poisoned) => *poisoned.into_inner() += step,
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = match self.offset.lock() {
            Ok(offset) => *offset,
            Err(poisoned) => *poisoned.into_inner(),
        };
        self.origin + offset
    }
}
