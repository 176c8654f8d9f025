//! Normalisation of raw statistics entries into birth records.
//!
//! Each entry is keyed by `(region, gender, year)` and carries its count as
//! the first measurement. Malformed entries are skipped and reported; they
//! never abort the batch.

use birthstats_core::{BirthRecord, Gender, RecordFieldError, RegionCode, RegionNames, Year};
use serde_json::Value;
use thiserror::Error;

use crate::scb::{RawEntry, ScbResponse};


/// Why an entry was left out of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    /// The key did not have exactly three parts.
    #[error("expected a key of region, gender and year but found {parts} parts")]
    MalformedKey { parts: usize },
    /// A key part could not be parsed.
    #[error(transparent)]
    InvalidField(#[from] RecordFieldError),
    /// No measurement was present.
    #[error("no value")]
    MissingValue,
    /// The measurement was not a non-negative integer.
    #[error("value {raw} is not a non-negative integer")]
    NonNumericValue { raw: String },
}

/// An entry excluded from the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Raw key parts as received.
    pub key: Vec<String>,
    /// Cause of the skip.
    pub reason: SkipReason,
}

/// Records produced from one response, plus the entries that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBatch {
    /// Candidate records in response order.
    pub records: Vec<BirthRecord>,
    /// Entries left out of `records`.
    pub skipped: Vec<SkippedEntry>,
}

impl NormalizedBatch {
    /// Number of skipped entries.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Converts raw entries into [`BirthRecord`] candidates.
///
/// # Examples
/// ```
/// use birthstats_core::{Gender, RegionNames, Year};
/// use birthstats_data::etl::RecordNormalizer;
/// use birthstats_data::scb::RawEntry;
/// use serde_json::json;
///
/// let normalizer = RecordNormalizer::new(RegionNames::from_pairs([("0114", "Upplands Väsby")]));
/// let entry = RawEntry {
///     key: vec!["0114".into(), "1".into(), "2020".into()],
///     values: vec![json!("123")],
/// };
/// let record = normalizer.normalize_entry(&entry).unwrap();
///
/// assert_eq!(record.region_name, "Upplands Väsby");
/// assert_eq!(record.gender, Gender::Male);
/// assert_eq!(record.year, Year::new(2020));
/// assert_eq!(record.value, 123);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordNormalizer {
    names: RegionNames,
}

impl RecordNormalizer {
    /// Build a normalizer resolving names through `names`.
    #[must_use]
    pub const fn new(names: RegionNames) -> Self {
        Self { names }
    }

    /// The name table in use.
    #[must_use]
    pub const fn names(&self) -> &RegionNames {
        &self.names
    }

    /// Normalise every entry of `response`, logging each skip.
    #[must_use]
    pub fn normalize(&self, response: &ScbResponse) -> NormalizedBatch {
        let mut batch = NormalizedBatch::default();
        for entry in &response.data {
            match self.normalize_entry(entry) {
                Ok(record) => batch.records.push(record),
                Err(reason) => {
                    log::warn!("skipping entry {:?}: {reason}", entry.key);
                    batch.skipped.push(SkippedEntry {
                        key: entry.key.clone(),
                        reason,
                    });
                }
            }
        }
        log::info!(
            "normalised {} records, skipped {}",
            batch.records.len(),
            batch.skipped_count()
        );
        batch
    }

    /// Normalise a single entry.
    pub fn normalize_entry(&self, entry: &RawEntry) -> Result<BirthRecord, SkipReason> {
        let [region, gender, year] = entry.key.as_slice() else {
            return Err(SkipReason::MalformedKey {
                parts: entry.key.len(),
            });
        };
        let region_code = RegionCode::new(region)?;
        let gender: Gender = gender.parse()?;
        let year: Year = year.parse()?;
        let value = parse_count(entry.values.first())?;
        let region_name = self.names.resolve(&region_code).to_owned();

        Ok(BirthRecord {
            region_code,
            region_name,
            gender,
            year,
            value,
        })
    }
}

fn parse_count(value: Option<&Value>) -> Result<u64, SkipReason> {
    match value {
        None | Some(Value::Null) => Err(SkipReason::MissingValue),
        Some(Value::String(raw)) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(SkipReason::MissingValue);
            }
            trimmed
                .parse::<u64>()
                .map_err(|_| SkipReason::NonNumericValue {
                    raw: trimmed.to_owned(),
                })
        }
        Some(Value::Number(number)) => {
            number
                .as_u64()
                .ok_or_else(|| SkipReason::NonNumericValue {
                    raw: number.to_string(),
                })
        }
        Some(other) => Err(SkipReason::NonNumericValue {
            raw: other.to_string(),
        }),
    }
}
