//! Result rows produced by the read-side aggregations.

use serde::{Deserialize, Serialize};

use crate::{Gender, RegionCode, Year};

/// Births summed per municipality and year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionYearTotal {
    /// Municipality code.
    pub region_code: RegionCode,
    /// Name taken from the first record seen in the group.
    pub region_name: String,
    /// Calendar year.
    pub year: Year,
    /// Sum of births across both genders.
    pub total_births: u64,
}

/// Births summed per year and gender across all municipalities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearGenderTotal {
    /// Calendar year.
    pub year: Year,
    /// Gender classification.
    pub gender: Gender,
    /// Sum of births.
    pub total_births: u64,
}

/// Births summed per municipality, used by the top-N ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionTotal {
    /// Municipality code.
    pub region_code: RegionCode,
    /// Name taken from the first record seen in the group.
    pub region_name: String,
    /// Sum of births.
    pub total_births: u64,
}

/// Global statistics over every stored record.
///
/// `average_births`, `max_births` and `min_births` are `None` for an empty
/// store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthSummary {
    /// Number of stored records.
    pub record_count: u64,
    /// Sum of every record's value.
    pub total_births: u64,
    /// Mean value per record.
    pub average_births: Option<f64>,
    /// Largest single value.
    pub max_births: Option<u64>,
    /// Smallest single value.
    pub min_births: Option<u64>,
}

impl BirthSummary {
    /// Summary for a store without records.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            record_count: 0,
            total_births: 0,
            average_births: None,
            max_births: None,
            min_births: None,
        }
    }
}

/// Conjunctive filter over stored records. `None` fields match everything.
///
/// # Examples
/// ```
/// use birthstats_core::{BirthFilter, Gender, Year};
///
/// let filter = BirthFilter::default().with_year(Year::new(2020)).with_gender(Gender::Female);
/// assert!(filter.region_code.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BirthFilter {
    /// Restrict to one year.
    pub year: Option<Year>,
    /// Restrict to one gender.
    pub gender: Option<Gender>,
    /// Restrict to one municipality.
    pub region_code: Option<RegionCode>,
}

impl BirthFilter {
    /// Filter matching a single municipality.
    #[must_use]
    pub fn for_region(region_code: RegionCode) -> Self {
        Self {
            region_code: Some(region_code),
            ..Self::default()
        }
    }

    /// Restrict the filter to `year`.
    #[must_use]
    pub const fn with_year(mut self, year: Year) -> Self {
        self.year = Some(year);
        self
    }

    /// Restrict the filter to `gender`.
    #[must_use]
    pub const fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    /// Restrict the filter to `region_code`.
    #[must_use]
    pub fn with_region(mut self, region_code: RegionCode) -> Self {
        self.region_code = Some(region_code);
        self
    }

    /// Report whether `record` satisfies every supplied constraint.
    #[must_use]
    pub fn matches(&self, record: &crate::BirthRecord) -> bool {
        self.year.is_none_or(|year| record.year == year)
            && self.gender.is_none_or(|gender| record.gender == gender)
            && self
                .region_code
                .as_ref()
                .is_none_or(|code| &record.region_code == code)
    }
}
