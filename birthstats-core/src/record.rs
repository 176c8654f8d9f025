use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Municipality identifier as published by Statistics Sweden (e.g. `0114`).
///
/// # Examples
/// ```
/// use birthstats_core::RegionCode;
///
/// let code: RegionCode = " 0114 ".parse()?;
/// assert_eq!(code.as_str(), "0114");
/// # Ok::<(), birthstats_core::RecordFieldError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionCode(String);

impl RegionCode {
    /// Validate and wrap a region code. Surrounding whitespace is trimmed.
    pub fn new(value: impl AsRef<str>) -> Result<Self, RecordFieldError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(RecordFieldError::EmptyRegionCode);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RegionCode {
    type Err = RecordFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for RegionCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Gender classification using the source's codes: `1` for boys, `2` for girls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gender {
    /// Source code `"1"`.
    #[serde(rename = "1")]
    Male,
    /// Source code `"2"`.
    #[serde(rename = "2")]
    Female,
}

impl Gender {
    /// Both genders in source order.
    pub const ALL: [Self; 2] = [Self::Male, Self::Female];

    /// The code used by the statistics service and the store.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Male => "1",
            Self::Female => "2",
        }
    }
}

impl FromStr for Gender {
    type Err = RecordFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Self::Male),
            "2" => Ok(Self::Female),
            other => Err(RecordFieldError::UnknownGender {
                code: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Calendar year of a birth count.
///
/// Years are always held as integers so that natural-key matching never
/// depends on whether a value arrived as `"2020"` or `2020`.
///
/// # Examples
/// ```
/// use birthstats_core::Year;
///
/// let year: Year = "2020".parse()?;
/// assert_eq!(year, Year::new(2020));
/// assert_eq!(serde_json::to_string(&year).unwrap(), "2020");
/// # Ok::<(), birthstats_core::RecordFieldError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Year(u16);

impl Year {
    /// Wrap a numeric year.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// The numeric year.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl FromStr for Year {
    type Err = RecordFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<u16>()
            .ok()
            .filter(|year| *year > 0)
            .map(Self)
            .ok_or_else(|| RecordFieldError::InvalidYear {
                raw: trimmed.to_owned(),
            })
    }
}

impl From<u16> for Year {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised when a record field cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordFieldError {
    /// The region code was blank.
    #[error("region code must not be empty")]
    EmptyRegionCode,
    /// The gender code was neither `1` nor `2`.
    #[error("unknown gender code {code:?}")]
    UnknownGender { code: String },
    /// The year was not a positive integer.
    #[error("invalid year {raw:?}")]
    InvalidYear { raw: String },
}

/// Identity of a [`BirthRecord`]: one row per region, gender and year.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NaturalKey {
    /// Municipality.
    pub region_code: RegionCode,
    /// Gender classification.
    pub gender: Gender,
    /// Calendar year.
    pub year: Year,
}

/// Number of births for one municipality, gender and year.
///
/// # Examples
/// ```
/// use birthstats_core::{BirthRecord, Gender, RegionCode, Year};
///
/// let record = BirthRecord {
///     region_code: RegionCode::new("0114").unwrap(),
///     region_name: "Upplands Väsby".into(),
///     gender: Gender::Male,
///     year: Year::new(2020),
///     value: 123,
/// };
/// let json = serde_json::to_value(&record).unwrap();
/// assert_eq!(json["regionCode"], "0114");
/// assert_eq!(json["gender"], "1");
/// assert_eq!(json["year"], 2020);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthRecord {
    /// Municipality code.
    pub region_code: RegionCode,
    /// Human-readable municipality name.
    pub region_name: String,
    /// Gender classification.
    pub gender: Gender,
    /// Calendar year.
    pub year: Year,
    /// Number of births.
    pub value: u64,
}

impl BirthRecord {
    /// The natural key identifying this record in the store.
    #[must_use]
    pub fn key(&self) -> NaturalKey {
        NaturalKey {
            region_code: self.region_code.clone(),
            gender: self.gender,
            year: self.year,
        }
    }
}
