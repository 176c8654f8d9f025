//! Query-string parameters accepted by the birth data routes.
//!
//! Values arrive as raw strings so that unparsable input is reported as an
//! invalid request naming the offending parameter. Blank values are treated
//! as absent.

use std::str::FromStr;

use birthstats_core::{BirthFilter, Gender, InvalidRequest, RegionCode, Year};
use serde::Deserialize;

/// `?regionCodes=0114,0115`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareParams {
    region_codes: Option<String>,
}

impl CompareParams {
    /// The listed codes in request order. Empty when the parameter is absent.
    pub fn region_codes(&self) -> Result<Vec<RegionCode>, InvalidRequest> {
        self.region_codes
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(|code| parse_value("regionCodes", code))
            .collect()
    }
}

/// `?year=2020&limit=5`
#[derive(Debug, Default, Deserialize)]
pub struct TopParams {
    year: Option<String>,
    limit: Option<String>,
}

impl TopParams {
    /// Requested year, if any.
    pub fn year(&self) -> Result<Option<Year>, InvalidRequest> {
        parse_optional("year", self.year.as_deref())
    }

    /// Requested list length, if any.
    pub fn limit(&self) -> Result<Option<usize>, InvalidRequest> {
        parse_optional("limit", self.limit.as_deref())
    }
}

/// `?year=2020&gender=2&regionCode=0114`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    year: Option<String>,
    gender: Option<String>,
    region_code: Option<String>,
}

impl FilterParams {
    /// Build the conjunctive filter; absent parameters match everything.
    pub fn to_filter(&self) -> Result<BirthFilter, InvalidRequest> {
        Ok(BirthFilter {
            year: parse_optional::<Year>("year", self.year.as_deref())?,
            gender: parse_optional::<Gender>("gender", self.gender.as_deref())?,
            region_code: parse_optional::<RegionCode>("regionCode", self.region_code.as_deref())?,
        })
    }
}

/// Parse a path or query value, reporting `name` on failure.
pub fn parse_value<T: FromStr>(name: &'static str, raw: &str) -> Result<T, InvalidRequest> {
    raw.trim()
        .parse()
        .map_err(|_| InvalidRequest::InvalidParameter {
            name,
            value: raw.to_owned(),
        })
}

fn parse_optional<T: FromStr>(
    name: &'static str,
    raw: Option<&str>,
) -> Result<Option<T>, InvalidRequest> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_value(name, value).map(Some),
    }
}
