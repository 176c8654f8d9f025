//! Client for the Statistics Sweden (SCB) PxWeb API.
//!
//! The birth table is queried with one `POST` carrying a fixed selection of
//! municipalities, genders and years. The response is a flat list of entries
//! keyed by the tuple `(region, gender, year)`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod error;
mod source;
#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support;

#[cfg(test)]
mod tests;

pub use error::FetchError;
pub use source::{DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT, HttpSourceConfig, HttpStatisticsSource};

use crate::regions;

/// Live endpoint of the births-by-municipality table (`BE0101H/FoddaK`).
pub const DEFAULT_SCB_API_URL: &str =
    "https://api.scb.se/OV0104/v1/doris/sv/ssd/START/BE/BE0101/BE0101H/FoddaK";

/// Dimension code for municipalities.
pub const REGION_DIMENSION: &str = "Region";
/// Dimension code for gender.
pub const GENDER_DIMENSION: &str = "Kon";
/// Dimension code for the reference year.
pub const YEAR_DIMENSION: &str = "Tid";

const REGION_FILTER: &str = "vs:RegionKommun07";
const ITEM_FILTER: &str = "item";

/// Years requested when no selection is supplied.
pub const DEFAULT_YEARS: [&str; 5] = ["2016", "2017", "2018", "2019", "2020"];

/// Dimension values requested from the statistics service.
///
/// # Examples
/// ```
/// use birthstats_data::scb::QuerySelection;
///
/// let selection = QuerySelection::default();
/// assert_eq!(selection.regions.len(), 290);
/// assert_eq!(selection.genders, ["1", "2"]);
/// assert_eq!(selection.years.first().map(String::as_str), Some("2016"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySelection {
    /// Municipality codes.
    pub regions: Vec<String>,
    /// Gender codes.
    pub genders: Vec<String>,
    /// Years, as published by the service.
    pub years: Vec<String>,
}

impl Default for QuerySelection {
    fn default() -> Self {
        Self {
            regions: regions::municipality_codes().map(str::to_owned).collect(),
            genders: birthstats_core::Gender::ALL
                .iter()
                .map(|gender| gender.code().to_owned())
                .collect(),
            years: DEFAULT_YEARS.iter().map(|year| (*year).to_owned()).collect(),
        }
    }
}

impl QuerySelection {
    /// Build the JSON query document sent to the service.
    #[must_use]
    pub fn to_document(&self) -> QueryDocument {
        QueryDocument {
            query: vec![
                DimensionQuery::new(REGION_DIMENSION, REGION_FILTER, &self.regions),
                DimensionQuery::new(GENDER_DIMENSION, ITEM_FILTER, &self.genders),
                DimensionQuery::new(YEAR_DIMENSION, ITEM_FILTER, &self.years),
            ],
            response: ResponseFormat {
                format: "json".to_owned(),
            },
        }
    }
}

/// Request body accepted by the PxWeb API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDocument {
    /// One selection per dimension, in key order.
    pub query: Vec<DimensionQuery>,
    /// Requested response encoding.
    pub response: ResponseFormat,
}

/// Selection for a single dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionQuery {
    /// Dimension code such as `Region`.
    pub code: String,
    /// Values to include.
    pub selection: Selection,
}

impl DimensionQuery {
    fn new(code: &str, filter: &str, values: &[String]) -> Self {
        Self {
            code: code.to_owned(),
            selection: Selection {
                filter: filter.to_owned(),
                values: values.to_vec(),
            },
        }
    }
}

/// Filter and values for a dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Value set or `item` for explicit values.
    pub filter: String,
    /// Selected values.
    pub values: Vec<String>,
}

/// Requested response format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFormat {
    /// Encoding name, always `json` here.
    pub format: String,
}

/// Decoded response body. Columns, comments and metadata are ignored.
///
/// A body without a `data` array does not decode.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScbResponse {
    /// One entry per combination of dimension values.
    pub data: Vec<RawEntry>,
}

/// A single cell of the published table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawEntry {
    /// Dimension values in query order: region, gender, year.
    #[serde(default)]
    pub key: Vec<String>,
    /// Measurements; the first is the birth count.
    #[serde(default)]
    pub values: Vec<serde_json::Value>,
}

/// Origin of raw birth statistics.
#[async_trait]
pub trait StatisticsSource: Send + Sync {
    /// Location the source fetches from, for logging.
    fn endpoint(&self) -> &str;

    /// Perform one request for the configured selection.
    async fn fetch(&self) -> Result<ScbResponse, FetchError>;
}
