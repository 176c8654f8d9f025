use std::collections::BTreeMap;

use crate::RegionCode;

/// Name reported for municipalities missing from the lookup table.
pub const UNKNOWN_REGION_NAME: &str = "Unknown";

/// Immutable mapping from municipality code to display name.
///
/// # Examples
/// ```
/// use birthstats_core::{RegionCode, RegionNames};
///
/// let names = RegionNames::from_pairs([("0114", "Upplands Väsby")]);
/// let code = RegionCode::new("0114").unwrap();
/// assert_eq!(names.resolve(&code), "Upplands Väsby");
/// assert_eq!(names.resolve(&RegionCode::new("9999").unwrap()), "Unknown");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionNames {
    names: BTreeMap<String, String>,
}

impl RegionNames {
    /// Build the table from `(code, name)` pairs. Later duplicates win.
    pub fn from_pairs<I, C, N>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, N)>,
        C: Into<String>,
        N: Into<String>,
    {
        let names = pairs
            .into_iter()
            .map(|(code, name)| (code.into(), name.into()))
            .collect();
        Self { names }
    }

    /// Look up the name for `code`, if known.
    #[must_use]
    pub fn get(&self, code: &RegionCode) -> Option<&str> {
        self.names.get(code.as_str()).map(String::as_str)
    }

    /// Look up the name for `code`, falling back to [`UNKNOWN_REGION_NAME`].
    #[must_use]
    pub fn resolve(&self, code: &RegionCode) -> &str {
        self.get(code).unwrap_or(UNKNOWN_REGION_NAME)
    }

    /// Number of known municipalities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
