//! Static reference files served alongside the statistics.
//!
//! Files are read from a single data directory through a capability handle,
//! so a file name can never escape that directory.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use thiserror::Error;

/// Municipality boundaries as GeoJSON.
pub const MUNICIPALITIES_FILE: &str = "swedish_municipalities.geojson";
/// City names, coordinates and populations.
pub const CITIES_FILE: &str = "se.json";

/// A reference file could not be served.
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// The file could not be read.
    #[error("failed to read reference file {path}")]
    Read {
        /// Location of the file.
        path: Utf8PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file was not valid JSON.
    #[error("reference file {path} is not valid JSON")]
    Parse {
        /// Location of the file.
        path: Utf8PathBuf,
        /// Decoding failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Reader for the JSON files in a data directory.
///
/// # Examples
/// ```no_run
/// use birthstats_data::reference::ReferenceData;
///
/// let data = ReferenceData::new("data");
/// let geojson = data.municipalities()?;
/// assert_eq!(geojson["type"], "FeatureCollection");
/// # Ok::<(), birthstats_data::reference::ReferenceError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceData {
    data_dir: Utf8PathBuf,
}

impl ReferenceData {
    /// Serve files from `data_dir`.
    pub fn new(data_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The directory files are read from.
    #[must_use]
    pub fn data_dir(&self) -> &Utf8Path {
        &self.data_dir
    }

    /// Municipality boundaries.
    pub fn municipalities(&self) -> Result<Value, ReferenceError> {
        self.load(MUNICIPALITIES_FILE)
    }

    /// City reference data.
    pub fn cities(&self) -> Result<Value, ReferenceError> {
        self.load(CITIES_FILE)
    }

    /// Read and parse `file_name` from the data directory.
    pub fn load(&self, file_name: &str) -> Result<Value, ReferenceError> {
        let path = self.data_dir.join(file_name);
        let contents = birthstats_fs::read_reference_file(&self.data_dir, file_name)
            .map_err(|source| ReferenceError::Read {
                path: path.clone(),
                source,
            })?;
        serde_json::from_str(contents.trim_start_matches('\u{feff}'))
            .map_err(|source| ReferenceError::Parse { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::fs;
    use tempfile::TempDir;

    #[fixture]
    fn data_dir() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("create temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");
        (dir, path)
    }

    #[rstest]
    fn loads_city_file(data_dir: (TempDir, Utf8PathBuf)) {
        let (_guard, path) = data_dir;
        fs::write(path.join(CITIES_FILE), r#"[{"city":"Stockholm","lat":"59.3294"}]"#)
            .expect("write cities");

        let cities = ReferenceData::new(path).cities().expect("load cities");

        assert_eq!(cities[0]["city"], "Stockholm");
    }

    #[rstest]
    fn missing_file_is_a_read_error(data_dir: (TempDir, Utf8PathBuf)) {
        let (_guard, path) = data_dir;

        let err = ReferenceData::new(path)
            .municipalities()
            .expect_err("file is missing");

        assert!(matches!(err, ReferenceError::Read { .. }));
    }

    #[rstest]
    fn malformed_file_is_a_parse_error(data_dir: (TempDir, Utf8PathBuf)) {
        let (_guard, path) = data_dir;
        fs::write(path.join(MUNICIPALITIES_FILE), "{ not json").expect("write geojson");

        let err = ReferenceData::new(path)
            .municipalities()
            .expect_err("file is malformed");

        assert!(matches!(err, ReferenceError::Parse { .. }));
    }

    #[rstest]
    fn names_outside_the_directory_are_rejected(data_dir: (TempDir, Utf8PathBuf)) {
        let (_guard, path) = data_dir;

        let err = ReferenceData::new(path)
            .load("../etc/passwd")
            .expect_err("escape is refused");

        assert!(matches!(err, ReferenceError::Read { .. }));
    }
}
