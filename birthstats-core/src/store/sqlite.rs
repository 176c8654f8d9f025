//! SQLite-backed [`BirthStore`] implementation.

use std::{
    fmt,
    sync::{Mutex, MutexGuard},
};

use camino::Utf8Path;
use rusqlite::{Connection, Transaction, params, params_from_iter};

use crate::{
    BirthFilter, BirthRecord, BirthSummary, Gender, PersistError, RegionCode, RegionTotal,
    RegionYearTotal, StoreError, Year, YearGenderTotal,
};

use super::{BirthStore, initialise_schema};

/// Records written per transaction by [`SqliteBirthStore::upsert_records`].
pub const UPSERT_CHUNK_SIZE: usize = 500;

/// SQLite limits bound parameters per statement to 999 by default. Region
/// filters are chunked to stay below that ceiling.
const SQLITE_MAX_VARIABLE_NUMBER: usize = 999;

const RECORD_COLUMNS: &str = "region_code, region_name, gender, year, value";

const UPSERT_SQL: &str = "INSERT INTO birth_records (region_code, region_name, gender, year, value)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT (region_code, gender, year) DO UPDATE SET
        region_name = excluded.region_name,
        value = excluded.value,
        updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')";

/// Birth record store persisted in a single SQLite database.
///
/// The connection is serialised behind a mutex; callers on an async runtime
/// should invoke the store from a blocking task.
pub struct SqliteBirthStore {
    connection: Mutex<Connection>,
}

impl fmt::Debug for SqliteBirthStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteBirthStore").finish_non_exhaustive()
    }
}

impl SqliteBirthStore {
    /// Open or create the database at `path` and apply the schema.
    ///
    /// Missing parent directories are created.
    pub fn open(path: impl AsRef<Utf8Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        birthstats_fs::ensure_parent_dir(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let connection = Connection::open(path).map_err(|source| StoreError::Sqlite {
            operation: "open database",
            source,
        })?;
        log::debug!("opened birth record database at {path}");
        Self::from_connection(connection)
    }

    /// Create a store backed by a private in-memory database.
    ///
    /// # Examples
    /// ```
    /// use birthstats_core::{BirthStore, SqliteBirthStore};
    ///
    /// let store = SqliteBirthStore::open_in_memory().unwrap();
    /// assert!(store.all_records().unwrap().is_empty());
    /// ```
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let connection = Connection::open_in_memory().map_err(|source| StoreError::Sqlite {
            operation: "open in-memory database",
            source,
        })?;
        Self::from_connection(connection)
    }

    fn from_connection(mut connection: Connection) -> Result<Self, StoreError> {
        initialise_schema(&mut connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.connection.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl BirthStore for SqliteBirthStore {
    fn upsert_records(&self, records: &[BirthRecord]) -> Result<usize, PersistError> {
        let mut connection = self.lock().map_err(|err| PersistError::new(0, err))?;
        let mut applied = 0;
        for chunk in records.chunks(UPSERT_CHUNK_SIZE) {
            upsert_chunk(&mut connection, chunk).map_err(|err| PersistError::new(applied, err))?;
            applied += chunk.len();
            log::debug!("committed {applied} of {} birth records", records.len());
        }
        Ok(applied)
    }

    fn all_records(&self) -> Result<Vec<BirthRecord>, StoreError> {
        self.find_records(&BirthFilter::default())
    }

    fn find_records(&self, filter: &BirthFilter) -> Result<Vec<BirthRecord>, StoreError> {
        let connection = self.lock()?;
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM birth_records
             WHERE (?1 IS NULL OR year = ?1)
               AND (?2 IS NULL OR gender = ?2)
               AND (?3 IS NULL OR region_code = ?3)
             ORDER BY region_code, gender, year"
        );
        let mut statement = connection.prepare(&sql).map_err(sqlite("prepare record query"))?;
        let rows = statement
            .query_map(
                params![
                    filter.year.map(Year::get),
                    filter.gender.map(Gender::code),
                    filter.region_code.as_ref().map(RegionCode::as_str),
                ],
                RawRecord::from_row,
            )
            .map_err(sqlite("query records"))?;

        rows.map(|row| row.map_err(sqlite("read record row"))?.into_record())
            .collect()
    }

    fn region_year_totals(
        &self,
        regions: Option<&[RegionCode]>,
    ) -> Result<Vec<RegionYearTotal>, StoreError> {
        let connection = self.lock()?;
        let mut totals = match regions {
            None => query_region_year_totals(&connection, &[])?,
            Some([]) => Vec::new(),
            Some(codes) => {
                let mut totals = Vec::new();
                for chunk in codes.chunks(SQLITE_MAX_VARIABLE_NUMBER) {
                    totals.extend(query_region_year_totals(&connection, chunk)?);
                }
                totals
            }
        };
        totals.sort_by(|a, b| {
            a.year
                .cmp(&b.year)
                .then_with(|| a.region_code.cmp(&b.region_code))
        });
        Ok(totals)
    }

    fn year_gender_totals(&self) -> Result<Vec<YearGenderTotal>, StoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare(
                "SELECT year, gender, SUM(value) FROM birth_records
                 GROUP BY year, gender
                 ORDER BY year, gender",
            )
            .map_err(sqlite("prepare trend query"))?;
        let rows = statement
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })
            .map_err(sqlite("query trends"))?;

        rows.map(|row| {
            let (year, gender, total) = row.map_err(sqlite("read trend row"))?;
            Ok(YearGenderTotal {
                year: decode_year(year)?,
                gender: decode_gender(&gender)?,
                total_births: decode_count("total_births", total)?,
            })
        })
        .collect()
    }

    fn top_regions(&self, year: Year, limit: usize) -> Result<Vec<RegionTotal>, StoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare(
                "SELECT grouped.region_code,
                        (SELECT first.region_name FROM birth_records AS first
                          WHERE first.region_code = grouped.region_code AND first.year = ?1
                          ORDER BY first.id LIMIT 1),
                        SUM(grouped.value) AS total
                 FROM birth_records AS grouped
                 WHERE grouped.year = ?1
                 GROUP BY grouped.region_code
                 ORDER BY total DESC, grouped.region_code ASC
                 LIMIT ?2",
            )
            .map_err(sqlite("prepare top list query"))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = statement
            .query_map(params![year.get(), limit], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })
            .map_err(sqlite("query top list"))?;

        rows.map(|row| {
            let (code, name, total) = row.map_err(sqlite("read top list row"))?;
            Ok(RegionTotal {
                region_code: decode_region(&code)?,
                region_name: name,
                total_births: decode_count("total_births", total)?,
            })
        })
        .collect()
    }

    fn summary(&self) -> Result<BirthSummary, StoreError> {
        let connection = self.lock()?;
        let (count, total, average, max, min) = connection
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(value), 0), AVG(value), MAX(value), MIN(value)
                 FROM birth_records",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                        row.get::<_, Option<i64>>(3)?,
                        row.get::<_, Option<i64>>(4)?,
                    ))
                },
            )
            .map_err(sqlite("summarise records"))?;

        Ok(BirthSummary {
            record_count: decode_count("record_count", count)?,
            total_births: decode_count("total_births", total)?,
            average_births: average,
            max_births: max.map(|value| decode_count("max_births", value)).transpose()?,
            min_births: min.map(|value| decode_count("min_births", value)).transpose()?,
        })
    }
}

fn upsert_chunk(connection: &mut Connection, chunk: &[BirthRecord]) -> Result<(), StoreError> {
    let transaction = connection
        .transaction()
        .map_err(sqlite("begin upsert transaction"))?;
    write_chunk(&transaction, chunk)?;
    transaction
        .commit()
        .map_err(sqlite("commit upsert transaction"))
}

fn write_chunk(transaction: &Transaction<'_>, chunk: &[BirthRecord]) -> Result<(), StoreError> {
    let mut statement = transaction
        .prepare_cached(UPSERT_SQL)
        .map_err(sqlite("prepare upsert"))?;
    for record in chunk {
        let value = i64::try_from(record.value).map_err(|_| StoreError::OutOfRange {
            field: "value",
            value: record.value,
        })?;
        statement
            .execute(params![
                record.region_code.as_str(),
                record.region_name,
                record.gender.code(),
                record.year.get(),
                value,
            ])
            .map_err(sqlite("upsert birth record"))?;
    }
    Ok(())
}

/// Aggregate per (region, year). An empty `codes` slice means every region.
fn query_region_year_totals(
    connection: &Connection,
    codes: &[RegionCode],
) -> Result<Vec<RegionYearTotal>, StoreError> {
    let region_clause = if codes.is_empty() {
        String::new()
    } else {
        let placeholders = vec!["?"; codes.len()].join(", ");
        format!("WHERE grouped.region_code IN ({placeholders})")
    };
    let sql = format!(
        "SELECT grouped.region_code,
                (SELECT first.region_name FROM birth_records AS first
                  WHERE first.region_code = grouped.region_code AND first.year = grouped.year
                  ORDER BY first.id LIMIT 1),
                grouped.year,
                SUM(grouped.value)
         FROM birth_records AS grouped
         {region_clause}
         GROUP BY grouped.region_code, grouped.year
         ORDER BY grouped.year, grouped.region_code"
    );
    let mut statement = connection
        .prepare(&sql)
        .map_err(sqlite("prepare aggregate query"))?;
    let rows = statement
        .query_map(params_from_iter(codes.iter().map(RegionCode::as_str)), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })
        .map_err(sqlite("query aggregates"))?;

    rows.map(|row| {
        let (code, name, year, total) = row.map_err(sqlite("read aggregate row"))?;
        Ok(RegionYearTotal {
            region_code: decode_region(&code)?,
            region_name: name,
            year: decode_year(year)?,
            total_births: decode_count("total_births", total)?,
        })
    })
    .collect()
}

/// Row exactly as stored, before validation.
struct RawRecord {
    region_code: String,
    region_name: String,
    gender: String,
    year: i64,
    value: i64,
}

impl RawRecord {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            region_code: row.get(0)?,
            region_name: row.get(1)?,
            gender: row.get(2)?,
            year: row.get(3)?,
            value: row.get(4)?,
        })
    }

    fn into_record(self) -> Result<BirthRecord, StoreError> {
        Ok(BirthRecord {
            region_code: decode_region(&self.region_code)?,
            region_name: self.region_name,
            gender: decode_gender(&self.gender)?,
            year: decode_year(self.year)?,
            value: decode_count("value", self.value)?,
        })
    }
}

fn sqlite(operation: &'static str) -> impl Fn(rusqlite::Error) -> StoreError {
    move |source| StoreError::Sqlite { operation, source }
}

fn decode_region(raw: &str) -> Result<RegionCode, StoreError> {
    RegionCode::new(raw).map_err(|err| StoreError::CorruptRow {
        reason: err.to_string(),
    })
}

fn decode_gender(raw: &str) -> Result<Gender, StoreError> {
    raw.parse().map_err(|err: crate::RecordFieldError| StoreError::CorruptRow {
        reason: err.to_string(),
    })
}

fn decode_year(raw: i64) -> Result<Year, StoreError> {
    u16::try_from(raw)
        .ok()
        .filter(|year| *year > 0)
        .map(Year::new)
        .ok_or_else(|| StoreError::CorruptRow {
            reason: format!("year {raw} is out of range"),
        })
}

fn decode_count(field: &'static str, raw: i64) -> Result<u64, StoreError> {
    u64::try_from(raw).map_err(|_| StoreError::CorruptRow {
        reason: format!("{field} {raw} is negative"),
    })
}
