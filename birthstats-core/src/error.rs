use thiserror::Error;

/// Errors raised by a [`crate::BirthStore`] backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The database file could not be opened or its directory created.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to open birth record database at {path}")]
    Open {
        path: camino::Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A SQLite statement failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to {operation}")]
    Sqlite {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },
    /// The database schema could not be initialised or has the wrong version.
    #[cfg(feature = "store-sqlite")]
    #[error(transparent)]
    Schema(#[from] crate::store::SchemaError),
    /// A previous panic left the connection lock poisoned.
    #[error("store connection lock is poisoned")]
    Poisoned,
    /// A stored row could not be mapped back to a record.
    #[error("stored row is invalid: {reason}")]
    CorruptRow { reason: String },
    /// A value could not be represented in the backing store.
    #[error("value {value} for {field} does not fit the store's integer range")]
    OutOfRange { field: &'static str, value: u64 },
    /// The backend is unavailable.
    #[error("store unavailable: {message}")]
    Unavailable { message: String },
}

/// A batch upsert stopped early.
///
/// `applied` counts records committed before the failure; they are not rolled
/// back.
#[derive(Debug, Error)]
#[error("failed to persist birth records after {applied} were applied")]
pub struct PersistError {
    /// Records committed before the failure.
    pub applied: usize,
    /// The underlying store failure.
    #[source]
    pub source: StoreError,
}

impl PersistError {
    /// Wrap `source`, recording the number of records already committed.
    #[must_use]
    pub const fn new(applied: usize, source: StoreError) -> Self {
        Self { applied, source }
    }
}

/// A caller omitted or malformed a required query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRequest {
    /// The top-N query needs a year.
    #[error("no year supplied for the top list")]
    MissingYear,
    /// The comparison needs at least one region.
    #[error("no region codes supplied for comparison")]
    EmptyRegionSet,
    /// The top-N limit must be positive.
    #[error("limit must be greater than zero")]
    ZeroLimit,
    /// A parameter could not be parsed.
    #[error("invalid value {value:?} for parameter {name}")]
    InvalidParameter { name: &'static str, value: String },
}

/// Errors raised by [`crate::QueryService`] operations.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The request was rejected before the store was consulted.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] InvalidRequest),
    /// The store failed to answer.
    #[error(transparent)]
    Store(#[from] StoreError),
}
