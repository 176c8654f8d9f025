//! Full refresh of the birth record store.
//!
//! A refresh fetches the configured selection, normalises it, upserts the
//! records and invalidates the read cache. The fetch completes before any
//! write begins. Records whose key is absent from the new batch are kept.

use std::sync::Arc;

use birthstats_core::{BirthStore, PersistError, QueryService};
use serde::Serialize;
use thiserror::Error;

use crate::etl::RecordNormalizer;
use crate::scb::{FetchError, ScbResponse, StatisticsSource};


/// Outcome of a successful refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    /// Records upserted.
    pub applied: usize,
    /// Entries skipped as malformed.
    pub skipped: usize,
}

/// A refresh was aborted.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The statistics service could not be queried.
    #[error("failed to fetch birth statistics")]
    Fetch(#[from] FetchError),
    /// The store rejected part of the batch.
    #[error("failed to store birth statistics")]
    Persist(#[from] PersistError),
}

/// Runs refreshes against one statistics source.
#[derive(Clone)]
pub struct Refresher {
    source: Arc<dyn StatisticsSource>,
    normalizer: RecordNormalizer,
}

impl std::fmt::Debug for Refresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Refresher")
            .field("endpoint", &self.source.endpoint())
            .field("regions", &self.normalizer.names().len())
            .finish()
    }
}

impl Refresher {
    /// Build a refresher pulling from `source` and naming regions through
    /// `normalizer`.
    pub fn new(source: Arc<dyn StatisticsSource>, normalizer: RecordNormalizer) -> Self {
        Self { source, normalizer }
    }

    /// Endpoint of the underlying source.
    pub fn endpoint(&self) -> &str {
        self.source.endpoint()
    }

    /// Fetch the raw response. Nothing is written.
    pub async fn fetch(&self) -> Result<ScbResponse, FetchError> {
        self.source.fetch().await
    }

    /// Normalise `response`, upsert the records and invalidate the cache.
    ///
    /// Store access is blocking; async callers should run this on a blocking
    /// task. On failure records already committed stay committed and the
    /// cache is left untouched.
    pub fn apply<S: BirthStore>(
        &self,
        service: &QueryService<S>,
        response: &ScbResponse,
    ) -> Result<RefreshReport, PersistError> {
        let batch = self.normalizer.normalize(response);
        let applied = service.apply_records(&batch.records)?;
        let report = RefreshReport {
            applied,
            skipped: batch.skipped_count(),
        };
        log::info!(
            "refresh applied {} records and skipped {}",
            report.applied,
            report.skipped
        );
        Ok(report)
    }

    /// Fetch, then apply.
    pub async fn refresh<S: BirthStore>(
        &self,
        service: &QueryService<S>,
    ) -> Result<RefreshReport, RefreshError> {
        let response = self.fetch().await?;
        Ok(self.apply(service, &response)?)
    }
}
