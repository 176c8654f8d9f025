//! Shared fixtures for statistics source tests.
//!
//! Available to this crate's tests and behind the `test-support` feature.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{FetchError, RawEntry, ScbResponse, StatisticsSource};

/// Build a raw entry from string key parts and a single JSON value.
pub fn raw_entry(key: [&str; 3], value: serde_json::Value) -> RawEntry {
    RawEntry {
        key: key.iter().map(|part| (*part).to_owned()).collect(),
        values: vec![value],
    }
}

/// Stub [`StatisticsSource`] returning a canned response or failure.
#[derive(Debug)]
pub struct StubSource {
    outcome: StubOutcome,
    calls: AtomicUsize,
}

#[derive(Debug)]
enum StubOutcome {
    Respond(ScbResponse),
    FailWithStatus(u16),
}

impl StubSource {
    /// A source answering every fetch with `entries`.
    pub fn with_entries(entries: Vec<RawEntry>) -> Self {
        Self {
            outcome: StubOutcome::Respond(ScbResponse { data: entries }),
            calls: AtomicUsize::new(0),
        }
    }

    /// A source failing every fetch with HTTP `status`.
    pub fn failing(status: u16) -> Self {
        Self {
            outcome: StubOutcome::FailWithStatus(status),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of fetches performed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatisticsSource for StubSource {
    fn endpoint(&self) -> &str {
        "https://example.org/stub"
    }

    async fn fetch(&self) -> Result<ScbResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            StubOutcome::Respond(response) => Ok(response.clone()),
            StubOutcome::FailWithStatus(status) => Err(FetchError::Http {
                url: self.endpoint().to_owned(),
                status: *status,
                message: "stubbed failure".to_owned(),
            }),
        }
    }
}
