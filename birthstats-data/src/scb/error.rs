//! Errors produced while talking to the statistics service.

use thiserror::Error;

/// The statistics service could not be queried. Requests are never retried.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The configured endpoint is not a valid URL.
    #[error("invalid statistics endpoint {url:?}")]
    InvalidEndpoint {
        /// Endpoint as configured.
        url: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    Client {
        /// Builder failure.
        #[source]
        source: reqwest::Error,
    },
    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out")]
    Timeout {
        /// Fully qualified request URL.
        url: String,
    },
    /// The request failed before a response arrived.
    #[error("network error contacting {url}: {source}")]
    Network {
        /// Fully qualified request URL.
        url: String,
        /// Transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// The service answered with a non-success status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Fully qualified request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        message: String,
    },
    /// The response body was not the expected JSON.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        /// Fully qualified request URL.
        url: String,
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    pub(super) fn from_reqwest(error: reqwest::Error, url: &str) -> Self {
        if error.is_timeout() {
            return Self::Timeout {
                url: url.to_owned(),
            };
        }
        Self::Network {
            url: url.to_owned(),
            source: error,
        }
    }
}
