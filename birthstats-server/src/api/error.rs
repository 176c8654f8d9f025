//! Mapping of service failures onto HTTP responses.

use std::error::Error as _;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use birthstats_core::{InvalidRequest, QueryError};
use birthstats_data::{ReferenceError, RefreshError};
use serde::Serialize;
use thiserror::Error;

/// A failed API request, carrying the message shown to the client.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    message: &'static str,
    #[source]
    kind: ApiErrorKind,
}

/// The failure behind an [`ApiError`].
#[derive(Debug, Error)]
pub enum ApiErrorKind {
    /// A query was rejected or the store failed to answer it.
    #[error(transparent)]
    Query(#[from] QueryError),
    /// The refresh could not fetch or store the statistics.
    #[error(transparent)]
    Refresh(#[from] RefreshError),
    /// A reference file could not be served.
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    /// The blocking worker panicked or was cancelled.
    #[error("background task failed")]
    Task(#[from] tokio::task::JoinError),
}

impl From<InvalidRequest> for ApiErrorKind {
    fn from(err: InvalidRequest) -> Self {
        Self::Query(QueryError::InvalidRequest(err))
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    error: String,
}

impl ApiError {
    /// Wrap `kind` under the client-facing `message`.
    pub fn new(message: &'static str, kind: impl Into<ApiErrorKind>) -> Self {
        Self {
            message,
            kind: kind.into(),
        }
    }

    /// Adapter for `map_err` that attaches `message`.
    pub fn context<E: Into<ApiErrorKind>>(message: &'static str) -> impl FnOnce(E) -> Self {
        move |err| Self::new(message, err)
    }

    /// The underlying failure.
    #[must_use]
    pub const fn kind(&self) -> &ApiErrorKind {
        &self.kind
    }

    /// HTTP status reported for this failure.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match &self.kind {
            ApiErrorKind::Query(QueryError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        let mut text = self.kind.to_string();
        let mut cause = self.kind.source();
        while let Some(err) = cause {
            let part = err.to_string();
            if !text.contains(&part) {
                text.push_str(": ");
                text.push_str(&part);
            }
            cause = err.source();
        }
        text
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.detail();
        if status.is_server_error() {
            log::error!("{}: {error}", self.message);
        } else {
            log::warn!("{}: {error}", self.message);
        }
        let body = ErrorBody {
            message: self.message,
            error,
        };
        (status, Json(body)).into_response()
    }
}
