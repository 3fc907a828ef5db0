//! Error types
//!
//! [`MetricsError`] covers everything that can go wrong while building the
//! instruments or running the exposition endpoint. [`HttpError`] is the
//! structured error handlers and services return when they want the
//! request metrics to carry a specific status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;
use std::net::SocketAddr;
use thiserror::Error;

use crate::observability::metrics::{MetricId, MetricKind};

/// Result type alias for metrics operations
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Metrics error types
#[derive(Error, Debug)]
pub enum MetricsError {
    /// The collection library rejected an instrument definition
    #[error("Failed to create metric {name}: {source}")]
    Instrument {
        name: String,
        #[source]
        source: prometheus::Error,
    },

    /// The collection library has no implementation for this kind
    #[error("Metric {name} has unsupported kind {kind}")]
    UnsupportedKind { name: String, kind: MetricKind },

    /// Registration with the registry failed (usually a duplicate name)
    #[error("Failed to register metric {name}: {source}")]
    Registration {
        name: String,
        #[source]
        source: prometheus::Error,
    },

    /// A definition tag was paired with an instrument of the wrong kind
    #[error("Metric {id} expects a {expected} instrument, got {actual}")]
    KindMismatch {
        id: MetricId,
        expected: MetricKind,
        actual: MetricKind,
    },

    /// A built-in instrument was never bound
    #[error("No definition supplied for metric {id}")]
    MissingInstrument { id: MetricId },

    /// The metrics path cannot be served as a static route
    #[error("Invalid metrics path {path:?}: must start with '/' and contain no '{{' or '*'")]
    InvalidPath { path: String },

    /// Text exposition failed
    #[error("Failed to encode metrics: {0}")]
    Encode(#[source] prometheus::Error),

    /// The dedicated metrics listener could not bind its address
    #[error("Failed to bind metrics listener on {addr}: {source}")]
    Listener {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The dedicated metrics listener stopped with an error
    #[error("Metrics server on {addr} failed: {source}")]
    Server {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The dedicated metrics listener task panicked or was cancelled
    #[error("Metrics server task ended abnormally: {0}")]
    ServerTask(#[from] tokio::task::JoinError),
}

impl MetricsError {
    /// Whether this error is a duplicate-name registration conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Registration {
                source: prometheus::Error::AlreadyReg,
                ..
            }
        )
    }
}

/// An error carrying the HTTP status code it should be reported as.
///
/// Returned from a handler it renders as a plain-text response with that
/// status. Returned from a `tower` service wrapped by the metrics layer the
/// status becomes the `code` label even though no response was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    /// Create an error with an explicit status and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Create an error whose message is the status' canonical reason.
    pub fn from_status(status: StatusCode) -> Self {
        let message = status.canonical_reason().unwrap_or("Unknown Status");
        Self::new(status, message)
    }

    /// Bad request (400)
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Not found (404)
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Internal server error (500)
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// The status code this error reports.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for HttpError {}

impl From<StatusCode> for HttpError {
    fn from(status: StatusCode) -> Self {
        Self::from_status(status)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}
