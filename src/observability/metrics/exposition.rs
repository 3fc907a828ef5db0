//! Prometheus text format export
//!
//! Renders every collector in a [`Prometheus`] registry with the collection
//! library's text encoder, and serves it over HTTP.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, TextEncoder};
use tracing::error;

use super::registry::Prometheus;
use crate::error::{MetricsError, Result};

/// Export metrics in Prometheus text format.
///
/// # Example Output
///
/// ```text
/// # HELP fiber_requests_total Total number of requests by status code and HTTP method
/// # TYPE fiber_requests_total counter
/// fiber_requests_total{code="200",host="example.com",method="GET",url="/"} 1
/// ```
pub fn export_prometheus(registry: &prometheus::Registry) -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::with_capacity(4096);

    encoder
        .encode(&registry.gather(), &mut buffer)
        .map_err(MetricsError::Encode)?;

    // The text encoder only writes UTF-8.
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

impl Prometheus {
    /// Render the current state of every registered instrument.
    pub fn render(&self) -> Result<String> {
        export_prometheus(self.registry())
    }
}

/// Handler for the metrics endpoint.
///
/// Answers with the text exposition of the registry, or `500` if encoding
/// fails.
pub async fn metrics_handler(State(prometheus): State<Prometheus>) -> Response {
    match prometheus.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
