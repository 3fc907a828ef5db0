//! HTTP Request Metrics
//!
//! Measures every request flowing through an Axum router and exposes the
//! aggregated series in the Prometheus text format:
//! - A fixed table of four request metrics
//! - A `tower` layer recording status, method, host, route, latency and sizes
//! - A scrape endpoint, on the application router or a dedicated listener
//!
//! # Quick Start
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use prometheus_middleware::{ObservableRouter, Prometheus, PrometheusConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let prometheus = Prometheus::new(PrometheusConfig::from_env())?;
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "Hello" }))
//!     .with_prometheus(&prometheus);
//!
//! // Only started when METRICS_LISTEN_ADDR is set.
//! let metrics_server = prometheus.spawn_server().await?;
//! # let _ = (app, metrics_server);
//! # Ok(())
//! # }
//! ```
//!
//! # Recorded Metrics
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `<subsystem>_requests_total` | Counter | code, method, host, url |
//! | `<subsystem>_request_duration_seconds` | Histogram | code, method, url |
//! | `<subsystem>_response_size_bytes` | Histogram | code, method, url |
//! | `<subsystem>_request_size_bytes` | Histogram | code, method, url |
//!
//! # Route Labels
//!
//! The `url` label is the matched route pattern, never the literal path.
//! Patterns keep axum's capture syntax, so a route registered as
//! `/status/{code}` is labelled `url="/status/{code}"`. Dashboards or alerts
//! written against colon-style labels (`url="/status/:code"`) need their
//! matchers updated.
//!
//! Requests that matched no route fall back to the literal path with
//! numeric and UUID segments replaced by `:id`:
//! - `/api/jobs/550e8400-e29b-41d4-a716-446655440000` → `/api/jobs/:id`
//! - `/users/12345/profile` → `/users/:id/profile`

mod definitions;
mod exposition;
mod middleware;
mod registry;
mod router;
mod server;
mod size;
mod skip;

// Metric table
pub use definitions::{
    MetricId, MetricKind, MetricSpec, DEFAULT_METRICS, KB, MB, REQUEST_COUNT,
    REQUEST_DURATION, REQUEST_DURATION_BUCKETS, REQUEST_SIZE, RESPONSE_SIZE, SIZE_BUCKETS,
};

// Registry binding
pub use registry::{
    new_metric, qualified_name, HttpInstruments, Instrument, Prometheus, RequestLabels,
};

// Request measurement
pub use middleware::{
    normalize_path, resolve_status, ErrorStatus, PrometheusLayer, PrometheusService,
    ResponseFuture,
};
pub use size::{estimate_size, estimate_with_headers, request_size, response_size};
pub use skip::SkipSet;

// Exposition
pub use exposition::{export_prometheus, metrics_handler};
pub use router::ObservableRouter;
pub use server::MetricsServer;
