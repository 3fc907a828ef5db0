//! # Prometheus Middleware
//!
//! HTTP request metrics for Axum applications.
//!
//! A `tower` layer measures each request passing through a router (status
//! code, method, host, matched route, latency, request and response size),
//! aggregates the measurements into Prometheus collectors, and exposes them
//! in the text exposition format on a scrape endpoint.
//!
//! ## Features
//!
//! - **Request metrics**: `requests_total` counter plus duration and size histograms
//! - **Bounded cardinality**: routes are labelled by pattern, not literal path
//!   (in axum syntax, e.g. `url="/status/{code}"`, not `/status/:code`)
//! - **Skip list**: exact paths excluded from measurement
//! - **Exposition**: on the application router or a dedicated listener
//! - **Structured Logging**: `tracing` throughout, subscriber bootstrap in [`observability`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use prometheus_middleware::observability::{init, ObservabilityConfig};
//! use prometheus_middleware::{ObservableRouter, Prometheus, PrometheusConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     init(ObservabilityConfig::from_env())?;
//!
//!     let prometheus = Prometheus::new(
//!         PrometheusConfig::builder()
//!             .subsystem("shop")
//!             .skip_paths(["/health"])
//!             .build(),
//!     )?;
//!
//!     let app = Router::new()
//!         .route("/", get(|| async { "Hello, world!" }))
//!         .route("/health", get(|| async { "ok" }))
//!         .with_prometheus(&prometheus);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

mod config;
pub mod error;
pub mod observability;

// Re-exports
pub use config::{PrometheusConfig, PrometheusConfigBuilder, DEFAULT_METRICS_PATH, DEFAULT_SUBSYSTEM};
pub use error::{HttpError, MetricsError, Result};
pub use observability::metrics::{
    ErrorStatus, MetricsServer, ObservableRouter, Prometheus, PrometheusLayer,
};
