//! Demo service with request metrics
//!
//! Serves `/` and `/status/{code}` (answers with the requested status) and
//! exposes their metrics.
//!
//! # Usage
//!
//! ```bash
//! # Metrics on the application port at /metrics
//! metrics_demo
//!
//! # Metrics on a dedicated listener
//! METRICS_LISTEN_ADDR=0.0.0.0:9090 METRICS_SKIP_PATHS=/health metrics_demo
//! ```
//!
//! # Environment Variables
//!
//! - `APP_ADDR`: application listen address (default: "0.0.0.0:3000")
//! - `METRICS_SUBSYSTEM`, `METRICS_PATH`, `METRICS_SKIP_PATHS`, `METRICS_LISTEN_ADDR`
//! - `LOG_FORMAT`, `RUST_LOG`

use anyhow::{bail, Context};
use axum::{extract::Path, http::StatusCode, routing::get, Router};
use prometheus_middleware::observability::{init, ObservabilityConfig};
use prometheus_middleware::{HttpError, ObservableRouter, Prometheus, PrometheusConfig};
use std::env;
use std::future::IntoFuture;
use tokio::net::TcpListener;
use tracing::{info, warn};

const DEFAULT_APP_ADDR: &str = "0.0.0.0:3000";

async fn root() -> &'static str {
    "Hello, World!"
}

async fn status(Path(code): Path<u16>) -> Result<StatusCode, HttpError> {
    StatusCode::from_u16(code)
        .map_err(|_| HttpError::bad_request(format!("invalid status code: {code}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init(ObservabilityConfig::from_env())?;

    let prometheus = Prometheus::new(PrometheusConfig::from_env())
        .context("failed to register request metrics")?;

    let app = Router::new()
        .route("/", get(root))
        .route("/status/{code}", get(status))
        .with_prometheus(&prometheus);

    let addr = env::var("APP_ADDR").unwrap_or_else(|_| DEFAULT_APP_ADDR.to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        listen = %listener.local_addr()?,
        subsystem = %prometheus.config().subsystem,
        "Demo service started"
    );

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .into_future();

    match prometheus.spawn_server().await? {
        Some(metrics) => {
            tokio::select! {
                result = server => result.context("demo server failed")?,
                result = metrics.wait() => {
                    result.context("metrics listener failed")?;
                    bail!("metrics listener stopped unexpectedly");
                }
            }
        }
        None => server.await.context("demo server failed")?,
    }

    Ok(())
}
