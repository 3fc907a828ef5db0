//! ObservableRouter trait for Axum integration
//!
//! Extension trait that adds request metrics to any Axum router.

use axum::{routing::get, Router};

use super::exposition::metrics_handler;
use super::middleware::PrometheusLayer;
use super::registry::Prometheus;

/// Extension trait for adding request metrics to an Axum Router.
///
/// # Example
///
/// ```
/// use axum::{routing::get, Router};
/// use prometheus_middleware::{ObservableRouter, Prometheus, PrometheusConfig};
///
/// async fn handler() -> &'static str { "Hello" }
///
/// let prometheus = Prometheus::new(
///     PrometheusConfig::builder().skip_paths(["/health"]).build(),
/// ).unwrap();
///
/// let app: Router = Router::new()
///     .route("/", get(handler))
///     .route("/health", get(|| async { "ok" }))
///     .with_prometheus(&prometheus);
///
/// // Now the router has:
/// // - Request metrics on every route except /health and /metrics
/// // - GET /metrics serving the text exposition
/// ```
pub trait ObservableRouter {
    /// Measure every request handled by this router.
    ///
    /// When no dedicated listen address is configured, the exposition
    /// endpoint is also added at the configured metrics path. Otherwise it
    /// is left to [`Prometheus::spawn_server`].
    ///
    /// Routes added after this call are not measured.
    ///
    /// # Panics
    ///
    /// Without a listen address, panics if the router already serves
    /// `GET` at the configured metrics path, as axum does for any
    /// overlapping route. Pick a different `metrics_path` or serve metrics
    /// from a dedicated listener in that case.
    fn with_prometheus(self, prometheus: &Prometheus) -> Self;
}

impl<S> ObservableRouter for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_prometheus(self, prometheus: &Prometheus) -> Self {
        let router = if prometheus.config().listen_address().is_none() {
            self.merge(prometheus.metrics_router())
        } else {
            self
        };

        router.layer(PrometheusLayer::new(prometheus.clone()))
    }
}

impl Prometheus {
    /// A router serving only `GET <metrics_path>`.
    ///
    /// The path was validated when this context was built, so it is always
    /// a static route.
    pub fn metrics_router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        Router::new()
            .route(&self.config().metrics_path, get(metrics_handler))
            .with_state(self.clone())
    }
}
