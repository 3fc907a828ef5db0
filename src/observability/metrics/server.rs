//! Dedicated metrics listener
//!
//! Serves the exposition endpoint on its own address, separate from the
//! application router. The listener runs as a spawned task whose outcome is
//! handed back to the owner through [`MetricsServer::wait`]; it never
//! terminates the process itself.

use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use super::registry::Prometheus;
use crate::error::{MetricsError, Result};

/// Handle to a running dedicated metrics listener.
#[derive(Debug)]
pub struct MetricsServer {
    local_addr: SocketAddr,
    task: JoinHandle<Result<()>>,
}

impl MetricsServer {
    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the listener to stop.
    ///
    /// The listener only stops on failure or when aborted, so callers
    /// usually race this against their main server and treat completion as
    /// fatal.
    pub async fn wait(self) -> Result<()> {
        self.task.await?
    }

    /// Stop the listener.
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl Prometheus {
    /// Start the dedicated metrics listener, if a listen address is
    /// configured.
    ///
    /// Returns `Ok(None)` when metrics are served by the application router
    /// instead.
    ///
    /// # Errors
    ///
    /// Returns `Listener` if the address cannot be bound. Failures after
    /// startup are reported through [`MetricsServer::wait`].
    pub async fn spawn_server(&self) -> Result<Option<MetricsServer>> {
        let Some(addr) = self.config().listen_address() else {
            return Ok(None);
        };

        let bind_error = |source| MetricsError::Listener {
            addr: addr.to_string(),
            source,
        };
        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        let app: Router = self
            .metrics_router()
            .layer(TraceLayer::new_for_http());

        info!(
            listen = %local_addr,
            path = %self.config().metrics_path,
            "Metrics server started"
        );

        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.map_err(|source| {
                error!(listen = %local_addr, error = %source, "Metrics server failed");
                MetricsError::Server {
                    addr: local_addr,
                    source,
                }
            })
        });

        Ok(Some(MetricsServer { local_addr, task }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PrometheusConfig;
    use crate::observability::metrics::RequestLabels;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn http_get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_no_listen_address() {
        let prometheus = Prometheus::new(PrometheusConfig::default()).unwrap();
        assert!(prometheus.spawn_server().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_serves_metrics_on_dedicated_address() {
        let prometheus = Prometheus::new(
            PrometheusConfig::builder()
                .subsystem("side")
                .listen_address("127.0.0.1:0")
                .build(),
        )
        .unwrap();
        prometheus.instruments().record(
            &RequestLabels {
                code: "200",
                method: "GET",
                host: "example.com",
                url: "/",
            },
            0.1,
            2,
            2,
        );

        let server = prometheus.spawn_server().await.unwrap().unwrap();
        let response = http_get(server.local_addr(), "/metrics").await;

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains(
            r#"side_requests_total{code="200",host="example.com",method="GET",url="/"} 1"#
        ));

        let missing = http_get(server.local_addr(), "/other").await;
        assert!(missing.starts_with("HTTP/1.1 404"));

        server.abort();
        assert!(matches!(
            server.wait().await,
            Err(MetricsError::ServerTask(_))
        ));
    }

    #[tokio::test]
    async fn test_bind_failure_is_returned() {
        let prometheus = Prometheus::new(
            PrometheusConfig::builder()
                .listen_address("not-an-address")
                .build(),
        )
        .unwrap();

        let err = prometheus.spawn_server().await.unwrap_err();
        assert!(matches!(err, MetricsError::Listener { ref addr, .. } if addr == "not-an-address"));
    }
}
