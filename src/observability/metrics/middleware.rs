//! HTTP request metrics middleware
//!
//! [`PrometheusLayer`] wraps any `tower` service handling `http` requests
//! and, after the inner service returns, records:
//! - `<subsystem>_requests_total{code, method, host, url}` - Counter
//! - `<subsystem>_request_duration_seconds{code, method, url}` - Histogram
//! - `<subsystem>_request_size_bytes{code, method, url}` - Histogram
//! - `<subsystem>_response_size_bytes{code, method, url}` - Histogram
//!
//! Requests to the metrics path or a configured skip path pass straight
//! through without being measured.

use axum::{
    body::HttpBody,
    extract::MatchedPath,
    http::{header, HeaderMap, Request, Response, StatusCode},
    BoxError,
};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::trace;

use super::registry::{Prometheus, RequestLabels};
use super::size::{estimate_with_headers, request_size, response_size};
use crate::error::HttpError;

/// Status code carried by an error returned from the wrapped service.
///
/// `None` means the error has no structured code; such requests are
/// labelled `500`.
pub trait ErrorStatus {
    fn status_code(&self) -> Option<StatusCode>;
}

impl ErrorStatus for Infallible {
    fn status_code(&self) -> Option<StatusCode> {
        match *self {}
    }
}

impl ErrorStatus for HttpError {
    fn status_code(&self) -> Option<StatusCode> {
        Some(self.status())
    }
}

impl ErrorStatus for BoxError {
    fn status_code(&self) -> Option<StatusCode> {
        self.downcast_ref::<HttpError>().map(HttpError::status)
    }
}

impl ErrorStatus for std::io::Error {
    fn status_code(&self) -> Option<StatusCode> {
        None
    }
}

impl ErrorStatus for axum::Error {
    fn status_code(&self) -> Option<StatusCode> {
        None
    }
}

/// Final status of a request: the error's structured code, `500` for an
/// error without one, otherwise the status actually sent.
pub fn resolve_status<B, E: ErrorStatus>(outcome: &Result<Response<B>, E>) -> StatusCode {
    match outcome {
        Ok(response) => response.status(),
        Err(err) => err
            .status_code()
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// Layer that applies [`PrometheusService`].
///
/// # Example
///
/// ```
/// use axum::{routing::get, Router};
/// use prometheus_middleware::{Prometheus, PrometheusConfig, PrometheusLayer};
///
/// let prometheus = Prometheus::new(PrometheusConfig::default()).unwrap();
///
/// let app: Router = Router::new()
///     .route("/", get(|| async { "Hello" }))
///     .layer(PrometheusLayer::new(prometheus));
/// ```
#[derive(Clone, Debug)]
pub struct PrometheusLayer {
    prometheus: Prometheus,
}

impl PrometheusLayer {
    pub fn new(prometheus: Prometheus) -> Self {
        Self { prometheus }
    }
}

impl<S> Layer<S> for PrometheusLayer {
    type Service = PrometheusService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PrometheusService {
            inner,
            prometheus: self.prometheus.clone(),
        }
    }
}

/// Service that measures each request handled by the inner service.
#[derive(Clone, Debug)]
pub struct PrometheusService<S> {
    inner: S,
    prometheus: Prometheus,
}

/// Response future of [`PrometheusService`].
pub type ResponseFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for PrometheusService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + 'static,
    S::Future: Send + 'static,
    S::Error: ErrorStatus + 'static,
    ReqBody: HttpBody + 'static,
    ResBody: HttpBody + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = ResponseFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        if self.prometheus.skip_set().contains(req.uri().path()) {
            return Box::pin(self.inner.call(req));
        }

        let start = Instant::now();
        let request_size = request_size(&req);
        let method = req.method().as_str().to_owned();
        let host = request_host(&req);
        let route = request_route(&req);

        let future = self.inner.call(req);
        let prometheus = self.prometheus.clone();

        Box::pin(async move {
            let outcome = future.await;

            let status = resolve_status(&outcome);
            let elapsed = start.elapsed().as_secs_f64();
            let response_size = match &outcome {
                Ok(response) => response_size(response),
                // No response exists; count only the empty framing.
                Err(_) => estimate_with_headers(0, &HeaderMap::new()),
            };

            let labels = RequestLabels {
                code: status.as_str(),
                method: &method,
                host: &host,
                url: &route,
            };
            prometheus
                .instruments()
                .record(&labels, elapsed, request_size, response_size);
            trace!(
                code = labels.code,
                method = labels.method,
                url = labels.url,
                elapsed,
                "Request metrics recorded"
            );

            outcome
        })
    }
}

/// Host label: the `Host` header, else the URI authority.
fn request_host<B>(req: &Request<B>) -> String {
    req.headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| req.uri().host())
        .unwrap_or_default()
        .to_string()
}

/// Route label: the matched route pattern, or the normalized path when no
/// route matched.
fn request_route<B>(req: &Request<B>) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| normalize_path(req.uri().path()))
}

/// Normalize a request path for metrics labeling.
///
/// Only used for requests that matched no route, where there is no pattern
/// to report.
///
/// Numeric and UUID segments become `:id`; empty segments (doubled or
/// trailing slashes) are dropped.
///
/// # Examples
///
/// ```
/// use prometheus_middleware::observability::metrics::normalize_path;
///
/// assert_eq!(normalize_path("/api/v1/jobs/550e8400-e29b-41d4-a716-446655440000"), "/api/v1/jobs/:id");
/// assert_eq!(normalize_path("/users/12345/profile"), "/users/:id/profile");
/// assert_eq!(normalize_path("/api/health/"), "/api/health");
/// ```
pub fn normalize_path(path: &str) -> String {
    let mut label = String::with_capacity(path.len());
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        label.push('/');
        label.push_str(if is_id_segment(segment) { ":id" } else { segment });
    }
    if label.is_empty() {
        label.push('/');
    }
    label
}

/// Numeric IDs and hyphenated 8-4-4-4-12 hex UUIDs.
fn is_id_segment(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    let numeric = bytes.iter().all(u8::is_ascii_digit);
    let uuid = bytes.len() == 36
        && bytes.iter().enumerate().all(|(i, b)| match i {
            8 | 13 | 18 | 23 => *b == b'-',
            _ => b.is_ascii_hexdigit(),
        });
    numeric || uuid
}
