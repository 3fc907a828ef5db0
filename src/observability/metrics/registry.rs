//! Prometheus - instrument registration and the owning metrics context
//!
//! Builds concrete instruments from the definition table, registers them
//! with a [`prometheus::Registry`] and binds each one to its slot so the
//! request path never looks anything up by name.

use prometheus::core::Collector;
use prometheus::{
    Counter, CounterVec, Gauge, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
};
use std::sync::Arc;
use tracing::debug;

use super::definitions::{MetricId, MetricKind, MetricSpec, DEFAULT_METRICS};
use super::skip::SkipSet;
use crate::config::PrometheusConfig;
use crate::error::{MetricsError, Result};

/// A registered-or-registrable instrument from the collection library.
#[derive(Clone)]
pub enum Instrument {
    Counter(Counter),
    CounterVec(CounterVec),
    Gauge(Gauge),
    GaugeVec(GaugeVec),
    Histogram(Histogram),
    HistogramVec(HistogramVec),
}

impl Instrument {
    /// The kind of this instrument.
    pub fn kind(&self) -> MetricKind {
        match self {
            Self::Counter(_) => MetricKind::Counter,
            Self::CounterVec(_) => MetricKind::CounterVec,
            Self::Gauge(_) => MetricKind::Gauge,
            Self::GaugeVec(_) => MetricKind::GaugeVec,
            Self::Histogram(_) => MetricKind::Histogram,
            Self::HistogramVec(_) => MetricKind::HistogramVec,
        }
    }

    /// Boxed collector for registration.
    pub fn collector(&self) -> Box<dyn Collector> {
        match self {
            Self::Counter(m) => Box::new(m.clone()),
            Self::CounterVec(m) => Box::new(m.clone()),
            Self::Gauge(m) => Box::new(m.clone()),
            Self::GaugeVec(m) => Box::new(m.clone()),
            Self::Histogram(m) => Box::new(m.clone()),
            Self::HistogramVec(m) => Box::new(m.clone()),
        }
    }
}

/// Fully qualified metric name: `<subsystem>_<name>`, or just `name` when
/// the subsystem is empty.
pub fn qualified_name(subsystem: &str, name: &str) -> String {
    if subsystem.is_empty() {
        name.to_string()
    } else {
        format!("{subsystem}_{name}")
    }
}

/// Create the instrument described by `spec`, prefixed with `subsystem`.
///
/// # Errors
///
/// Returns `UnsupportedKind` for summaries, which the collection library
/// does not provide, and `Instrument` if the library rejects the name,
/// labels or buckets.
pub fn new_metric(spec: &MetricSpec, subsystem: &str) -> Result<Instrument> {
    let fq_name = qualified_name(subsystem, spec.name);
    let wrap = |source| MetricsError::Instrument {
        name: fq_name.clone(),
        source,
    };

    let opts = || Opts::new(spec.name, spec.description).subsystem(subsystem);
    let histogram_opts = || {
        let opts = HistogramOpts::new(spec.name, spec.description).subsystem(subsystem);
        match spec.buckets {
            Some(buckets) => opts.buckets(buckets.to_vec()),
            None => opts,
        }
    };

    let instrument = match spec.kind {
        MetricKind::Counter => Instrument::Counter(Counter::with_opts(opts()).map_err(wrap)?),
        MetricKind::CounterVec => {
            Instrument::CounterVec(CounterVec::new(opts(), spec.labels).map_err(wrap)?)
        }
        MetricKind::Gauge => Instrument::Gauge(Gauge::with_opts(opts()).map_err(wrap)?),
        MetricKind::GaugeVec => {
            Instrument::GaugeVec(GaugeVec::new(opts(), spec.labels).map_err(wrap)?)
        }
        MetricKind::Histogram => {
            Instrument::Histogram(Histogram::with_opts(histogram_opts()).map_err(wrap)?)
        }
        MetricKind::HistogramVec => Instrument::HistogramVec(
            HistogramVec::new(histogram_opts(), spec.labels).map_err(wrap)?,
        ),
        kind @ (MetricKind::Summary | MetricKind::SummaryVec) => {
            return Err(MetricsError::UnsupportedKind {
                name: fq_name.clone(),
                kind,
            })
        }
    };

    Ok(instrument)
}

/// The four request instruments, bound to their slots.
#[derive(Clone)]
pub struct HttpInstruments {
    pub request_count: CounterVec,
    pub request_duration: HistogramVec,
    pub response_size: HistogramVec,
    pub request_size: HistogramVec,
}

impl HttpInstruments {
    /// Create and register one instrument per spec, then bind each to the
    /// slot named by its tag.
    ///
    /// # Errors
    ///
    /// Fails on the first spec that cannot be created or registered, when a
    /// tag is paired with the wrong kind, or when a slot is left unbound.
    /// Instruments registered before the failure stay registered.
    pub fn register(specs: &[MetricSpec], subsystem: &str, registry: &Registry) -> Result<Self> {
        let mut request_count = None;
        let mut request_duration = None;
        let mut response_size = None;
        let mut request_size = None;

        for spec in specs {
            let instrument = new_metric(spec, subsystem)?;
            let name = qualified_name(subsystem, spec.name);

            registry
                .register(instrument.collector())
                .map_err(|source| MetricsError::Registration {
                    name: name.clone(),
                    source,
                })?;
            debug!(metric = %name, kind = %spec.kind, "Registered metric");

            let mismatch = |actual: &Instrument, expected| MetricsError::KindMismatch {
                id: spec.id,
                expected,
                actual: actual.kind(),
            };

            match (spec.id, instrument) {
                (MetricId::RequestCount, Instrument::CounterVec(m)) => request_count = Some(m),
                (MetricId::RequestDuration, Instrument::HistogramVec(m)) => {
                    request_duration = Some(m)
                }
                (MetricId::ResponseSize, Instrument::HistogramVec(m)) => response_size = Some(m),
                (MetricId::RequestSize, Instrument::HistogramVec(m)) => request_size = Some(m),
                (MetricId::RequestCount, other) => {
                    return Err(mismatch(&other, MetricKind::CounterVec))
                }
                (_, other) => return Err(mismatch(&other, MetricKind::HistogramVec)),
            }
        }

        let missing = |id| MetricsError::MissingInstrument { id };
        Ok(Self {
            request_count: request_count.ok_or_else(|| missing(MetricId::RequestCount))?,
            request_duration: request_duration.ok_or_else(|| missing(MetricId::RequestDuration))?,
            response_size: response_size.ok_or_else(|| missing(MetricId::ResponseSize))?,
            request_size: request_size.ok_or_else(|| missing(MetricId::RequestSize))?,
        })
    }

    /// Record one completed request.
    ///
    /// Updates duration, count, request size and response size, in that
    /// order. The instruments synchronize internally.
    pub fn record(
        &self,
        labels: &RequestLabels<'_>,
        elapsed_secs: f64,
        request_size: usize,
        response_size: usize,
    ) {
        let short = [labels.code, labels.method, labels.url];

        self.request_duration
            .with_label_values(&short)
            .observe(elapsed_secs);
        self.request_count
            .with_label_values(&[labels.code, labels.method, labels.host, labels.url])
            .inc();
        self.request_size
            .with_label_values(&short)
            .observe(request_size as f64);
        self.response_size
            .with_label_values(&short)
            .observe(response_size as f64);
    }
}

/// Label values for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLabels<'a> {
    /// Final status code, e.g. `"404"`
    pub code: &'a str,
    pub method: &'a str,
    pub host: &'a str,
    /// Matched route pattern, not the literal path
    pub url: &'a str,
}

/// Request metrics context: the registry, the bound instruments and the
/// configuration they were built from.
///
/// Cheap to clone; clones share the same instruments.
///
/// # Example
///
/// ```
/// use prometheus_middleware::{Prometheus, PrometheusConfig};
///
/// let prometheus = Prometheus::new(
///     PrometheusConfig::builder().subsystem("api").build(),
/// ).unwrap();
///
/// assert_eq!(prometheus.config().subsystem, "api");
/// ```
#[derive(Clone)]
pub struct Prometheus {
    registry: Registry,
    instruments: Arc<HttpInstruments>,
    config: Arc<PrometheusConfig>,
    skip: Arc<SkipSet>,
}

impl Prometheus {
    /// Build the request instruments in a registry of their own.
    pub fn new(config: PrometheusConfig) -> Result<Self> {
        Self::with_registry(config, Registry::new())
    }

    /// Build the request instruments in a caller-supplied registry.
    ///
    /// # Errors
    ///
    /// A name that is already registered is a construction error; no
    /// partially bound context is ever returned. A metrics path that is not
    /// a static absolute route is rejected with `InvalidPath` before any
    /// instrument is registered.
    pub fn with_registry(config: PrometheusConfig, registry: Registry) -> Result<Self> {
        validate_metrics_path(&config.metrics_path)?;

        let instruments = HttpInstruments::register(DEFAULT_METRICS, &config.subsystem, &registry)?;
        let skip = config.skip_set();

        Ok(Self {
            registry,
            instruments: Arc::new(instruments),
            config: Arc::new(config),
            skip: Arc::new(skip),
        })
    }

    /// The registry holding the request instruments.
    ///
    /// Applications may register their own collectors here; they are served
    /// from the same endpoint.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The configuration this context was built from.
    pub fn config(&self) -> &PrometheusConfig {
        &self.config
    }

    /// The bound request instruments.
    pub fn instruments(&self) -> &HttpInstruments {
        &self.instruments
    }

    pub(crate) fn skip_set(&self) -> &SkipSet {
        &self.skip
    }
}

/// The metrics path becomes a literal axum route and a skip entry, so it
/// must start with `/` and carry no capture or wildcard syntax.
fn validate_metrics_path(path: &str) -> Result<()> {
    if path.starts_with('/') && !path.contains(['{', '}', '*']) {
        Ok(())
    } else {
        Err(MetricsError::InvalidPath {
            path: path.to_string(),
        })
    }
}

impl std::fmt::Debug for Prometheus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prometheus")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::metrics::definitions::{REQUEST_COUNT, REQUEST_SIZE};

    fn family_names(registry: &Registry) -> Vec<String> {
        registry
            .gather()
            .iter()
            .map(|mf| mf.get_name().to_string())
            .collect()
    }

    #[test]
    fn test_new_registers_namespaced_metrics() {
        let prometheus = Prometheus::new(
            PrometheusConfig::builder().subsystem("random").build(),
        )
        .unwrap();

        // Vectors only show up once a label combination exists.
        prometheus
            .instruments()
            .request_count
            .with_label_values(&["200", "GET", "example.com", "/"])
            .inc();
        prometheus
            .instruments()
            .request_size
            .with_label_values(&["200", "GET", "/"])
            .observe(10.0);

        let names = family_names(prometheus.registry());
        assert!(names.contains(&"random_requests_total".to_string()));
        assert!(names.contains(&"random_request_size_bytes".to_string()));
    }

    #[test]
    fn test_duplicate_registration_fails_fast() {
        let registry = Registry::new();
        let config = PrometheusConfig::default();

        Prometheus::with_registry(config.clone(), registry.clone()).unwrap();
        let err = Prometheus::with_registry(config, registry).unwrap_err();

        assert!(err.is_conflict());
        assert!(err.to_string().contains("fiber_requests_total"));
    }

    #[test]
    fn test_distinct_subsystems_share_registry() {
        let registry = Registry::new();

        Prometheus::with_registry(
            PrometheusConfig::builder().subsystem("public").build(),
            registry.clone(),
        )
        .unwrap();
        Prometheus::with_registry(
            PrometheusConfig::builder().subsystem("admin").build(),
            registry,
        )
        .unwrap();
    }

    #[test]
    fn test_missing_slot() {
        let err = match HttpInstruments::register(&[REQUEST_COUNT], "t", &Registry::new()) {
            Err(e) => e,
            Ok(_) => panic!("expected missing instrument error"),
        };
        assert!(matches!(
            err,
            MetricsError::MissingInstrument {
                id: MetricId::RequestDuration
            }
        ));
    }

    #[test]
    fn test_kind_mismatch() {
        let wrong = MetricSpec {
            kind: MetricKind::CounterVec,
            ..REQUEST_SIZE
        };
        let err = match HttpInstruments::register(&[wrong], "t", &Registry::new()) {
            Err(e) => e,
            Ok(_) => panic!("expected kind mismatch"),
        };
        assert!(matches!(
            err,
            MetricsError::KindMismatch {
                id: MetricId::RequestSize,
                expected: MetricKind::HistogramVec,
                actual: MetricKind::CounterVec,
            }
        ));
    }

    #[test]
    fn test_new_metric_kinds() {
        let base = MetricSpec {
            id: MetricId::RequestCount,
            name: "events",
            description: "Events",
            kind: MetricKind::Counter,
            labels: &["type"],
            buckets: Some(&[1.0, 2.0]),
        };

        for kind in [
            MetricKind::Counter,
            MetricKind::CounterVec,
            MetricKind::Gauge,
            MetricKind::GaugeVec,
            MetricKind::Histogram,
            MetricKind::HistogramVec,
        ] {
            let instrument = new_metric(&MetricSpec { kind, ..base.clone() }, "app").unwrap();
            assert_eq!(instrument.kind(), kind);
        }

        for kind in [MetricKind::Summary, MetricKind::SummaryVec] {
            let result = new_metric(&MetricSpec { kind, ..base.clone() }, "app");
            assert!(matches!(result, Err(MetricsError::UnsupportedKind { .. })));
        }
    }

    #[test]
    fn test_new_metric_invalid_name() {
        let spec = MetricSpec {
            name: "bad name",
            ..REQUEST_COUNT
        };
        assert!(matches!(
            new_metric(&spec, "app"),
            Err(MetricsError::Instrument { .. })
        ));
    }

    #[test]
    fn test_metrics_path_must_be_static_route() {
        for path in ["metrics", "", "/metrics/{name}", "/metrics/*rest"] {
            let registry = Registry::new();
            let err = Prometheus::with_registry(
                PrometheusConfig::builder().metrics_path(path).build(),
                registry.clone(),
            )
            .unwrap_err();

            assert!(matches!(err, MetricsError::InvalidPath { path: ref p } if p == path));
            // Rejected before anything is registered.
            assert!(registry.gather().is_empty());
        }

        assert!(Prometheus::new(
            PrometheusConfig::builder().metrics_path("/internal/metrics").build()
        )
        .is_ok());
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(qualified_name("random", "requests_total"), "random_requests_total");
        assert_eq!(qualified_name("", "requests_total"), "requests_total");
    }
}
