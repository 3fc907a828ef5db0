//! Metric definitions: the static table of instruments the middleware keeps
//!
//! Nothing here touches a registry. The table is read-only configuration
//! data consumed by [`super::registry`].

use std::fmt;

/// One kibibyte, as a bucket boundary.
pub const KB: f64 = 1024.0;

/// One mebibyte, as a bucket boundary.
pub const MB: f64 = 1024.0 * KB;

/// Histogram buckets for request latency (in seconds).
pub const REQUEST_DURATION_BUCKETS: &[f64] = prometheus::DEFAULT_BUCKETS;

/// Histogram buckets for request and response sizes (in bytes).
pub const SIZE_BUCKETS: &[f64] = &[
    1.0 * KB,
    2.0 * KB,
    5.0 * KB,
    10.0 * KB,
    100.0 * KB,
    500.0 * KB,
    1.0 * MB,
    2.5 * MB,
    5.0 * MB,
    10.0 * MB,
];

/// Kind of instrument a definition describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    CounterVec,
    Gauge,
    GaugeVec,
    Histogram,
    HistogramVec,
    Summary,
    SummaryVec,
}

impl MetricKind {
    /// Whether instruments of this kind take label values on update.
    pub fn is_vec(self) -> bool {
        matches!(
            self,
            Self::CounterVec | Self::GaugeVec | Self::HistogramVec | Self::SummaryVec
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::CounterVec => "counter_vec",
            Self::Gauge => "gauge",
            Self::GaugeVec => "gauge_vec",
            Self::Histogram => "histogram",
            Self::HistogramVec => "histogram_vec",
            Self::Summary => "summary",
            Self::SummaryVec => "summary_vec",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies which request instrument a definition populates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricId {
    RequestCount,
    RequestDuration,
    ResponseSize,
    RequestSize,
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RequestCount => "reqCount",
            Self::RequestDuration => "reqDur",
            Self::ResponseSize => "respSize",
            Self::RequestSize => "reqSize",
        };
        f.write_str(s)
    }
}

/// Static description of a single metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSpec {
    /// Slot the registered instrument is bound to
    pub id: MetricId,
    /// Exposed name, before the subsystem prefix is applied
    pub name: &'static str,
    /// Help text
    pub description: &'static str,
    pub kind: MetricKind,
    /// Label names, in the order values are supplied on update
    pub labels: &'static [&'static str],
    /// Bucket boundaries; only read for histogram kinds
    pub buckets: Option<&'static [f64]>,
}

/// Total number of requests.
pub const REQUEST_COUNT: MetricSpec = MetricSpec {
    id: MetricId::RequestCount,
    name: "requests_total",
    description: "Total number of requests by status code and HTTP method",
    kind: MetricKind::CounterVec,
    labels: &["code", "method", "host", "url"],
    buckets: None,
};

/// Request latency.
pub const REQUEST_DURATION: MetricSpec = MetricSpec {
    id: MetricId::RequestDuration,
    name: "request_duration_seconds",
    description: "The HTTP request latencies in seconds.",
    kind: MetricKind::HistogramVec,
    labels: &["code", "method", "url"],
    buckets: Some(REQUEST_DURATION_BUCKETS),
};

/// Approximate response size.
pub const RESPONSE_SIZE: MetricSpec = MetricSpec {
    id: MetricId::ResponseSize,
    name: "response_size_bytes",
    description: "The HTTP response sizes in bytes.",
    kind: MetricKind::HistogramVec,
    labels: &["code", "method", "url"],
    buckets: Some(SIZE_BUCKETS),
};

/// Approximate request size.
pub const REQUEST_SIZE: MetricSpec = MetricSpec {
    id: MetricId::RequestSize,
    name: "request_size_bytes",
    description: "The HTTP request sizes in bytes.",
    kind: MetricKind::HistogramVec,
    labels: &["code", "method", "url"],
    buckets: Some(SIZE_BUCKETS),
};

/// The instruments every [`super::Prometheus`] registers.
pub const DEFAULT_METRICS: &[MetricSpec] =
    &[REQUEST_COUNT, REQUEST_DURATION, RESPONSE_SIZE, REQUEST_SIZE];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_ladder_is_binary() {
        assert_eq!(SIZE_BUCKETS.len(), 10);
        assert_eq!(SIZE_BUCKETS[0], 1024.0);
        assert_eq!(SIZE_BUCKETS[6], 1_048_576.0);
        assert_eq!(SIZE_BUCKETS[7], 2.5 * 1_048_576.0);
        assert_eq!(SIZE_BUCKETS[9], 10.0 * 1_048_576.0);
        assert!(SIZE_BUCKETS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_duration_buckets() {
        assert_eq!(
            REQUEST_DURATION_BUCKETS,
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
        );
    }

    #[test]
    fn test_default_table() {
        let ids: Vec<MetricId> = DEFAULT_METRICS.iter().map(|m| m.id).collect();
        assert_eq!(
            ids,
            vec![
                MetricId::RequestCount,
                MetricId::RequestDuration,
                MetricId::ResponseSize,
                MetricId::RequestSize,
            ]
        );
        assert_eq!(REQUEST_COUNT.labels.len(), 4);
        for spec in &DEFAULT_METRICS[1..] {
            assert_eq!(spec.labels, &["code", "method", "url"]);
            assert_eq!(spec.kind, MetricKind::HistogramVec);
            assert!(spec.buckets.is_some());
        }
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(MetricKind::CounterVec.to_string(), "counter_vec");
        assert!(MetricKind::SummaryVec.is_vec());
        assert!(!MetricKind::Histogram.is_vec());
    }
}
