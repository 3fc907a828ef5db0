//! Paths the request interceptor leaves unmeasured.

/// Exact-match set of request paths excluded from measurement.
///
/// The metrics path is always a member, whether or not it was also listed
/// explicitly. Matching is plain string equality: no prefixes, no patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipSet {
    metrics_path: String,
    paths: Vec<String>,
}

impl SkipSet {
    /// Create a skip set from the metrics path and any additional paths.
    pub fn new<I, P>(metrics_path: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            metrics_path: metrics_path.into(),
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether requests to `path` bypass measurement.
    pub fn contains(&self, path: &str) -> bool {
        path == self.metrics_path || self.paths.iter().any(|p| p == path)
    }

    /// The additional paths, excluding the implicit metrics path.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }
}
