//! Metrics middleware configuration
//!
//! Provides a builder-pattern configuration for the request metrics.

use serde::Deserialize;

use crate::observability::metrics::SkipSet;

/// Default subsystem prefix for every metric name.
pub const DEFAULT_SUBSYSTEM: &str = "fiber";

/// Default path the exposition endpoint is served on.
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

/// Configuration for the request metrics middleware.
///
/// # Example
///
/// ```
/// use prometheus_middleware::PrometheusConfig;
///
/// let config = PrometheusConfig::builder()
///     .subsystem("api")
///     .metrics_path("/internal/metrics")
///     .skip_paths(["/health"])
///     .build();
///
/// assert_eq!(config.subsystem, "api");
/// assert!(config.skip_set().contains("/internal/metrics"));
/// assert!(config.skip_set().contains("/health"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PrometheusConfig {
    /// Prefix applied to every metric name (`<subsystem>_<name>`)
    pub subsystem: String,

    /// Path the exposition endpoint is served on; never measured
    pub metrics_path: String,

    /// Additional exact-match paths excluded from measurement
    pub skip_paths: Vec<String>,

    /// Serve metrics on this address instead of the application router
    pub listen_address: Option<String>,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            subsystem: DEFAULT_SUBSYSTEM.to_string(),
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
            skip_paths: Vec::new(),
            listen_address: None,
        }
    }
}

impl PrometheusConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `METRICS_SUBSYSTEM`: metric name prefix (default: "fiber")
    /// - `METRICS_PATH`: exposition path (default: "/metrics")
    /// - `METRICS_SKIP_PATHS`: comma-separated paths to leave unmeasured (default: empty)
    /// - `METRICS_LISTEN_ADDR`: dedicated listener, e.g. "0.0.0.0:9090" (default: unset,
    ///   metrics are served by the application router)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let subsystem = lookup("METRICS_SUBSYSTEM").unwrap_or(defaults.subsystem);

        let metrics_path = lookup("METRICS_PATH")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.metrics_path);

        let skip_paths = lookup("METRICS_SKIP_PATHS")
            .map(|s| {
                s.split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let listen_address = lookup("METRICS_LISTEN_ADDR")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Self {
            subsystem,
            metrics_path,
            skip_paths,
            listen_address,
        }
    }

    /// Create a new builder for programmatic configuration.
    pub fn builder() -> PrometheusConfigBuilder {
        PrometheusConfigBuilder::default()
    }

    /// The effective skip set, including the metrics path itself.
    pub fn skip_set(&self) -> SkipSet {
        SkipSet::new(self.metrics_path.clone(), self.skip_paths.iter().cloned())
    }

    /// The dedicated listener address, if one is configured.
    pub fn listen_address(&self) -> Option<&str> {
        self.listen_address.as_deref().filter(|a| !a.is_empty())
    }
}

/// Builder for PrometheusConfig
///
/// Setters may be called in any order; a later call overrides an earlier one.
#[derive(Debug, Clone, Default)]
pub struct PrometheusConfigBuilder {
    config: PrometheusConfig,
}

impl PrometheusConfigBuilder {
    /// Set the metric name prefix.
    pub fn subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.config.subsystem = subsystem.into();
        self
    }

    /// Set the path the exposition endpoint is served on.
    pub fn metrics_path(mut self, path: impl Into<String>) -> Self {
        self.config.metrics_path = path.into();
        self
    }

    /// Replace the list of paths excluded from measurement.
    pub fn skip_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.config.skip_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Serve the metrics endpoint on a dedicated address.
    pub fn listen_address(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_address = Some(addr.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> PrometheusConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PrometheusConfig::default();
        assert_eq!(config.subsystem, "fiber");
        assert_eq!(config.metrics_path, "/metrics");
        assert!(config.skip_paths.is_empty());
        assert!(config.listen_address().is_none());
    }

    #[test]
    fn test_builder_later_values_override() {
        let config = PrometheusConfig::builder()
            .subsystem("first")
            .skip_paths(["/a", "/b"])
            .subsystem("random")
            .skip_paths(["/skip"])
            .build();

        assert_eq!(config.subsystem, "random");
        assert_eq!(config.skip_paths, vec!["/skip".to_string()]);
        assert_eq!(config.metrics_path, "/metrics");
    }

    #[test]
    fn test_skip_set_includes_metrics_path() {
        let config = PrometheusConfig::builder()
            .metrics_path("/prom")
            .skip_paths(["/skip"])
            .build();

        let skip = config.skip_set();
        assert!(skip.contains("/prom"));
        assert!(skip.contains("/skip"));
        assert!(!skip.contains("/metrics"));
    }

    #[test]
    fn test_from_lookup() {
        let config = PrometheusConfig::from_lookup(lookup_from(&[
            ("METRICS_SUBSYSTEM", "shop"),
            ("METRICS_PATH", "/stats"),
            ("METRICS_SKIP_PATHS", "/health, /ready,,"),
            ("METRICS_LISTEN_ADDR", "127.0.0.1:9090"),
        ]));

        assert_eq!(config.subsystem, "shop");
        assert_eq!(config.metrics_path, "/stats");
        assert_eq!(config.skip_paths, vec!["/health", "/ready"]);
        assert_eq!(config.listen_address(), Some("127.0.0.1:9090"));
    }

    #[test]
    fn test_from_lookup_empty_listen_address() {
        let config = PrometheusConfig::from_lookup(lookup_from(&[("METRICS_LISTEN_ADDR", "  ")]));
        assert_eq!(config, PrometheusConfig::default());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: PrometheusConfig =
            serde_json::from_str(r#"{"subsystem": "random", "skip_paths": ["/skip"]}"#).unwrap();

        assert_eq!(config.subsystem, "random");
        assert_eq!(config.metrics_path, "/metrics");
        assert_eq!(config.skip_paths, vec!["/skip"]);
        assert_eq!(config.listen_address, None);
    }
}
