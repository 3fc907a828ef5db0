//! Observability Infrastructure
//!
//! Structured logging bootstrap plus the HTTP request metrics in
//! [`metrics`]. Library code only uses `tracing` macros; the binary decides
//! how events are rendered by calling [`init`] once at startup.
//!
//! # Usage
//!
//! ```no_run
//! use prometheus_middleware::observability::{init, LogFormat, ObservabilityConfig};
//!
//! // From environment variables
//! init(ObservabilityConfig::from_env())?;
//!
//! // Or programmatically
//! let config = ObservabilityConfig::builder()
//!     .log_format(LogFormat::Json)
//!     .log_filter("prometheus_middleware=debug,tower_http=info")
//!     .build();
//! # let _ = config;
//! # Ok::<(), prometheus_middleware::observability::ObservabilityError>(())
//! ```

mod config;
pub mod metrics;
mod providers;

pub use config::{LogFormat, ObservabilityConfig, ObservabilityConfigBuilder};

use tracing::info;

/// Initialize logging.
///
/// Must be called once at application startup, before any logging occurs.
///
/// # Errors
///
/// Returns an error if the log filter cannot be parsed or a global
/// subscriber is already installed.
pub fn init(config: ObservabilityConfig) -> Result<(), ObservabilityError> {
    providers::init_tracing(&config)?;

    info!(
        log_format = ?config.log_format,
        log_filter = %config.log_filter,
        "Observability initialized"
    );

    Ok(())
}

/// Observability initialization errors
#[derive(Debug)]
pub enum ObservabilityError {
    /// Invalid configuration
    Config(String),
    /// Subscriber installation failed
    Provider(String),
}

impl std::fmt::Display for ObservabilityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Observability config error: {}", msg),
            Self::Provider(msg) => write!(f, "Provider error: {}", msg),
        }
    }
}

impl std::error::Error for ObservabilityError {}
