//! Observability for Keystone.
//!
//! - **Logging**: structured JSON or pretty output via `tracing-subscriber`
//! - **Metrics**: Prometheus text format via the `metrics` crate
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `keystone_requests_total` | Counter | `path_kind`, `method`, `status` |
//! | `keystone_request_duration_seconds` | Histogram | `path_kind` |
//! | `keystone_mapped_failures_total` | Counter | `kind` |
//!
//! # Example
//!
//! ```rust,no_run
//! use keystone_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::builder().service_name("tasks-api").build();
//! init_telemetry(&config).unwrap();
//!
//! println!("{}", keystone_telemetry::metrics::render_metrics().unwrap_or_default());
//! ```

#![doc(html_root_url = "https://docs.rs/keystone-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use metrics::{init_metrics, render_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns the first subsystem failure.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    tracing::debug!(service = %config.service_name, "Telemetry initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_telemetry() {
        let config = TelemetryConfig::builder()
            .logging(LogConfig {
                enabled: false,
                ..LogConfig::default()
            })
            .metrics(MetricsConfig {
                enabled: false,
                ..MetricsConfig::default()
            })
            .build();
        assert!(init_telemetry(&config).is_ok());
        assert!(render_metrics().is_none());
    }
}
