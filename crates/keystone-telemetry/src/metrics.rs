//! Prometheus metrics for Keystone.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `keystone_requests_total` | Counter | `path_kind`, `method`, `status` | Dispatched requests |
//! | `keystone_request_duration_seconds` | Histogram | `path_kind` | Dispatch latency |
//! | `keystone_mapped_failures_total` | Counter | `kind` | Failures turned into error documents |
//!
//! Recording is a no-op until [`init_metrics`] installs the recorder.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use keystone_telemetry::metrics::record_request;
//!
//! record_request("collection", "GET", 200, Duration::from_millis(3));
//! ```

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Request counter name.
pub const REQUESTS_TOTAL: &str = "keystone_requests_total";

/// Request duration histogram name.
pub const REQUEST_DURATION_SECONDS: &str = "keystone_request_duration_seconds";

/// Mapped failure counter name.
pub const MAPPED_FAILURES_TOTAL: &str = "keystone_mapped_failures_total";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Histogram buckets for request duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // 100µs to 1s
            duration_buckets: vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0],
        }
    }
}

/// Installs the Prometheus recorder.
///
/// No HTTP listener is started; use [`render_metrics`] to expose the text
/// format. Calling this again after a successful install is a no-op.
///
/// # Errors
///
/// Returns [`TelemetryError::MetricsInit`] if the recorder cannot be built or
/// another global recorder is installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled || METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);
    register_metric_descriptions();

    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total number of dispatched JSON:API requests");
    describe_histogram!(REQUEST_DURATION_SECONDS, "Request dispatch duration in seconds");
    describe_counter!(
        MAPPED_FAILURES_TOTAL,
        "Total number of failures rendered as error documents"
    );
}

/// Records a completed request.
///
/// `path_kind` is the path shape (`collection`, `resource`, `field`,
/// `relationships`, or `invalid` when the path did not parse).
pub fn record_request(path_kind: &str, method: &str, status_code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "path_kind" => path_kind.to_string(),
        "method" => method.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION_SECONDS, "path_kind" => path_kind.to_string()).record(duration.as_secs_f64());
}

/// Records a failure that was mapped to an error document.
pub fn record_mapped_failure(kind: &str) {
    counter!(MAPPED_FAILURES_TOTAL, "kind" => kind.to_string()).increment(1);
}
