//! Configuration section types.

use keystone_telemetry::{LogConfig, LogFormat, MetricsConfig, TelemetryConfig};
use serde::{Deserialize, Serialize};

/// JSON:API document settings.
///
/// # Example
///
/// ```
/// use keystone_config::JsonApiConfig;
///
/// let config = JsonApiConfig::default();
/// assert_eq!(config.base_url, "http://localhost:8080");
/// assert_eq!(config.max_include_depth, 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct JsonApiConfig {
    /// Absolute URL prefixed to every generated link. Empty yields
    /// root-relative links.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum number of segments in one `include` path.
    #[serde(default = "default_max_include_depth")]
    pub max_include_depth: usize,
}

impl Default for JsonApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            max_include_depth: default_max_include_depth(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_max_include_depth() -> usize {
    3
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directives.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include file and line in events.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::Json,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Enable the Prometheus recorder.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bucket boundaries for the request duration histogram, in seconds.
    #[serde(default = "default_duration_buckets")]
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_buckets: default_duration_buckets(),
        }
    }
}

fn default_duration_buckets() -> Vec<f64> {
    MetricsConfig::default().duration_buckets
}

/// Telemetry section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySection {
    /// Service name for log events.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsSection,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            logging: LoggingSection::default(),
            metrics: MetricsSection::default(),
        }
    }
}

impl TelemetrySection {
    /// Converts the section into the runtime telemetry configuration.
    ///
    /// ```
    /// use keystone_config::TelemetrySection;
    ///
    /// let telemetry = TelemetrySection::default().to_telemetry_config();
    /// assert_eq!(telemetry.service_name, "keystone");
    /// assert!(telemetry.logging.include_target);
    /// ```
    #[must_use]
    pub fn to_telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig::builder()
            .service_name(&self.service_name)
            .logging(LogConfig {
                enabled: self.logging.enabled,
                level: self.logging.level.clone(),
                format: self.logging.format,
                include_location: self.logging.include_location,
                include_target: true,
            })
            .metrics(MetricsConfig {
                enabled: self.metrics.enabled,
                duration_buckets: self.metrics.duration_buckets.clone(),
            })
            .build()
    }
}

fn default_service_name() -> String {
    "keystone".to_string()
}

fn default_true() -> bool {
    true
}
