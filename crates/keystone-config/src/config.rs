//! Root configuration type.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{ConfigError, JsonApiConfig, TelemetrySection};

/// Complete Keystone configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to layer files and environment
/// variables over the defaults.
///
/// # Example
///
/// ```
/// use keystone_config::KeystoneConfig;
///
/// let config = KeystoneConfig::default();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct KeystoneConfig {
    /// Document settings.
    #[serde(default)]
    pub jsonapi: JsonApiConfig,

    /// Logging and metrics.
    #[serde(default)]
    pub telemetry: TelemetrySection,
}

impl KeystoneConfig {
    /// Development preset: debug level, pretty output with locations.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = keystone_telemetry::LogFormat::Pretty;
        config.telemetry.logging.include_location = true;
        config
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for the first invalid field:
    /// - `jsonapi.base_url` is neither empty nor an absolute `http(s)` URL
    ///   without query or fragment
    /// - `jsonapi.max_include_depth` is zero
    /// - `telemetry.service_name` is empty
    /// - `telemetry.logging.level` is not a valid filter
    /// - `telemetry.metrics.duration_buckets` is empty or not ascending
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url(&self.jsonapi.base_url)?;

        if self.jsonapi.max_include_depth == 0 {
            return Err(ConfigError::invalid_value(
                "jsonapi.max_include_depth",
                "must be at least 1",
            ));
        }

        if self.telemetry.service_name.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "telemetry.service_name",
                "must not be empty",
            ));
        }

        if let Err(e) = keystone_telemetry::logging::create_env_filter(&self.telemetry.logging.level) {
            return Err(ConfigError::invalid_value(
                "telemetry.logging.level",
                e.to_string(),
            ));
        }

        let buckets = &self.telemetry.metrics.duration_buckets;
        if buckets.is_empty() || !buckets.windows(2).all(|w| w[0] < w[1]) {
            return Err(ConfigError::invalid_value(
                "telemetry.metrics.duration_buckets",
                "must be a non-empty ascending list",
            ));
        }

        Ok(())
    }
}

fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    const FIELD: &str = "jsonapi.base_url";

    if base_url.is_empty() {
        return Ok(());
    }

    let url = Url::parse(base_url)
        .map_err(|e| ConfigError::invalid_value(FIELD, format!("{base_url}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid_value(
            FIELD,
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::invalid_value(
            FIELD,
            "must not carry a query or fragment",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_base_url(base_url: &str) -> KeystoneConfig {
        let mut config = KeystoneConfig::default();
        config.jsonapi.base_url = base_url.to_string();
        config
    }

    #[test]
    fn test_default_is_valid() {
        assert!(KeystoneConfig::default().validate().is_ok());
        assert!(KeystoneConfig::development().validate().is_ok());
    }

    #[test]
    fn test_base_url_validation() {
        for ok in ["", "https://service.local", "http://localhost:8080/api/"] {
            assert!(with_base_url(ok).validate().is_ok(), "{ok}");
        }
        for bad in [
            "service.local",
            "ftp://service.local",
            "https://service.local?x=1",
            "https://service.local#top",
        ] {
            assert!(
                matches!(
                    with_base_url(bad).validate(),
                    Err(ConfigError::InvalidValue { ref field, .. }) if field == "jsonapi.base_url"
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_zero_include_depth_rejected() {
        let mut config = KeystoneConfig::default();
        config.jsonapi.max_include_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = KeystoneConfig::default();
        config.telemetry.logging.level = "keystone=loud".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("telemetry.logging.level"));
    }

    #[test]
    fn test_unsorted_buckets_rejected() {
        let mut config = KeystoneConfig::default();
        config.telemetry.metrics.duration_buckets = vec![0.5, 0.1];
        assert!(config.validate().is_err());
    }
}
