//! Layered configuration loading.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use keystone_telemetry::LogFormat;

use crate::{ConfigError, KeystoneConfig};

/// Default prefix for environment overrides.
pub const DEFAULT_ENV_PREFIX: &str = "KEYSTONE";

/// Configuration loader.
///
/// Layers are applied in order, later ones overriding earlier ones:
/// 1. Defaults (or a preset)
/// 2. Configuration file or string (TOML or JSON); fields the file leaves
///    out take their default values
/// 3. Environment variables `PREFIX__SECTION__KEY`
///
/// # Example
///
/// ```no_run
/// use keystone_config::ConfigLoader;
///
/// # fn main() -> Result<(), keystone_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_optional_file("keystone.toml")?
///     .with_env_prefix("KEYSTONE")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: KeystoneConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader holding the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: KeystoneConfig::default(),
            env_prefix: None,
        }
    }

    /// Resets to the default configuration.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = KeystoneConfig::default();
        self
    }

    /// Resets to the development preset.
    ///
    /// ```
    /// use keystone_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = KeystoneConfig::development();
        self
    }

    /// Loads a `.toml` or `.json` file.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing or unreadable, has an unsupported
    /// extension, does not parse, or contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        self.config = Self::parse_file(&content, path)?;

        Ok(self)
    }

    /// Loads a file if it exists.
    ///
    /// # Errors
    ///
    /// Same as [`with_file`](Self::with_file) when the file exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration from a string in `format` (`"toml"` or `"json"`).
    ///
    /// ```
    /// use keystone_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [jsonapi]
    ///     base_url = "https://service.local"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.jsonapi.base_url, "https://service.local");
    /// assert_eq!(config.jsonapi.max_include_depth, 3);
    /// ```
    ///
    /// # Errors
    ///
    /// Fails on an unsupported format or a parse error.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Enables environment overrides under `prefix`.
    ///
    /// With prefix `KEYSTONE`, `KEYSTONE__JSONAPI__BASE_URL` overrides
    /// `jsonapi.base_url`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads `.env` from the current directory or its ancestors, if present.
    ///
    /// Variables already set in the process are not overridden.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Dotenv`] if a `.env` file exists but cannot be
    /// parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::Dotenv(e.to_string())),
        }
    }

    /// Loads variables from a specific dotenv file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Dotenv`] if the file is missing or malformed.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref()).map_err(|e| ConfigError::Dotenv(e.to_string()))?;
        Ok(self)
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Fails if an override does not parse or validation fails.
    pub fn load(mut self) -> Result<KeystoneConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Returns the configuration without environment overrides or
    /// validation.
    #[must_use]
    pub fn load_unvalidated(self) -> KeystoneConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<KeystoneConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        let env_vars: HashMap<String, String> = env::vars()
            .filter(|(k, _)| k.starts_with(&marker))
            .collect();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();

        match parts.as_slice() {
            ["JSONAPI", "BASE_URL"] => {
                self.config.jsonapi.base_url = value.to_string();
            }
            ["JSONAPI", "MAX_INCLUDE_DEPTH"] => {
                self.config.jsonapi.max_include_depth = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }

            ["TELEMETRY", "SERVICE_NAME"] => {
                self.config.telemetry.service_name = value.to_string();
            }

            ["TELEMETRY", "LOGGING", "ENABLED"] => {
                self.config.telemetry.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["TELEMETRY", "LOGGING", "LEVEL"] => {
                self.config.telemetry.logging.level = value.to_string();
            }
            ["TELEMETRY", "LOGGING", "FORMAT"] => {
                self.config.telemetry.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["TELEMETRY", "LOGGING", "INCLUDE_LOCATION"] => {
                self.config.telemetry.logging.include_location = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            ["TELEMETRY", "METRICS", "ENABLED"] => {
                self.config.telemetry.metrics.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            _ => {}
        }

        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().with_defaults().load().unwrap();
        assert_eq!(config, KeystoneConfig::default());
    }

    #[test]
    fn test_with_string_json() {
        let json = r#"{"jsonapi": {"max_include_depth": 5}, "telemetry": {"service_name": "tasks-api"}}"#;

        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.jsonapi.max_include_depth, 5);
        assert_eq!(config.jsonapi.base_url, "http://localhost:8080");
        assert_eq!(config.telemetry.service_name, "tasks-api");
    }

    #[test]
    fn test_with_string_unknown_format() {
        let result = ConfigLoader::new().with_string("", "yaml");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_with_file_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[jsonapi]
base_url = "https://service.local"

[telemetry.logging]
format = "pretty"
"#
        )
        .unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();

        assert_eq!(config.jsonapi.base_url, "https://service.local");
        assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);
        assert_eq!(config.telemetry.logging.level, "info");
    }

    #[test]
    fn test_with_file_unknown_field() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[jsonapi]\nbase = \"https://service.local\"").unwrap();

        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_with_file_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/keystone.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/keystone.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.jsonapi.max_include_depth, 3);
    }

    #[test]
    fn test_load_validates() {
        let result = ConfigLoader::new()
            .with_string("[jsonapi]\nmax_include_depth = 0", "toml")
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_load_unvalidated() {
        let config = ConfigLoader::new()
            .with_string("[jsonapi]\nmax_include_depth = 0", "toml")
            .unwrap()
            .load_unvalidated();
        assert_eq!(config.jsonapi.max_include_depth, 0);
    }

    #[test]
    fn test_apply_env_var_jsonapi() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__JSONAPI__BASE_URL", "https://api.local", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__JSONAPI__MAX_INCLUDE_DEPTH", "2", "TEST")
            .unwrap();
        assert_eq!(loader.config.jsonapi.base_url, "https://api.local");
        assert_eq!(loader.config.jsonapi.max_include_depth, 2);
    }

    #[test]
    fn test_apply_env_var_telemetry() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__TELEMETRY__SERVICE_NAME", "tasks-api", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__TELEMETRY__LOGGING__FORMAT", "Pretty", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__TELEMETRY__METRICS__ENABLED", "off", "TEST")
            .unwrap();
        assert_eq!(loader.config.telemetry.service_name, "tasks-api");
        assert_eq!(loader.config.telemetry.logging.format, LogFormat::Pretty);
        assert!(!loader.config.telemetry.metrics.enabled);
    }

    #[test]
    fn test_apply_env_var_invalid_values() {
        let mut loader = ConfigLoader::new();
        for (key, value) in [
            ("TEST__JSONAPI__MAX_INCLUDE_DEPTH", "deep"),
            ("TEST__TELEMETRY__LOGGING__ENABLED", "maybe"),
            ("TEST__TELEMETRY__LOGGING__FORMAT", "xml"),
        ] {
            let result = loader.apply_env_var(key, value, "TEST");
            assert!(matches!(result, Err(ConfigError::EnvParseError { .. })), "{key}");
        }
    }

    #[test]
    fn test_apply_env_var_unknown_key_ignored() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__SERVER__PORT", "9000", "TEST").unwrap();
        assert_eq!(loader.config, KeystoneConfig::default());
    }

    #[test]
    fn test_dotenv_file_feeds_env_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "KSDOTENVTEST__JSONAPI__MAX_INCLUDE_DEPTH=4").unwrap();
        writeln!(file, "KSDOTENVTEST__TELEMETRY__SERVICE_NAME=from-dotenv").unwrap();

        let config = ConfigLoader::new()
            .with_dotenv_file(file.path())
            .unwrap()
            .with_env_prefix("ksdotenvtest")
            .load()
            .unwrap();

        assert_eq!(config.jsonapi.max_include_depth, 4);
        assert_eq!(config.telemetry.service_name, "from-dotenv");
    }

    #[test]
    fn test_parse_bool() {
        for truthy in ["true", "True", "1", "yes", "on"] {
            assert_eq!(parse_bool(truthy), Some(true), "{truthy}");
        }
        for falsy in ["false", "FALSE", "0", "no", "off"] {
            assert_eq!(parse_bool(falsy), Some(false), "{falsy}");
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }
}
