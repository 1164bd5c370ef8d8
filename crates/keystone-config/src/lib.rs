//! Typed configuration for Keystone.
//!
//! - TOML and JSON files
//! - Environment overrides `PREFIX__SECTION__KEY`
//! - Strict parsing: unknown fields are rejected
//! - Validation after all layers are applied
//!
//! # Configuration File Format
//!
//! ```toml
//! [jsonapi]
//! base_url = "https://service.local"
//! max_include_depth = 3
//!
//! [telemetry]
//! service_name = "tasks-api"
//!
//! [telemetry.logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! include_location = false
//!
//! [telemetry.metrics]
//! enabled = true
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `KEYSTONE__JSONAPI__BASE_URL`
//! - `KEYSTONE__JSONAPI__MAX_INCLUDE_DEPTH`
//! - `KEYSTONE__TELEMETRY__SERVICE_NAME`
//! - `KEYSTONE__TELEMETRY__LOGGING__ENABLED`, `__LEVEL`, `__FORMAT`,
//!   `__INCLUDE_LOCATION`
//! - `KEYSTONE__TELEMETRY__METRICS__ENABLED`
//!
//! # Example
//!
//! ```no_run
//! use keystone_config::{ConfigLoader, DEFAULT_ENV_PREFIX};
//!
//! # fn main() -> Result<(), keystone_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()?
//!     .with_optional_file("keystone.toml")?
//!     .with_env_prefix(DEFAULT_ENV_PREFIX)
//!     .load()?;
//!
//! println!("links are rooted at {}", config.jsonapi.base_url);
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/keystone-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::KeystoneConfig;
pub use error::ConfigError;
pub use keystone_telemetry::LogFormat;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{JsonApiConfig, LoggingSection, MetricsSection, TelemetrySection};
