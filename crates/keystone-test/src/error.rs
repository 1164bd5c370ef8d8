//! Test error types.

use keystone_core::KeystoneError;
use thiserror::Error;

/// Errors that can occur while sending a test request.
#[derive(Debug, Error)]
pub enum TestError {
    /// The request could not be built.
    #[error("request build error: {0}")]
    RequestBuild(String),

    /// The body is not valid UTF-8.
    #[error("body read error: {0}")]
    BodyRead(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The application returned a failure without a mapper.
    #[error("unmapped failure: {0}")]
    Unmapped(#[from] KeystoneError),
}
