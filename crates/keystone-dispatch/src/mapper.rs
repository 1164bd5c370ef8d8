//! Exception mappers.
//!
//! A mapper turns a failure of one [`ErrorKind`] into an [`ErrorResponse`].
//! Failures whose kind has no mapper are not converted and cross the
//! dispatcher unchanged.
//!
//! [`ErrorKind::NoMatchingController`] can never be mapped: routing
//! configuration failures always reach the host.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use keystone_core::{ErrorKind, KeystoneError};

use crate::response::ErrorResponse;

/// Converts a failure into an error response.
pub trait ExceptionMapper: Send + Sync {
    /// Builds the error response for `error`.
    fn to_error_response(&self, error: &KeystoneError) -> ErrorResponse;
}

impl<F> ExceptionMapper for F
where
    F: Fn(&KeystoneError) -> ErrorResponse + Send + Sync,
{
    fn to_error_response(&self, error: &KeystoneError) -> ErrorResponse {
        self(error)
    }
}

/// Mapper that uses the error's own status and error object.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExceptionMapper;

impl ExceptionMapper for DefaultExceptionMapper {
    fn to_error_response(&self, error: &KeystoneError) -> ErrorResponse {
        ErrorResponse::from_error(error)
    }
}

/// Mapping from failure kind to mapper.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use keystone_core::{ErrorData, ErrorKind, KeystoneError};
/// use keystone_dispatch::{ErrorResponse, ExceptionMapperRegistry};
///
/// let mappers = ExceptionMapperRegistry::with_defaults().with_mapper(
///     ErrorKind::Internal,
///     |error: &KeystoneError| {
///         let data = ErrorData::builder()
///             .status(StatusCode::BAD_REQUEST)
///             .title("Illegal state")
///             .detail(error.to_string())
///             .build();
///         ErrorResponse::new(StatusCode::BAD_REQUEST, vec![data])
///     },
/// );
///
/// assert!(mappers.mapper_for(ErrorKind::ResourceNotFound).is_some());
/// assert!(mappers.mapper_for(ErrorKind::Internal).is_some());
/// assert!(mappers.mapper_for(ErrorKind::Repository).is_none());
/// ```
#[derive(Clone, Default)]
pub struct ExceptionMapperRegistry {
    mappers: HashMap<ErrorKind, Arc<dyn ExceptionMapper>>,
}

impl ExceptionMapperRegistry {
    /// Creates an empty registry: nothing is mapped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry mapping every client-facing kind with
    /// [`DefaultExceptionMapper`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for kind in ErrorKind::ALL.into_iter().filter(ErrorKind::is_client_error) {
            registry.register(kind, DefaultExceptionMapper);
        }
        registry
    }

    /// Registers (or replaces) the mapper for `kind`.
    ///
    /// Returns `false`, and registers nothing, for kinds that cannot be
    /// mapped.
    pub fn register(&mut self, kind: ErrorKind, mapper: impl ExceptionMapper + 'static) -> bool {
        if !kind.is_mappable() {
            tracing::warn!(kind = ?kind, "Ignoring exception mapper for unmappable failure kind");
            return false;
        }
        self.mappers.insert(kind, Arc::new(mapper));
        true
    }

    /// Registers a mapper, builder style.
    #[must_use]
    pub fn with_mapper(mut self, kind: ErrorKind, mapper: impl ExceptionMapper + 'static) -> Self {
        self.register(kind, mapper);
        self
    }

    /// Returns the mapper for `kind`, if one is registered.
    pub fn mapper_for(&self, kind: ErrorKind) -> Option<&dyn ExceptionMapper> {
        self.mappers.get(&kind).map(|mapper| -> &dyn ExceptionMapper { mapper.as_ref() })
    }

    /// Returns `true` if `kind` has a mapper.
    pub fn contains(&self, kind: ErrorKind) -> bool {
        self.mappers.contains_key(&kind)
    }

    /// Mapped kinds.
    pub fn kinds(&self) -> impl Iterator<Item = ErrorKind> + '_ {
        self.mappers.keys().copied()
    }
}

impl fmt::Debug for ExceptionMapperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.kinds().map(|kind| format!("{kind:?}")).collect();
        kinds.sort();
        f.debug_struct("ExceptionMapperRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};

    #[test]
    fn test_defaults_cover_client_errors() {
        let mappers = ExceptionMapperRegistry::with_defaults();
        for kind in ErrorKind::ALL {
            assert_eq!(mappers.contains(kind), kind.is_client_error(), "{kind:?}");
        }
    }

    #[test]
    fn test_default_mapper_uses_error_status() {
        let error = KeystoneError::field_not_found("tasks", "owner");
        let response = DefaultExceptionMapper.to_error_response(&error);
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].status, "400");
    }

    #[test]
    fn test_unmappable_kind_is_rejected() {
        let mut mappers = ExceptionMapperRegistry::new();
        let registered = mappers.register(ErrorKind::NoMatchingController, DefaultExceptionMapper);
        assert!(!registered);
        assert!(mappers.mapper_for(ErrorKind::NoMatchingController).is_none());
    }

    #[test]
    fn test_closure_mapper() {
        let mappers = ExceptionMapperRegistry::new().with_mapper(ErrorKind::Repository, |_: &KeystoneError| {
            ErrorResponse::new(StatusCode::SERVICE_UNAVAILABLE, Vec::new())
        });
        let error = KeystoneError::repository("connection lost");
        let response = mappers
            .mapper_for(error.kind())
            .map(|mapper| mapper.to_error_response(&error))
            .unwrap();
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);

        let request = KeystoneError::request_body(&Method::POST, "tasks", "no data field");
        assert!(mappers.mapper_for(request.kind()).is_none());
    }
}
