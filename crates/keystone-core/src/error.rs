//! Error types for Keystone.
//!
//! This module provides [`KeystoneError`], the failure type raised by path
//! parsing, controllers, repositories and serialization, together with the
//! [`ErrorKind`] used to look up exception mappers and the wire-level
//! [`ErrorData`] object that ends up in `{"errors": [...]}` documents.
//!
//! # Kinds and statuses
//!
//! | `ErrorKind` | Default status | Mapped by default |
//! |---|---|---|
//! | `ResourceNotFound` | 404 | yes |
//! | `ResourceFieldNotFound` | 400 | yes |
//! | `InvalidPath` | 400 | yes |
//! | `InvalidIdentifier` | 400 | yes |
//! | `RequestBody` | 400 | yes |
//! | `QueryParameters` | 400 | yes |
//! | `NoMatchingController` | 500 | never |
//! | `Repository` | 500 | no |
//! | `Internal` | 500 | no |

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`KeystoneError`].
pub type KeystoneResult<T> = Result<T, KeystoneError>;

/// Failure kinds, used as the lookup key for exception mappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A resource type or resource instance does not exist.
    ResourceNotFound,
    /// A relationship or attribute name is not declared on the resource type.
    ResourceFieldNotFound,
    /// The path has an invalid shape.
    InvalidPath,
    /// An identifier could not be converted to the resource's id type.
    InvalidIdentifier,
    /// The request body is missing or does not match the request.
    RequestBody,
    /// A query parameter is malformed or references unknown fields.
    QueryParameters,
    /// No controller accepts a structurally valid path and method.
    NoMatchingController,
    /// A repository reported a failure.
    Repository,
    /// Unexpected failure.
    Internal,
}

impl ErrorKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::ResourceNotFound,
        Self::ResourceFieldNotFound,
        Self::InvalidPath,
        Self::InvalidIdentifier,
        Self::RequestBody,
        Self::QueryParameters,
        Self::NoMatchingController,
        Self::Repository,
        Self::Internal,
    ];

    /// Returns the default HTTP status code for this kind.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::ResourceNotFound => StatusCode::NOT_FOUND,
            Self::ResourceFieldNotFound
            | Self::InvalidPath
            | Self::InvalidIdentifier
            | Self::RequestBody
            | Self::QueryParameters => StatusCode::BAD_REQUEST,
            Self::NoMatchingController | Self::Repository | Self::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns `true` for failures caused by the client request.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::ResourceNotFound
                | Self::ResourceFieldNotFound
                | Self::InvalidPath
                | Self::InvalidIdentifier
                | Self::RequestBody
                | Self::QueryParameters
        )
    }

    /// Returns `true` if a mapper may be registered for this kind.
    ///
    /// Routing configuration failures always cross the dispatcher unchanged.
    #[must_use]
    pub const fn is_mappable(&self) -> bool {
        !matches!(self, Self::NoMatchingController)
    }

    /// Human-readable title used in error documents.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::ResourceNotFound => "Resource not found",
            Self::ResourceFieldNotFound => "Resource field not found",
            Self::InvalidPath => "Invalid path",
            Self::InvalidIdentifier => "Invalid identifier",
            Self::RequestBody => "Request body error",
            Self::QueryParameters => "Invalid query parameters",
            Self::NoMatchingController => "No matching controller",
            Self::Repository => "Repository failure",
            Self::Internal => "Internal error",
        }
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Self::ResourceFieldNotFound => "RESOURCE_FIELD_NOT_FOUND",
            Self::InvalidPath => "INVALID_PATH",
            Self::InvalidIdentifier => "INVALID_IDENTIFIER",
            Self::RequestBody => "REQUEST_BODY_ERROR",
            Self::QueryParameters => "INVALID_QUERY_PARAMETERS",
            Self::NoMatchingController => "NO_MATCHING_CONTROLLER",
            Self::Repository => "REPOSITORY_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

/// Standard error type for Keystone.
///
/// # Example
///
/// ```
/// use keystone_core::{ErrorKind, KeystoneError};
///
/// let error = KeystoneError::resource_not_found("tasks", "42");
/// assert_eq!(error.kind(), ErrorKind::ResourceNotFound);
/// assert_eq!(error.status_code().as_u16(), 404);
/// ```
#[derive(Error, Debug)]
pub enum KeystoneError {
    /// Resource type or instance not found.
    #[error("{message}")]
    ResourceNotFound {
        /// Human-readable error message.
        message: String,
        /// The resource type, if known.
        resource_type: Option<String>,
        /// The identifier, if the failure concerns an instance.
        resource_id: Option<String>,
    },

    /// Field not declared on a resource type.
    #[error("field '{field}' is not declared on resource type '{resource_type}'")]
    ResourceFieldNotFound {
        /// The resource type searched.
        resource_type: String,
        /// The unknown field name.
        field: String,
        /// JSON pointer to the offending member when the name came from the
        /// request body.
        pointer: Option<String>,
    },

    /// Path shape is invalid.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The offending path.
        path: String,
        /// Why the path was rejected.
        reason: String,
    },

    /// Identifier conversion failed.
    #[error("invalid identifier '{value}' for resource type '{resource_type}': {reason}")]
    InvalidIdentifier {
        /// The resource type whose id type was applied.
        resource_type: String,
        /// The raw identifier.
        value: String,
        /// Conversion failure.
        reason: String,
    },

    /// Request body does not meet the requirements of the request.
    #[error(
        "Request body doesn't meet the requirements ({details}), {method} method, resource name {resource_type}"
    )]
    RequestBody {
        /// The request method.
        method: Method,
        /// The resource type addressed by the request.
        resource_type: String,
        /// What is wrong with the body.
        details: String,
    },

    /// Query parameter rejected.
    #[error("invalid query parameter '{parameter}': {reason}")]
    QueryParameters {
        /// The parameter name as received.
        parameter: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No registered controller accepts the path and method.
    #[error("no controller accepts {method} {path}")]
    NoMatchingController {
        /// The request method.
        method: Method,
        /// The parsed path, rendered back to a string.
        path: String,
        /// Methods that some controller accepts for this path.
        allowed: Vec<Method>,
    },

    /// Repository failure.
    #[error("repository failure: {message}")]
    Repository {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Internal failure.
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl KeystoneError {
    /// Creates a not-found error with a free-form message.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            message: message.into(),
            resource_type: None,
            resource_id: None,
        }
    }

    /// Creates a not-found error for an unregistered resource type.
    #[must_use]
    pub fn resource_type_not_found(resource_type: impl Into<String>) -> Self {
        let resource_type = resource_type.into();
        Self::ResourceNotFound {
            message: format!("resource type '{resource_type}' is not registered"),
            resource_type: Some(resource_type),
            resource_id: None,
        }
    }

    /// Creates a not-found error for a resource instance.
    #[must_use]
    pub fn resource_not_found(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        let resource_type = resource_type.into();
        let resource_id = resource_id.into();
        Self::ResourceNotFound {
            message: format!("resource '{resource_type}' with id '{resource_id}' not found"),
            resource_type: Some(resource_type),
            resource_id: Some(resource_id),
        }
    }

    /// Creates a field-not-found error.
    #[must_use]
    pub fn field_not_found(resource_type: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ResourceFieldNotFound {
            resource_type: resource_type.into(),
            field: field.into(),
            pointer: None,
        }
    }

    /// Points a field-not-found error at the request body member `pointer`.
    ///
    /// Other errors are returned unchanged.
    #[must_use]
    pub fn at_pointer(self, pointer: impl Into<String>) -> Self {
        match self {
            Self::ResourceFieldNotFound { resource_type, field, .. } => Self::ResourceFieldNotFound {
                resource_type,
                field,
                pointer: Some(pointer.into()),
            },
            other => other,
        }
    }

    /// Creates an invalid path error.
    #[must_use]
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an identifier conversion error.
    #[must_use]
    pub fn invalid_identifier(
        resource_type: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidIdentifier {
            resource_type: resource_type.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Creates a request body error.
    #[must_use]
    pub fn request_body(
        method: &Method,
        resource_type: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::RequestBody {
            method: method.clone(),
            resource_type: resource_type.into(),
            details: details.into(),
        }
    }

    /// Creates a query parameter error.
    #[must_use]
    pub fn query_parameters(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::QueryParameters {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Creates a routing configuration error.
    #[must_use]
    pub fn no_matching_controller(method: &Method, path: impl Into<String>, allowed: Vec<Method>) -> Self {
        Self::NoMatchingController {
            method: method.clone(),
            path: path.into(),
            allowed,
        }
    }

    /// Creates a repository error.
    #[must_use]
    pub fn repository(message: impl Into<String>) -> Self {
        Self::Repository {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a repository error wrapping its cause.
    pub fn repository_with_source(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Repository {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error wrapping its cause.
    pub fn internal_with_source(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the failure kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            Self::ResourceFieldNotFound { .. } => ErrorKind::ResourceFieldNotFound,
            Self::InvalidPath { .. } => ErrorKind::InvalidPath,
            Self::InvalidIdentifier { .. } => ErrorKind::InvalidIdentifier,
            Self::RequestBody { .. } => ErrorKind::RequestBody,
            Self::QueryParameters { .. } => ErrorKind::QueryParameters,
            Self::NoMatchingController { .. } => ErrorKind::NoMatchingController,
            Self::Repository { .. } => ErrorKind::Repository,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.kind().default_status_code()
    }

    /// Builds the error object rendered to clients.
    #[must_use]
    pub fn to_error_data(&self) -> ErrorData {
        let kind = self.kind();
        let builder = ErrorData::builder()
            .status(self.status_code())
            .code(kind.code())
            .title(kind.title())
            .detail(self.to_string());

        match self {
            Self::QueryParameters { parameter, .. } => builder.source_parameter(parameter.clone()),
            Self::RequestBody { .. } => builder.source_pointer("/data"),
            Self::ResourceFieldNotFound { pointer: Some(pointer), .. } => builder.source_pointer(pointer.clone()),
            _ => builder,
        }
        .build()
    }
}

/// A single entry of a JSON:API `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorData {
    /// Unique identifier for this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// HTTP status code, as a string.
    pub status: String,
    /// Application-specific error code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short summary of the problem.
    pub title: String,
    /// Explanation specific to this occurrence.
    pub detail: String,
    /// Reference to the part of the request that caused the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
}

impl ErrorData {
    /// Creates a new [`ErrorDataBuilder`].
    #[must_use]
    pub fn builder() -> ErrorDataBuilder {
        ErrorDataBuilder::default()
    }
}

/// Location of the cause of an error inside the request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorSource {
    /// JSON pointer into the request document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
    /// Query parameter that caused the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

/// Builder for [`ErrorData`].
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct ErrorDataBuilder {
    id: Option<String>,
    status: Option<StatusCode>,
    code: Option<String>,
    title: Option<String>,
    detail: Option<String>,
    source: Option<ErrorSource>,
}

impl ErrorDataBuilder {
    /// Sets the occurrence id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the status code.
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the application error code.
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Sets the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the detail.
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Points the error at a location in the request document.
    pub fn source_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.source.get_or_insert_with(ErrorSource::default).pointer = Some(pointer.into());
        self
    }

    /// Points the error at a query parameter.
    pub fn source_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.source.get_or_insert_with(ErrorSource::default).parameter = Some(parameter.into());
        self
    }

    /// Builds the error object. Status defaults to 500.
    #[must_use]
    pub fn build(self) -> ErrorData {
        let status = self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        ErrorData {
            id: self.id,
            status: status.as_u16().to_string(),
            code: self.code,
            title: self
                .title
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Error").to_string()),
            detail: self.detail.unwrap_or_default(),
            source: self.source,
        }
    }
}

/// Errors raised while building registries at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InitializationError {
    /// A resource definition is malformed.
    #[error("invalid resource '{resource_type}': {reason}")]
    InvalidResource {
        /// The resource type name.
        resource_type: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The same resource type was registered twice.
    #[error("resource type '{0}' is registered more than once")]
    DuplicateResource(String),

    /// A relationship targets an unregistered type.
    #[error("relationship '{relationship}' on '{resource_type}' targets unregistered type '{target}'")]
    UnknownRelationshipTarget {
        /// The declaring resource type.
        resource_type: String,
        /// The relationship name.
        relationship: String,
        /// The missing target type.
        target: String,
    },

    /// A declared relationship has no repository.
    #[error("relationship '{relationship}' on '{resource_type}' has no relationship repository")]
    MissingRelationshipRepository {
        /// The declaring resource type.
        resource_type: String,
        /// The relationship name.
        relationship: String,
    },

    /// A relationship repository was registered for an undeclared relationship.
    #[error("relationship repository registered for undeclared relationship '{relationship}' on '{resource_type}'")]
    UndeclaredRelationship {
        /// The resource type.
        resource_type: String,
        /// The relationship name.
        relationship: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_not_found() {
        let error = KeystoneError::resource_not_found("tasks", "7");
        assert_eq!(error.kind(), ErrorKind::ResourceNotFound);
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        assert!(error.to_string().contains("tasks"));
        assert!(error.to_string().contains('7'));
    }

    #[test]
    fn test_request_body_detail_format() {
        let error = KeystoneError::request_body(&Method::POST, "tasks", "no data field");
        assert_eq!(
            error.to_string(),
            "Request body doesn't meet the requirements (no data field), POST method, resource name tasks"
        );

        let data = error.to_error_data();
        assert_eq!(data.status, "400");
        assert_eq!(data.title, "Request body error");
        assert_eq!(data.source.and_then(|s| s.pointer).as_deref(), Some("/data"));
    }

    #[test]
    fn test_field_not_found_pointer_only_for_body_fields() {
        let from_path = KeystoneError::field_not_found("tasks", "owner").to_error_data();
        assert_eq!(from_path.status, "400");
        assert!(from_path.source.is_none());

        let from_body = KeystoneError::field_not_found("tasks", "priority")
            .at_pointer("/data/attributes/priority")
            .to_error_data();
        assert_eq!(
            from_body.source.and_then(|s| s.pointer).as_deref(),
            Some("/data/attributes/priority")
        );

        let unchanged = KeystoneError::resource_not_found("tasks", "1").at_pointer("/data");
        assert_eq!(unchanged.kind(), ErrorKind::ResourceNotFound);
        assert!(unchanged.to_error_data().source.is_none());
    }

    #[test]
    fn test_query_parameter_source() {
        let data = KeystoneError::query_parameters("page[limit]", "expected integer").to_error_data();
        assert_eq!(data.code.as_deref(), Some("INVALID_QUERY_PARAMETERS"));
        assert_eq!(
            data.source.and_then(|s| s.parameter).as_deref(),
            Some("page[limit]")
        );
    }

    #[test]
    fn test_internal_error_source_chain() {
        let error = KeystoneError::internal_with_source("division failed", anyhow::anyhow!("divide by zero"));
        assert_eq!(error.kind(), ErrorKind::Internal);
        let source = std::error::Error::source(&error).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("divide by zero"));
    }

    #[test]
    fn test_routing_failure_is_not_mappable() {
        let error = KeystoneError::no_matching_controller(&Method::PUT, "/tasks", vec![Method::GET]);
        assert_eq!(error.kind(), ErrorKind::NoMatchingController);
        assert!(!error.kind().is_mappable());
        assert!(!error.kind().is_client_error());
        assert!(error.status_code().is_server_error());
    }

    #[test]
    fn test_client_kinds_map_to_4xx() {
        for kind in ErrorKind::ALL {
            let status = kind.default_status_code();
            if kind.is_client_error() {
                assert!(status.is_client_error(), "{kind:?} should be 4xx, got {status}");
            } else {
                assert!(status.is_server_error(), "{kind:?} should be 5xx, got {status}");
            }
        }
    }

    #[test]
    fn test_error_data_builder_defaults() {
        let data = ErrorData::builder().detail("boom").build();
        assert_eq!(data.status, "500");
        assert_eq!(data.title, "Internal Server Error");

        let json = serde_json::to_value(&data).expect("serialization should work");
        assert!(json.get("id").is_none());
        assert!(json.get("source").is_none());
        assert_eq!(json["detail"], "boom");
    }
}
