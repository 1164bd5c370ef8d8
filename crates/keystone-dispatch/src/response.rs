//! Dispatch outcomes.

use http::StatusCode;
use keystone_core::{ErrorData, KeystoneError, Linkage, QueryParams, Resource};
use keystone_router::JsonPath;

/// A single resource (or `null`) result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceResponse {
    /// The resource, or `None` for an empty to-one relationship or no content.
    pub data: Option<Resource>,
    /// The path that produced the response.
    pub path: JsonPath,
    /// The query parameters of the request.
    pub params: QueryParams,
    /// `200`, `201` or `204`.
    pub status: StatusCode,
}

impl ResourceResponse {
    /// A `200 OK` response.
    pub fn ok(data: Option<Resource>, path: &JsonPath, params: &QueryParams) -> Self {
        Self {
            data,
            path: path.clone(),
            params: params.clone(),
            status: StatusCode::OK,
        }
    }

    /// A `201 Created` response.
    pub fn created(data: Resource, path: &JsonPath, params: &QueryParams) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(Some(data), path, params)
        }
    }

    /// A `204 No Content` response.
    pub fn no_content(path: &JsonPath, params: &QueryParams) -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            ..Self::ok(None, path, params)
        }
    }
}

/// A collection result.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionResponse {
    /// The resources.
    pub data: Vec<Resource>,
    /// The path that produced the response.
    pub path: JsonPath,
    /// The query parameters of the request.
    pub params: QueryParams,
}

/// A linkage-only result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkageResponse {
    /// The relationship linkage.
    pub linkage: Linkage,
    /// The path that produced the response.
    pub path: JsonPath,
    /// The query parameters of the request.
    pub params: QueryParams,
}

/// A mapped failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Error objects.
    pub errors: Vec<ErrorData>,
    /// HTTP status.
    pub status: StatusCode,
}

impl ErrorResponse {
    /// Creates an error response.
    pub fn new(status: StatusCode, errors: Vec<ErrorData>) -> Self {
        Self { errors, status }
    }

    /// Builds the response from an error's own status and error object.
    pub fn from_error(error: &KeystoneError) -> Self {
        Self::new(error.status_code(), vec![error.to_error_data()])
    }
}

/// The outcome of dispatching a request. Exactly one variant per request.
#[derive(Debug, Clone, PartialEq)]
pub enum BaseResponse {
    /// Single resource (or `null`, or no content).
    Resource(ResourceResponse),
    /// Collection.
    Collection(CollectionResponse),
    /// Relationship linkage.
    Linkage(LinkageResponse),
    /// Mapped failure.
    Error(ErrorResponse),
}

impl BaseResponse {
    /// HTTP status of the response.
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Resource(response) => response.status,
            Self::Collection(_) | Self::Linkage(_) => StatusCode::OK,
            Self::Error(response) => response.status,
        }
    }

    /// Returns `true` for [`BaseResponse::Error`].
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<ResourceResponse> for BaseResponse {
    fn from(response: ResourceResponse) -> Self {
        Self::Resource(response)
    }
}

impl From<CollectionResponse> for BaseResponse {
    fn from(response: CollectionResponse) -> Self {
        Self::Collection(response)
    }
}

impl From<LinkageResponse> for BaseResponse {
    fn from(response: LinkageResponse) -> Self {
        Self::Linkage(response)
    }
}

impl From<ErrorResponse> for BaseResponse {
    fn from(response: ErrorResponse) -> Self {
        Self::Error(response)
    }
}
