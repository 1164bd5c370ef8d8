//! Pre-parsed transport requests.

use bytes::Bytes;
use http::Method;
use keystone_core::{KeystoneError, KeystoneResult, RequestBody};

/// A request as handed over by the transport layer.
///
/// # Example
///
/// ```
/// use keystone::JsonApiRequest;
/// use http::Method;
///
/// let request = JsonApiRequest::get("/tasks").with_query("include=project");
/// assert_eq!(request.method, Method::GET);
/// assert_eq!(request.query(), "include=project");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonApiRequest {
    /// HTTP method.
    pub method: Method,
    /// URL path, e.g. `/tasks/1/relationships/project`.
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    /// Raw request body.
    pub body: Option<Bytes>,
}

impl JsonApiRequest {
    /// Creates a request without query or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            body: None,
        }
    }

    /// `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PATCH` request.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// `DELETE` request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Sets the query string.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// The query string, empty when absent.
    pub fn query(&self) -> &str {
        self.query.as_deref().unwrap_or_default()
    }

    /// Parses the body. An absent or blank body yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`KeystoneError::RequestBody`] naming `resource_type` when the
    /// body is not a valid request document.
    pub fn parse_body(&self, resource_type: &str) -> KeystoneResult<Option<RequestBody>> {
        let Some(body) = self.body.as_ref().filter(|b| !b.iter().all(u8::is_ascii_whitespace)) else {
            return Ok(None);
        };
        serde_json::from_slice(body)
            .map(Some)
            .map_err(|e| KeystoneError::request_body(&self.method, resource_type, e.to_string()))
    }
}

impl From<http::Request<Bytes>> for JsonApiRequest {
    fn from(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            body: Some(body).filter(|b| !b.is_empty()),
        }
    }
}
