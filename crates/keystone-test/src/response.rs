//! Test response wrapper.

use std::fmt;

use bytes::Bytes;
use http::{header, HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::TestError;

/// A rendered response with JSON:API assertion helpers.
///
/// Assertions return `&Self` so they can be chained.
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Wraps an `http` response.
    pub fn from_http(response: http::Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Creates a response from raw parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self { status, headers, body }
    }

    /// Status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// `Content-Type` header, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as a string.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("invalid UTF-8: {e}")))
    }

    /// Deserializes the body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        serde_json::from_slice(&self.body).map_err(TestError::Json)
    }

    /// The body as a JSON value.
    pub fn json_value(&self) -> Result<Value, TestError> {
        self.json()
    }

    /// Looks up a JSON pointer (`/data/relationships/project/linkage`).
    ///
    /// `None` when the body is empty, not JSON, or lacks the pointer.
    #[must_use]
    pub fn pointer(&self, pointer: &str) -> Option<Value> {
        self.json_value().ok()?.pointer(pointer).cloned()
    }

    /// The primary `data` member.
    #[must_use]
    pub fn data(&self) -> Option<Value> {
        self.pointer("/data")
    }

    /// The `id` of the primary resource.
    #[must_use]
    pub fn data_id(&self) -> Option<String> {
        self.pointer("/data/id")
            .and_then(|id| id.as_str().map(str::to_string))
    }

    /// The `errors` member, empty when absent.
    #[must_use]
    pub fn errors(&self) -> Vec<Value> {
        match self.pointer("/errors") {
            Some(Value::Array(errors)) => errors,
            _ => Vec::new(),
        }
    }

    /// The `included` member, empty when absent.
    #[must_use]
    pub fn included(&self) -> Vec<Value> {
        match self.pointer("/included") {
            Some(Value::Array(included)) => included,
            _ => Vec::new(),
        }
    }

    /// Asserts the status code.
    ///
    /// # Panics
    ///
    /// Panics if the status differs.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {}, got {}: {}",
            expected,
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts a `204 No Content` response without body or content type.
    ///
    /// # Panics
    ///
    /// Panics otherwise.
    pub fn assert_no_content(&self) -> &Self {
        self.assert_status(StatusCode::NO_CONTENT);
        assert!(self.body.is_empty(), "Expected empty body");
        assert!(self.content_type().is_none(), "Expected no Content-Type");
        self
    }

    /// Asserts the `Content-Type` header.
    ///
    /// # Panics
    ///
    /// Panics if the header is missing or differs.
    pub fn assert_content_type(&self, expected: &str) -> &Self {
        let actual = self
            .content_type()
            .unwrap_or_else(|| panic!("Content-Type header not found"));
        assert_eq!(actual, expected, "Content-Type mismatch");
        self
    }

    /// Asserts the value at a JSON pointer.
    ///
    /// # Panics
    ///
    /// Panics if the pointer is missing or the value differs.
    pub fn assert_json_pointer(&self, pointer: &str, expected: &Value) -> &Self {
        let actual = self
            .pointer(pointer)
            .unwrap_or_else(|| panic!("JSON pointer '{pointer}' not found in {self:?}"));
        assert_eq!(
            &actual, expected,
            "JSON pointer '{pointer}': expected {expected}, got {actual}"
        );
        self
    }

    /// Asserts a single-error document with the given status and title.
    ///
    /// # Panics
    ///
    /// Panics on any mismatch.
    pub fn assert_error(&self, status: StatusCode, title: &str) -> &Self {
        self.assert_status(status);
        let errors = self.errors();
        assert_eq!(errors.len(), 1, "Expected one error, got {errors:?}");
        assert_eq!(errors[0]["status"], status.as_str(), "Error status mismatch");
        assert_eq!(errors[0]["title"], title, "Error title mismatch");
        self
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &String::from_utf8_lossy(&self.body))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde_json::json;

    fn response(status: StatusCode, body: &Value) -> TestResponse {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/vnd.api+json"));
        TestResponse::new(status, headers, Bytes::from(body.to_string()))
    }

    #[test]
    fn test_pointer_helpers() {
        let response = response(
            StatusCode::OK,
            &json!({"data": {"type": "tasks", "id": "1"}, "included": [{"type": "projects", "id": "2"}]}),
        );

        assert_eq!(response.data_id().as_deref(), Some("1"));
        assert_eq!(response.included().len(), 1);
        assert!(response.errors().is_empty());
        response
            .assert_content_type("application/vnd.api+json")
            .assert_json_pointer("/data/type", &json!("tasks"));
    }

    #[test]
    fn test_assert_error() {
        let response = response(
            StatusCode::NOT_FOUND,
            &json!({"errors": [{"status": "404", "title": "Resource not found", "detail": "x"}]}),
        );
        response.assert_error(StatusCode::NOT_FOUND, "Resource not found");
    }

    #[test]
    fn test_empty_body() {
        let response = TestResponse::new(StatusCode::NO_CONTENT, HeaderMap::new(), Bytes::new());
        response.assert_no_content();
        assert!(response.data().is_none());
        assert!(response.json_value().is_err());
    }

    #[test]
    #[should_panic(expected = "Expected status")]
    fn test_assert_status_mismatch() {
        response(StatusCode::OK, &json!({})).assert_status(StatusCode::CREATED);
    }
}
