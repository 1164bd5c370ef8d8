//! In-memory test client.

use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use keystone::Keystone;
use keystone_core::{fixtures, InMemoryStore, InitializationError};
use serde::Serialize;

use crate::error::TestError;
use crate::response::TestResponse;

/// Sends requests straight to a [`Keystone`] application.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use keystone_test::TestClient;
/// use serde_json::json;
///
/// let (client, _store) = TestClient::sample().unwrap();
///
/// let response = client
///     .post("/projects")
///     .json(&json!({"data": {"type": "projects", "attributes": {"name": "docs"}}}))
///     .send();
///
/// response
///     .assert_status(StatusCode::CREATED)
///     .assert_json_pointer("/data/type", &json!("projects"));
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestClient {
    app: Arc<Keystone>,
}

impl TestClient {
    /// Creates a client for `app`.
    pub fn new(app: Keystone) -> Self {
        Self { app: Arc::new(app) }
    }

    /// Creates a client over the sample `tasks`/`projects`/`users` model and
    /// returns the store behind it.
    pub fn sample() -> Result<(Self, InMemoryStore), InitializationError> {
        let (registry, store) = fixtures::sample_registry_with_store()?;
        let app = Keystone::builder(Arc::new(registry)).build();
        Ok((Self::new(app), store))
    }

    /// The application under test.
    pub fn app(&self) -> &Keystone {
        &self.app
    }

    /// Starts a `GET` request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a `POST` request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a `PATCH` request.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Starts a `DELETE` request.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest {
            client: self,
            method,
            uri: uri.as_ref().to_string(),
            query: None,
            body: Bytes::new(),
            error: None,
        }
    }
}

/// A request being built by a [`TestClient`].
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    method: Method,
    uri: String,
    query: Option<String>,
    body: Bytes,
    error: Option<TestError>,
}

impl TestClientRequest<'_> {
    /// Sets the raw, already encoded query string.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serializes `value` as the body.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Bytes::from(bytes),
            Err(e) => self.error = Some(TestError::Json(e)),
        }
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the application returns an
    /// unmapped failure.
    pub fn send(self) -> TestResponse {
        self.try_send()
            .unwrap_or_else(|e| panic!("request failed: {e}"))
    }

    /// Sends the request, returning unmapped failures as errors.
    pub fn try_send(self) -> Result<TestResponse, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let uri = match &self.query {
            Some(query) => format!("{}?{query}", self.uri),
            None => self.uri,
        };

        let request = http::Request::builder()
            .method(self.method)
            .uri(uri.as_str())
            .header(http::header::CONTENT_TYPE, keystone::document::MEDIA_TYPE)
            .body(self.body)
            .map_err(|e| TestError::RequestBuild(e.to_string()))?;

        let response = self.client.app.handle_http(request)?;
        Ok(TestResponse::from_http(response))
    }
}
