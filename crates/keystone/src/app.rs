//! Application entry point.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use keystone_config::KeystoneConfig;
use keystone_core::{KeystoneError, KeystoneResult, QueryParams, ResourceRegistry};
use keystone_dispatch::{ControllerLookup, ControllerRegistry, ExceptionMapperRegistry, RequestDispatcher};
use keystone_document::{DocumentSerializer, RenderedDocument};
use keystone_router::PathBuilder;
use keystone_telemetry::metrics;

use crate::request::JsonApiRequest;

/// `path_kind` label for requests whose path did not parse.
const INVALID_PATH_KIND: &str = "invalid";

/// Parses, dispatches and renders JSON:API requests.
///
/// Path, query, body and serialization failures go through the same
/// exception mappers as controller failures. Failures without a mapper are
/// returned as `Err` for the host to answer, typically with a 500.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use http::StatusCode;
/// use keystone::{Keystone, JsonApiRequest};
/// use keystone_core::fixtures;
///
/// let registry = Arc::new(fixtures::sample_registry().unwrap());
/// let app = Keystone::builder(registry).build();
///
/// let rendered = app.handle(&JsonApiRequest::get("/tasks")).unwrap();
/// assert_eq!(rendered.status, StatusCode::OK);
/// assert_eq!(rendered.body.unwrap()["data"], serde_json::json!([]));
/// ```
#[derive(Debug, Clone)]
pub struct Keystone {
    path_builder: PathBuilder,
    dispatcher: RequestDispatcher,
    serializer: DocumentSerializer,
    service_name: String,
}

impl Keystone {
    /// Starts building an application over `registry`.
    pub fn builder(registry: Arc<ResourceRegistry>) -> KeystoneBuilder {
        KeystoneBuilder::new(registry)
    }

    /// The registry requests are resolved against.
    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        self.path_builder.registry()
    }

    /// The dispatcher in use.
    pub fn dispatcher(&self) -> &RequestDispatcher {
        &self.dispatcher
    }

    /// Handles one request.
    ///
    /// # Errors
    ///
    /// Returns failures that have no registered mapper, including
    /// [`KeystoneError::NoMatchingController`].
    pub fn handle(&self, request: &JsonApiRequest) -> KeystoneResult<RenderedDocument> {
        let span = tracing::info_span!(
            "jsonapi_request",
            service = %self.service_name,
            http.method = %request.method,
            http.path = %request.path,
        );
        let _entered = span.enter();
        let started = Instant::now();

        let mut path_kind = INVALID_PATH_KIND;
        let outcome = self.respond(request, &mut path_kind);

        let status = match &outcome {
            Ok(rendered) => rendered.status,
            Err(error) => error.status_code(),
        };
        metrics::record_request(path_kind, request.method.as_str(), status.as_u16(), started.elapsed());
        tracing::debug!(
            path_kind,
            http.status_code = status.as_u16(),
            "Request handled"
        );

        outcome
    }

    /// Handles an `http` request and builds the response with its
    /// `Content-Type` header.
    ///
    /// # Errors
    ///
    /// Same as [`handle`](Self::handle).
    pub fn handle_http(&self, request: http::Request<Bytes>) -> KeystoneResult<http::Response<Bytes>> {
        let rendered = self.handle(&JsonApiRequest::from(request))?;
        let body = rendered.to_bytes()?;

        let mut builder = http::Response::builder().status(rendered.status);
        if let Some(content_type) = rendered.content_type() {
            builder = builder.header(http::header::CONTENT_TYPE, content_type);
        }
        builder
            .body(body)
            .map_err(|e| KeystoneError::internal_with_source("failed to build HTTP response", e))
    }

    fn respond(&self, request: &JsonApiRequest, path_kind: &mut &'static str) -> KeystoneResult<RenderedDocument> {
        let path = match self.path_builder.build_path(&request.path) {
            Ok(path) => path,
            Err(error) => return self.render_failure(error),
        };
        *path_kind = path.kind().as_str();

        let parsed = QueryParams::from_query_string(request.query())
            .and_then(|params| {
                self.serializer.validate_includes(&path, &params)?;
                Ok(params)
            })
            .and_then(|params| Ok((params, request.parse_body(path.target_type())?)));
        let (params, body) = match parsed {
            Ok(parsed) => parsed,
            Err(error) => return self.render_failure(error),
        };

        let response = self
            .dispatcher
            .dispatch_request(&path, &request.method, &params, body.as_ref())?;

        match self.serializer.render(&response) {
            Ok(rendered) => Ok(rendered),
            Err(error) => self.render_failure(error),
        }
    }

    fn render_failure(&self, error: KeystoneError) -> KeystoneResult<RenderedDocument> {
        let response = self.dispatcher.map_failure(error)?;
        self.serializer.render_errors(response.status, response.errors)
    }
}

/// Builder for [`Keystone`].
///
/// Defaults: [`ControllerRegistry::with_defaults`],
/// [`ExceptionMapperRegistry::with_defaults`], links under the registry's
/// base URL.
pub struct KeystoneBuilder {
    registry: Arc<ResourceRegistry>,
    controllers: Option<Arc<dyn ControllerLookup>>,
    mappers: Option<ExceptionMapperRegistry>,
    base_url: Option<String>,
    max_include_depth: Option<usize>,
    service_name: Option<String>,
}

impl KeystoneBuilder {
    fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self {
            registry,
            controllers: None,
            mappers: None,
            base_url: None,
            max_include_depth: None,
            service_name: None,
        }
    }

    /// Uses `controllers` instead of the default controller set.
    #[must_use]
    pub fn controllers(mut self, controllers: impl ControllerLookup + 'static) -> Self {
        self.controllers = Some(Arc::new(controllers));
        self
    }

    /// Uses `mappers` instead of the default exception mappers.
    #[must_use]
    pub fn mappers(mut self, mappers: ExceptionMapperRegistry) -> Self {
        self.mappers = Some(mappers);
        self
    }

    /// Applies the `jsonapi` settings and service name of `config`.
    ///
    /// The configured base URL replaces the registry's for link generation.
    #[must_use]
    pub fn config(mut self, config: &KeystoneConfig) -> Self {
        self.base_url = Some(config.jsonapi.base_url.clone());
        self.max_include_depth = Some(config.jsonapi.max_include_depth);
        self.service_name = Some(config.telemetry.service_name.clone());
        self
    }

    /// Builds the application.
    pub fn build(self) -> Keystone {
        let controllers = self
            .controllers
            .unwrap_or_else(|| Arc::new(ControllerRegistry::with_defaults(self.registry.clone())));
        let mappers = Arc::new(self.mappers.unwrap_or_else(ExceptionMapperRegistry::with_defaults));

        let mut serializer = DocumentSerializer::new(self.registry.clone());
        if let Some(base_url) = &self.base_url {
            serializer = serializer.with_base_url(base_url);
        }
        if let Some(depth) = self.max_include_depth {
            serializer = serializer.with_max_include_depth(depth);
        }

        tracing::debug!(
            resource_types = self.registry.len(),
            base_url = serializer.links().base_url(),
            "Keystone application built"
        );

        Keystone {
            path_builder: PathBuilder::new(self.registry),
            dispatcher: RequestDispatcher::new(controllers, mappers),
            serializer,
            service_name: self.service_name.unwrap_or_else(|| "keystone".to_string()),
        }
    }
}

impl std::fmt::Debug for KeystoneBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeystoneBuilder")
            .field("base_url", &self.base_url)
            .field("max_include_depth", &self.max_include_depth)
            .field("service_name", &self.service_name)
            .finish_non_exhaustive()
    }
}
