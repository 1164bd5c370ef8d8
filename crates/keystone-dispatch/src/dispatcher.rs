//! Request dispatcher.

use std::sync::Arc;

use http::Method;
use keystone_core::{KeystoneError, KeystoneResult, QueryParams, RequestBody};
use keystone_router::JsonPath;
use keystone_telemetry::metrics;

use crate::mapper::ExceptionMapperRegistry;
use crate::registry::ControllerLookup;
use crate::response::{BaseResponse, ErrorResponse};

/// Selects the controller for a request, runs it and maps its failures.
///
/// Failures with a registered mapper become [`BaseResponse::Error`]; every
/// other failure is returned unchanged.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use http::{Method, StatusCode};
/// use keystone_core::{fixtures, QueryParams};
/// use keystone_dispatch::{ControllerRegistry, ExceptionMapperRegistry, RequestDispatcher};
/// use keystone_router::PathBuilder;
///
/// let registry = Arc::new(fixtures::sample_registry().unwrap());
/// let dispatcher = RequestDispatcher::new(
///     Arc::new(ControllerRegistry::with_defaults(registry.clone())),
///     Arc::new(ExceptionMapperRegistry::with_defaults()),
/// );
///
/// let path = PathBuilder::new(registry).build_path("/tasks/1").unwrap();
/// let response = dispatcher
///     .dispatch_request(&path, &Method::GET, &QueryParams::new(), None)
///     .unwrap();
/// assert_eq!(response.http_status(), StatusCode::NOT_FOUND);
/// ```
#[derive(Clone)]
pub struct RequestDispatcher {
    controllers: Arc<dyn ControllerLookup>,
    mappers: Arc<ExceptionMapperRegistry>,
}

impl RequestDispatcher {
    /// Creates a dispatcher.
    pub fn new(controllers: Arc<dyn ControllerLookup>, mappers: Arc<ExceptionMapperRegistry>) -> Self {
        Self { controllers, mappers }
    }

    /// The exception mappers in use.
    pub fn mappers(&self) -> &ExceptionMapperRegistry {
        &self.mappers
    }

    /// Dispatches one request.
    ///
    /// # Errors
    ///
    /// Returns the original failure when no mapper is registered for its kind.
    /// [`KeystoneError::NoMatchingController`] is always returned this way.
    pub fn dispatch_request(
        &self,
        path: &JsonPath,
        method: &Method,
        params: &QueryParams,
        body: Option<&RequestBody>,
    ) -> KeystoneResult<BaseResponse> {
        let outcome = self
            .controllers
            .get_controller(path, method)
            .and_then(|controller| controller.handle(path, params, body));

        match outcome {
            Ok(response) => Ok(response),
            Err(error) => self.map_failure(error).map(BaseResponse::Error),
        }
    }

    /// Converts `error` with its registered mapper.
    ///
    /// # Errors
    ///
    /// Returns `error` unchanged when its kind has no mapper.
    pub fn map_failure(&self, error: KeystoneError) -> KeystoneResult<ErrorResponse> {
        let kind = error.kind();
        match self.mappers.mapper_for(kind) {
            Some(mapper) => {
                let response = mapper.to_error_response(&error);
                tracing::info!(
                    kind = ?kind,
                    status = response.status.as_u16(),
                    error = %error,
                    "Request failure mapped to error response"
                );
                metrics::record_mapped_failure(kind.code());
                Ok(response)
            }
            None => {
                tracing::warn!(kind = ?kind, error = %error, "Unmapped request failure");
                Err(error)
            }
        }
    }
}

impl std::fmt::Debug for RequestDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("mappers", &self.mappers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use http::StatusCode;
    use keystone_core::{fixtures, ErrorData, ErrorKind};
    use keystone_router::PathBuilder;

    use crate::controller::{CollectionGet, Controller};
    use crate::registry::ControllerRegistry;

    /// Delegates to [`CollectionGet`] and counts invocations.
    struct CountingCollectionGet {
        inner: CollectionGet,
        calls: Arc<AtomicUsize>,
    }

    impl Controller for CountingCollectionGet {
        fn name(&self) -> &'static str {
            "CountingCollectionGet"
        }

        fn is_acceptable(&self, path: &JsonPath, method: &Method) -> bool {
            self.inner.is_acceptable(path, method)
        }

        fn handle(&self, path: &JsonPath, params: &QueryParams, body: Option<&RequestBody>) -> KeystoneResult<BaseResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.handle(path, params, body)
        }
    }

    /// Lookup that always fails with the configured error.
    struct FailingLookup {
        error: fn() -> KeystoneError,
    }

    impl ControllerLookup for FailingLookup {
        fn get_controller(&self, _path: &JsonPath, _method: &Method) -> KeystoneResult<&dyn Controller> {
            Err((self.error)())
        }
    }

    fn arithmetic_error() -> KeystoneError {
        KeystoneError::internal("arithmetic error: division by zero")
    }

    fn illegal_state_mapper(error: &KeystoneError) -> ErrorResponse {
        let data = ErrorData::builder()
            .status(StatusCode::BAD_REQUEST)
            .title("Illegal state")
            .detail(error.to_string())
            .build();
        ErrorResponse::new(StatusCode::BAD_REQUEST, vec![data])
    }

    #[test]
    fn test_collection_get_is_invoked_once() {
        let registry = Arc::new(fixtures::sample_registry().unwrap());
        let calls = Arc::new(AtomicUsize::new(0));
        let controllers = ControllerRegistry::new().with_controller(CountingCollectionGet {
            inner: CollectionGet::new(registry.clone()),
            calls: calls.clone(),
        });
        let dispatcher = RequestDispatcher::new(
            Arc::new(controllers),
            Arc::new(ExceptionMapperRegistry::with_defaults()),
        );

        let path = PathBuilder::new(registry).build_path("/tasks/").unwrap();
        let response = dispatcher
            .dispatch_request(&path, &Method::GET, &QueryParams::new(), None)
            .unwrap();

        assert!(matches!(response, BaseResponse::Collection(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unmapped_lookup_failure_propagates() {
        let dispatcher = RequestDispatcher::new(
            Arc::new(FailingLookup { error: arithmetic_error }),
            Arc::new(ExceptionMapperRegistry::with_defaults()),
        );

        let error = dispatcher
            .dispatch_request(&JsonPath::collection("tasks"), &Method::GET, &QueryParams::new(), None)
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Internal);
        assert_eq!(error.to_string(), arithmetic_error().to_string());
    }

    #[test]
    fn test_mapped_lookup_failure_becomes_error_response() {
        let mappers = ExceptionMapperRegistry::new().with_mapper(ErrorKind::Internal, illegal_state_mapper);
        let dispatcher = RequestDispatcher::new(
            Arc::new(FailingLookup { error: arithmetic_error }),
            Arc::new(mappers),
        );

        let response = dispatcher
            .dispatch_request(&JsonPath::collection("tasks"), &Method::GET, &QueryParams::new(), None)
            .unwrap();

        assert_eq!(response.http_status(), StatusCode::BAD_REQUEST);
        match response {
            BaseResponse::Error(error) => assert_eq!(error.errors[0].title, "Illegal state"),
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn test_no_matching_controller_always_propagates() {
        let registry = Arc::new(fixtures::sample_registry().unwrap());
        let mut mappers = ExceptionMapperRegistry::with_defaults();
        mappers.register(ErrorKind::NoMatchingController, illegal_state_mapper);
        let dispatcher = RequestDispatcher::new(
            Arc::new(ControllerRegistry::with_defaults(registry)),
            Arc::new(mappers),
        );

        let error = dispatcher
            .dispatch_request(&JsonPath::collection("tasks"), &Method::DELETE, &QueryParams::new(), None)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NoMatchingController);
    }

    #[test]
    fn test_handler_failure_is_mapped() {
        let registry = Arc::new(fixtures::sample_registry().unwrap());
        let dispatcher = RequestDispatcher::new(
            Arc::new(ControllerRegistry::with_defaults(registry)),
            Arc::new(ExceptionMapperRegistry::with_defaults()),
        );

        let response = dispatcher
            .dispatch_request(&JsonPath::resource("tasks", 42_i64), &Method::GET, &QueryParams::new(), None)
            .unwrap();
        match response {
            BaseResponse::Error(error) => {
                assert_eq!(error.status, StatusCode::NOT_FOUND);
                assert_eq!(error.errors[0].status, "404");
            }
            other => panic!("unexpected response {other:?}"),
        }
    }
}
