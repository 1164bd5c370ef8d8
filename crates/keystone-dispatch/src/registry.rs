//! Controller selection.

use std::fmt;
use std::sync::Arc;

use http::Method;
use keystone_core::{Cardinality, KeystoneError, KeystoneResult, ResourceRegistry};
use keystone_router::JsonPath;

use crate::controller::{
    CollectionGet, Controller, FieldResourceGet, FieldResourcePost, RelationshipsResourceDelete,
    RelationshipsResourceGet, RelationshipsResourcePatch, RelationshipsResourcePost, ResourceDelete, ResourceGet,
    ResourcePatch, ResourcePost,
};

/// Methods checked by [`ControllerRegistry::allowed_methods`].
const CANDIDATE_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PATCH, Method::DELETE];

/// Resolves the controller for a path and method.
pub trait ControllerLookup: Send + Sync {
    /// Returns the controller that handles `method` on `path`.
    ///
    /// # Errors
    ///
    /// Returns [`KeystoneError::NoMatchingController`] when no controller
    /// accepts the request.
    fn get_controller(&self, path: &JsonPath, method: &Method) -> KeystoneResult<&dyn Controller>;
}

/// Ordered set of controllers; the first accepting controller wins.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use http::Method;
/// use keystone_core::fixtures;
/// use keystone_dispatch::{ControllerLookup, ControllerRegistry};
/// use keystone_router::PathBuilder;
///
/// let registry = Arc::new(fixtures::sample_registry().unwrap());
/// let controllers = ControllerRegistry::with_defaults(registry.clone());
/// let path = PathBuilder::new(registry).build_path("/tasks/").unwrap();
///
/// let controller = controllers.get_controller(&path, &Method::GET).unwrap();
/// assert_eq!(controller.name(), "CollectionGet");
/// ```
#[derive(Default)]
pub struct ControllerRegistry {
    controllers: Vec<Box<dyn Controller>>,
}

impl ControllerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in controllers.
    ///
    /// Relationships controllers come first, then field, resource and
    /// collection controllers.
    pub fn with_defaults(registry: Arc<ResourceRegistry>) -> Self {
        let mut controllers = Self::new();
        controllers
            .add_controller(RelationshipsResourceGet::new(registry.clone()))
            .add_controller(RelationshipsResourcePost::new(registry.clone(), Cardinality::One))
            .add_controller(RelationshipsResourcePost::new(registry.clone(), Cardinality::Many))
            .add_controller(RelationshipsResourcePatch::new(registry.clone(), Cardinality::One))
            .add_controller(RelationshipsResourcePatch::new(registry.clone(), Cardinality::Many))
            .add_controller(RelationshipsResourceDelete::new(registry.clone(), Cardinality::One))
            .add_controller(RelationshipsResourceDelete::new(registry.clone(), Cardinality::Many))
            .add_controller(FieldResourceGet::new(registry.clone()))
            .add_controller(FieldResourcePost::new(registry.clone(), Cardinality::One))
            .add_controller(FieldResourcePost::new(registry.clone(), Cardinality::Many))
            .add_controller(ResourceGet::new(registry.clone()))
            .add_controller(ResourcePost::new(registry.clone()))
            .add_controller(ResourcePatch::new(registry.clone()))
            .add_controller(ResourceDelete::new(registry.clone()))
            .add_controller(CollectionGet::new(registry));
        controllers
    }

    /// Appends a controller. Controllers are consulted in insertion order.
    pub fn add_controller(&mut self, controller: impl Controller + 'static) -> &mut Self {
        self.controllers.push(Box::new(controller));
        self
    }

    /// Appends a controller, builder style.
    #[must_use]
    pub fn with_controller(mut self, controller: impl Controller + 'static) -> Self {
        self.add_controller(controller);
        self
    }

    /// Registered controllers, in order.
    pub fn controllers(&self) -> impl Iterator<Item = &dyn Controller> {
        self.controllers.iter().map(|controller| -> &dyn Controller { controller.as_ref() })
    }

    /// Number of registered controllers.
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Returns `true` if no controller is registered.
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Methods for which some controller accepts `path`.
    pub fn allowed_methods(&self, path: &JsonPath) -> Vec<Method> {
        CANDIDATE_METHODS
            .into_iter()
            .filter(|method| self.controllers().any(|c| c.is_acceptable(path, method)))
            .collect()
    }
}

impl ControllerLookup for ControllerRegistry {
    fn get_controller(&self, path: &JsonPath, method: &Method) -> KeystoneResult<&dyn Controller> {
        match self.controllers().find(|c| c.is_acceptable(path, method)) {
            Some(controller) => {
                tracing::debug!(
                    controller = controller.name(),
                    path = %path,
                    method = %method,
                    "Controller selected"
                );
                Ok(controller)
            }
            None => Err(KeystoneError::no_matching_controller(
                method,
                path.to_string(),
                self.allowed_methods(path),
            )),
        }
    }
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.controllers().map(|c| c.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_core::{fixtures, ErrorKind};
    use keystone_router::PathBuilder;

    fn setup() -> (ControllerRegistry, PathBuilder) {
        let registry = Arc::new(fixtures::sample_registry().unwrap());
        (ControllerRegistry::with_defaults(registry.clone()), PathBuilder::new(registry))
    }

    #[test]
    fn test_default_selection() {
        let (controllers, paths) = setup();
        let cases = [
            ("/tasks", Method::GET, "CollectionGet"),
            ("/tasks", Method::POST, "ResourcePost"),
            ("/tasks/1", Method::GET, "ResourceGet"),
            ("/tasks/1", Method::PATCH, "ResourcePatch"),
            ("/tasks/1", Method::DELETE, "ResourceDelete"),
            ("/tasks/1/project", Method::GET, "FieldResourceGet"),
            ("/tasks/1/project", Method::POST, "ToOneFieldResourcePost"),
            ("/tasks/1/projects", Method::POST, "ToManyFieldResourcePost"),
            ("/tasks/1/relationships/project", Method::GET, "RelationshipsResourceGet"),
            ("/tasks/1/relationships/project", Method::PATCH, "ToOneRelationshipsResourcePatch"),
            ("/tasks/1/relationships/projects", Method::DELETE, "ToManyRelationshipsResourceDelete"),
        ];

        for (raw, method, expected) in cases {
            let path = paths.build_path(raw).unwrap();
            let controller = controllers.get_controller(&path, &method).unwrap();
            assert_eq!(controller.name(), expected, "{method} {raw}");
        }
    }

    #[test]
    fn test_exactly_one_controller_accepts() {
        let (controllers, paths) = setup();
        for raw in [
            "/tasks",
            "/tasks/1",
            "/tasks/1/project",
            "/tasks/1/projects",
            "/tasks/1/relationships/project",
            "/tasks/1/relationships/projects",
        ] {
            let path = paths.build_path(raw).unwrap();
            for method in CANDIDATE_METHODS {
                let accepting = controllers
                    .controllers()
                    .filter(|c| c.is_acceptable(&path, &method))
                    .count();
                assert!(accepting <= 1, "{method} {raw} accepted by {accepting} controllers");
            }
        }

        let field = paths.build_path("/tasks/1/project").unwrap();
        let accepting = controllers
            .controllers()
            .filter(|c| c.is_acceptable(&field, &Method::GET))
            .count();
        assert_eq!(accepting, 1);
    }

    #[test]
    fn test_no_matching_controller() {
        let (controllers, paths) = setup();
        let path = paths.build_path("/tasks").unwrap();

        let error = controllers.get_controller(&path, &Method::DELETE).err().unwrap();
        assert_eq!(error.kind(), ErrorKind::NoMatchingController);
        match error {
            KeystoneError::NoMatchingController { allowed, .. } => {
                assert_eq!(allowed, [Method::GET, Method::POST]);
            }
            other => panic!("unexpected error {other:?}"),
        }

        let error = controllers.get_controller(&path, &Method::PUT).err().unwrap();
        assert_eq!(error.kind(), ErrorKind::NoMatchingController);
    }

    #[test]
    fn test_field_patch_is_not_routed() {
        let (controllers, paths) = setup();
        let path = paths.build_path("/tasks/1/project").unwrap();
        assert_eq!(controllers.allowed_methods(&path), [Method::GET, Method::POST]);
    }

    #[test]
    fn test_empty_registry() {
        let controllers = ControllerRegistry::new();
        assert!(controllers.is_empty());
        let error = controllers
            .get_controller(&JsonPath::collection("tasks"), &Method::GET)
            .err().unwrap();
        assert!(matches!(
            error,
            KeystoneError::NoMatchingController { ref allowed, .. } if allowed.is_empty()
        ));
    }
}
