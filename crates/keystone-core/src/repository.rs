//! Data-access interfaces consumed by controllers.
//!
//! Keystone never persists anything itself. Each registered resource type has
//! a [`ResourceRepository`], and each declared relationship has a
//! [`RelationshipRepository`]. A repository reports "absent" with `Ok(None)`;
//! controllers turn that into a not-found failure.

use crate::error::KeystoneResult;
use crate::query::QueryParams;
use crate::resource::{Resource, ResourceId};

/// CRUD access to one resource type.
pub trait ResourceRepository: Send + Sync {
    /// Finds a resource by id.
    fn find_one(&self, id: &ResourceId, params: &QueryParams) -> KeystoneResult<Option<Resource>>;

    /// Finds all resources matching the query parameters.
    fn find_all(&self, params: &QueryParams) -> KeystoneResult<Vec<Resource>>;

    /// Creates or updates a resource and returns the stored version.
    ///
    /// Resources without an id are assigned one.
    fn save(&self, resource: Resource) -> KeystoneResult<Resource>;

    /// Deletes a resource. Deleting an absent resource is not an error.
    fn delete(&self, id: &ResourceId) -> KeystoneResult<()>;
}

/// Access to one relationship of one resource type.
pub trait RelationshipRepository: Send + Sync {
    /// Sets (or clears, with `None`) a to-one relationship.
    fn set_relation(&self, source: &ResourceId, target: Option<&ResourceId>, field: &str) -> KeystoneResult<()>;

    /// Replaces the members of a to-many relationship.
    fn set_relations(&self, source: &ResourceId, targets: &[ResourceId], field: &str) -> KeystoneResult<()>;

    /// Adds members to a to-many relationship. Existing members are kept once.
    fn add_relations(&self, source: &ResourceId, targets: &[ResourceId], field: &str) -> KeystoneResult<()>;

    /// Removes members from a to-many relationship.
    fn remove_relations(&self, source: &ResourceId, targets: &[ResourceId], field: &str) -> KeystoneResult<()>;

    /// Finds the target of a to-one relationship.
    fn find_one_target(
        &self,
        source: &ResourceId,
        field: &str,
        params: &QueryParams,
    ) -> KeystoneResult<Option<Resource>>;

    /// Finds the targets of a to-many relationship.
    fn find_many_targets(&self, source: &ResourceId, field: &str, params: &QueryParams)
        -> KeystoneResult<Vec<Resource>>;
}
