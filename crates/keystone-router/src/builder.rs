//! Path parsing.

use std::sync::Arc;

use keystone_core::{KeystoneError, KeystoneResult, ResourceRegistry};
use smallvec::SmallVec;

use crate::path::{CollectionPath, FieldPath, JsonPath, RelationshipsPath, ResourcePath, RELATIONSHIPS_SEGMENT};

/// Maximum number of segments in a valid path.
const MAX_SEGMENTS: usize = 4;

/// Parses path strings into [`JsonPath`] values against a registry.
///
/// Accepted shapes (leading, trailing and repeated `/` are ignored):
///
/// | Path | Result |
/// |---|---|
/// | `type` | [`JsonPath::Collection`] |
/// | `type/id` | [`JsonPath::Resource`] |
/// | `type/id/name` | [`JsonPath::Field`] |
/// | `type/id/relationships/name` | [`JsonPath::Relationships`] |
///
/// # Errors
///
/// | Condition | Error |
/// |---|---|
/// | unregistered type | `ResourceNotFound` (404) |
/// | id not convertible to the type's id type | `InvalidIdentifier` (400) |
/// | undeclared relationship | `ResourceFieldNotFound` (400) |
/// | empty path, too many segments, misplaced `relationships` | `InvalidPath` (400) |
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use keystone_core::fixtures;
/// use keystone_router::{JsonPath, PathBuilder, PathKind};
///
/// let builder = PathBuilder::new(Arc::new(fixtures::sample_registry().unwrap()));
///
/// assert_eq!(builder.build_path("/tasks/").unwrap(), JsonPath::collection("tasks"));
/// assert_eq!(builder.build_path("tasks/1").unwrap(), JsonPath::resource("tasks", 1_i64));
/// assert_eq!(
///     builder.build_path("/tasks/1/relationships/project").unwrap().kind(),
///     PathKind::Relationships
/// );
/// ```
#[derive(Debug, Clone)]
pub struct PathBuilder {
    registry: Arc<ResourceRegistry>,
}

impl PathBuilder {
    /// Creates a path builder over a registry.
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self { registry }
    }

    /// The registry paths are validated against.
    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }

    /// Parses a path string.
    pub fn build_path(&self, path: &str) -> KeystoneResult<JsonPath> {
        let segments: SmallVec<[&str; MAX_SEGMENTS]> =
            path.split('/').filter(|segment| !segment.is_empty()).collect();

        let Some((&resource_type, rest)) = segments.split_first() else {
            return Err(KeystoneError::invalid_path(path, "path does not name a resource type"));
        };
        let information = self.registry.entry(resource_type)?.information();
        if segments.len() > MAX_SEGMENTS {
            return Err(KeystoneError::invalid_path(
                path,
                format!("expected at most {MAX_SEGMENTS} segments, got {}", segments.len()),
            ));
        }

        let Some((&raw_id, rest)) = rest.split_first() else {
            return Ok(JsonPath::Collection(CollectionPath {
                resource_type: resource_type.to_string(),
            }));
        };

        let parent = ResourcePath {
            resource_type: resource_type.to_string(),
            id: information.parse_id(raw_id)?,
        };

        match rest {
            [] => Ok(JsonPath::Resource(parent)),
            [RELATIONSHIPS_SEGMENT] => Err(KeystoneError::invalid_path(
                path,
                "relationship name is missing",
            )),
            [name] => Ok(JsonPath::Field(FieldPath {
                parent,
                relationship: information.require_relationship(name)?.clone(),
            })),
            [RELATIONSHIPS_SEGMENT, name] => Ok(JsonPath::Relationships(RelationshipsPath {
                parent,
                relationship: information.require_relationship(name)?.clone(),
            })),
            [other, _] => Err(KeystoneError::invalid_path(
                path,
                format!("expected '{RELATIONSHIPS_SEGMENT}' segment, got '{other}'"),
            )),
            _ => Err(KeystoneError::invalid_path(path, "unexpected path structure")),
        }
    }
}
