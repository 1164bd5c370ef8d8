//! Typed request paths.
//!
//! A [`JsonPath`] is produced once per request by the
//! [`PathBuilder`](crate::PathBuilder) and is immutable afterwards. Field and
//! relationships paths carry the full [`RelationshipDescriptor`], so
//! controllers never need to look the relationship up again.

use std::fmt;

use keystone_core::{Cardinality, RelationshipDescriptor, ResourceId};

/// Marker segment that selects linkage-only access.
pub const RELATIONSHIPS_SEGMENT: &str = "relationships";

/// `/<type>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath {
    /// Resource type.
    pub resource_type: String,
}

/// `/<type>/<id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    /// Resource type.
    pub resource_type: String,
    /// Parsed identifier.
    pub id: ResourceId,
}

/// `/<type>/<id>/<relationship>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    /// The owning resource.
    pub parent: ResourcePath,
    /// The relationship accessed.
    pub relationship: RelationshipDescriptor,
}

/// `/<type>/<id>/relationships/<relationship>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationshipsPath {
    /// The owning resource.
    pub parent: ResourcePath,
    /// The relationship accessed.
    pub relationship: RelationshipDescriptor,
}

/// Shape of a [`JsonPath`], without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// Collection path.
    Collection,
    /// Single resource path.
    Resource,
    /// Relationship accessed as a nested resource or collection.
    Field,
    /// Relationship linkage.
    Relationships,
}

impl PathKind {
    /// Lowercase label, used in logs and metrics.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Resource => "resource",
            Self::Field => "field",
            Self::Relationships => "relationships",
        }
    }
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed request path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JsonPath {
    /// `/<type>`
    Collection(CollectionPath),
    /// `/<type>/<id>`
    Resource(ResourcePath),
    /// `/<type>/<id>/<relationship>`
    Field(FieldPath),
    /// `/<type>/<id>/relationships/<relationship>`
    Relationships(RelationshipsPath),
}

impl JsonPath {
    /// Creates a collection path.
    pub fn collection(resource_type: impl Into<String>) -> Self {
        Self::Collection(CollectionPath {
            resource_type: resource_type.into(),
        })
    }

    /// Creates a single resource path.
    pub fn resource(resource_type: impl Into<String>, id: impl Into<ResourceId>) -> Self {
        Self::Resource(ResourcePath {
            resource_type: resource_type.into(),
            id: id.into(),
        })
    }

    /// Returns the path shape.
    pub const fn kind(&self) -> PathKind {
        match self {
            Self::Collection(_) => PathKind::Collection,
            Self::Resource(_) => PathKind::Resource,
            Self::Field(_) => PathKind::Field,
            Self::Relationships(_) => PathKind::Relationships,
        }
    }

    /// The resource type named by the first segment.
    pub fn resource_type(&self) -> &str {
        match self {
            Self::Collection(path) => &path.resource_type,
            Self::Resource(path) => &path.resource_type,
            Self::Field(path) => &path.parent.resource_type,
            Self::Relationships(path) => &path.parent.resource_type,
        }
    }

    /// The type of the resources addressed by this path: the first segment for
    /// collection and resource paths, the relationship target otherwise.
    pub fn target_type(&self) -> &str {
        self.relationship()
            .map_or_else(|| self.resource_type(), |r| r.target_type.as_str())
    }

    /// The identifier segment, if any.
    pub fn id(&self) -> Option<&ResourceId> {
        match self {
            Self::Collection(_) => None,
            Self::Resource(path) => Some(&path.id),
            Self::Field(path) => Some(&path.parent.id),
            Self::Relationships(path) => Some(&path.parent.id),
        }
    }

    /// The owning resource of a field or relationships path.
    pub fn parent(&self) -> Option<&ResourcePath> {
        match self {
            Self::Field(path) => Some(&path.parent),
            Self::Relationships(path) => Some(&path.parent),
            _ => None,
        }
    }

    /// The relationship of a field or relationships path.
    pub fn relationship(&self) -> Option<&RelationshipDescriptor> {
        match self {
            Self::Field(path) => Some(&path.relationship),
            Self::Relationships(path) => Some(&path.relationship),
            _ => None,
        }
    }

    /// Cardinality of the relationship of a field or relationships path.
    pub fn cardinality(&self) -> Option<Cardinality> {
        self.relationship().map(|r| r.cardinality)
    }

    /// Renders the path back to `/type[/id[/relationships]/name]`.
    pub fn to_url_path(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collection(path) => write!(f, "/{}", path.resource_type),
            Self::Resource(path) => write!(f, "/{}/{}", path.resource_type, path.id),
            Self::Field(path) => write!(
                f,
                "/{}/{}/{}",
                path.parent.resource_type, path.parent.id, path.relationship.name
            ),
            Self::Relationships(path) => write!(
                f,
                "/{}/{}/{RELATIONSHIPS_SEGMENT}/{}",
                path.parent.resource_type, path.parent.id, path.relationship.name
            ),
        }
    }
}
