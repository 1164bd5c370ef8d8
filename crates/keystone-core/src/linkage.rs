//! Resource linkage: the `{type, id}` identifiers exchanged by relationship
//! endpoints.

use serde::{Deserialize, Serialize};

use crate::resource::Related;

/// A resource identifier object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkageData {
    /// Resource type name.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Identifier, as a string.
    pub id: String,
}

impl LinkageData {
    /// Creates a new identifier object.
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }
}

/// Linkage of a relationship.
///
/// Serializes to `null` or an object for to-one relationships and to an
/// array (possibly empty) for to-many relationships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Linkage {
    /// To-one linkage.
    One(Option<LinkageData>),
    /// To-many linkage.
    Many(Vec<LinkageData>),
}

impl Linkage {
    /// Builds linkage from a loaded relationship value.
    pub fn from_related(related: &Related) -> Self {
        match related {
            Related::One(resource) => Self::One(resource.as_deref().and_then(|r| r.linkage_data())),
            Related::Many(resources) => Self::Many(resources.iter().filter_map(|r| r.linkage_data()).collect()),
        }
    }
}
