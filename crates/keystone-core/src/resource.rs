//! Domain objects handled by repositories.

use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::linkage::LinkageData;

/// Parsed resource identifier.
///
/// Identifiers are always rendered as strings on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceId {
    /// Integer identifier.
    Integer(i64),
    /// String identifier.
    String(String),
    /// UUID identifier.
    Uuid(Uuid),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(id) => write!(f, "{id}"),
            Self::String(id) => f.write_str(id),
            Self::Uuid(id) => write!(f, "{id}"),
        }
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<i64> for ResourceId {
    fn from(id: i64) -> Self {
        Self::Integer(id)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self::String(id.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self::String(id)
    }
}

impl From<Uuid> for ResourceId {
    fn from(id: Uuid) -> Self {
        Self::Uuid(id)
    }
}

/// Related objects held by a relationship field.
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    /// To-one relationship value; `None` when unset.
    One(Option<Box<Resource>>),
    /// To-many relationship value.
    Many(Vec<Resource>),
}

impl Related {
    /// Returns the related resources as a slice-like iterator.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        let (one, many): (Option<&Resource>, &[Resource]) = match self {
            Self::One(resource) => (resource.as_deref(), &[]),
            Self::Many(resources) => (None, resources.as_slice()),
        };
        one.into_iter().chain(many.iter())
    }
}

/// In-memory representation of a resource instance.
///
/// # Example
///
/// ```
/// use keystone_core::{Resource, ResourceId};
///
/// let project = Resource::new("projects").with_id(1_i64).with_attribute("name", "sample project");
/// let task = Resource::new("tasks")
///     .with_id(7_i64)
///     .with_one("project", Some(project));
///
/// assert_eq!(task.id, Some(ResourceId::Integer(7)));
/// assert_eq!(task.related("project").unwrap().iter().count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Resource type name.
    pub resource_type: String,
    /// Identifier; `None` until the resource is saved.
    pub id: Option<ResourceId>,
    /// Attribute values.
    pub attributes: IndexMap<String, Value>,
    /// Relationship values. Relationships that were never loaded are absent.
    pub relationships: IndexMap<String, Related>,
}

impl Resource {
    /// Creates an empty resource of the given type.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: None,
            attributes: IndexMap::new(),
            relationships: IndexMap::new(),
        }
    }

    /// Sets the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<ResourceId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Sets a to-one relationship.
    #[must_use]
    pub fn with_one(mut self, name: impl Into<String>, related: Option<Resource>) -> Self {
        self.relationships
            .insert(name.into(), Related::One(related.map(Box::new)));
        self
    }

    /// Sets a to-many relationship.
    #[must_use]
    pub fn with_many(mut self, name: impl Into<String>, related: Vec<Resource>) -> Self {
        self.relationships.insert(name.into(), Related::Many(related));
        self
    }

    /// Returns an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Returns a relationship value.
    pub fn related(&self, name: &str) -> Option<&Related> {
        self.relationships.get(name)
    }

    /// Returns the `{type, id}` pair for this resource, if it has an id.
    pub fn linkage_data(&self) -> Option<LinkageData> {
        self.id
            .as_ref()
            .map(|id| LinkageData::new(&self.resource_type, id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_id_serializes_as_string() {
        assert_eq!(serde_json::to_value(ResourceId::Integer(5)).unwrap(), json!("5"));
        assert_eq!(serde_json::to_value(ResourceId::from("abc")).unwrap(), json!("abc"));
    }

    #[test]
    fn test_related_iter() {
        let unset = Related::One(None);
        assert_eq!(unset.iter().count(), 0);

        let many = Related::Many(vec![
            Resource::new("projects").with_id(1_i64),
            Resource::new("projects").with_id(2_i64),
        ]);
        let ids: Vec<_> = many.iter().filter_map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![ResourceId::Integer(1), ResourceId::Integer(2)]);
    }

    #[test]
    fn test_linkage_data_requires_id() {
        assert!(Resource::new("tasks").linkage_data().is_none());
        let linkage = Resource::new("tasks").with_id(3_i64).linkage_data().unwrap();
        assert_eq!(linkage.resource_type, "tasks");
        assert_eq!(linkage.id, "3");
    }
}
