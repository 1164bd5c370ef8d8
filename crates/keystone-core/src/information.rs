//! Resource metadata.
//!
//! [`ResourceInformation`] describes one resource type: its identifier, its
//! attributes and its relationships. Instances are built once at startup with
//! [`ResourceInformationBuilder`] and never change afterwards.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{InitializationError, KeystoneError, KeystoneResult};
use crate::resource::ResourceId;

/// Field names that cannot be used for attributes or relationships.
pub const RESERVED_FIELD_NAMES: [&str; 4] = ["id", "type", "relationships", "links"];

/// Relationship cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// To-one relationship.
    One,
    /// To-many relationship.
    Many,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => f.write_str("to-one"),
            Self::Many => f.write_str("to-many"),
        }
    }
}

/// Identifier type of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdType {
    /// Signed 64-bit integer identifiers.
    #[default]
    Integer,
    /// Opaque string identifiers.
    String,
    /// UUID identifiers.
    Uuid,
}

impl IdType {
    /// Converts a raw path or body identifier into a [`ResourceId`].
    ///
    /// # Errors
    ///
    /// Returns [`KeystoneError::InvalidIdentifier`] when the value cannot be
    /// converted.
    pub fn parse(self, resource_type: &str, raw: &str) -> KeystoneResult<ResourceId> {
        match self {
            Self::Integer => raw
                .parse::<i64>()
                .map(ResourceId::Integer)
                .map_err(|e| KeystoneError::invalid_identifier(resource_type, raw, e.to_string())),
            Self::String if raw.is_empty() => Err(KeystoneError::invalid_identifier(
                resource_type,
                raw,
                "identifier must not be empty",
            )),
            Self::String => Ok(ResourceId::String(raw.to_string())),
            Self::Uuid => Uuid::parse_str(raw)
                .map(ResourceId::Uuid)
                .map_err(|e| KeystoneError::invalid_identifier(resource_type, raw, e.to_string())),
        }
    }
}

/// Relationship declared on a resource type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipDescriptor {
    /// Relationship name, as it appears in paths and documents.
    pub name: String,
    /// Target resource type.
    pub target_type: String,
    /// Relationship cardinality.
    pub cardinality: Cardinality,
}

impl RelationshipDescriptor {
    /// Creates a new descriptor.
    pub fn new(name: impl Into<String>, target_type: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            target_type: target_type.into(),
            cardinality,
        }
    }

    /// Returns `true` for to-many relationships.
    pub fn is_many(&self) -> bool {
        self.cardinality == Cardinality::Many
    }
}

/// Metadata for one resource type.
///
/// # Example
///
/// ```
/// use keystone_core::{Cardinality, IdType, ResourceInformation};
///
/// let info = ResourceInformation::builder("tasks")
///     .id_type(IdType::Integer)
///     .attribute("name")
///     .to_one("project", "projects")
///     .build()
///     .unwrap();
///
/// assert_eq!(info.resource_type(), "tasks");
/// assert_eq!(info.relationship("project").unwrap().cardinality, Cardinality::One);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceInformation {
    resource_type: String,
    id_field: String,
    id_type: IdType,
    attributes: Vec<String>,
    relationships: Vec<RelationshipDescriptor>,
}

impl ResourceInformation {
    /// Creates a builder for the given resource type.
    pub fn builder(resource_type: impl Into<String>) -> ResourceInformationBuilder {
        ResourceInformationBuilder::new(resource_type)
    }

    /// Resource type name.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Name of the identifier field.
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Identifier type.
    pub fn id_type(&self) -> IdType {
        self.id_type
    }

    /// Declared attribute names, in declaration order.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Declared relationships, in declaration order.
    pub fn relationships(&self) -> &[RelationshipDescriptor] {
        &self.relationships
    }

    /// Looks up a relationship by name.
    pub fn relationship(&self, name: &str) -> Option<&RelationshipDescriptor> {
        self.relationships.iter().find(|r| r.name == name)
    }

    /// Looks up a relationship by name, failing with a field-not-found error.
    pub fn require_relationship(&self, name: &str) -> KeystoneResult<&RelationshipDescriptor> {
        self.relationship(name)
            .ok_or_else(|| KeystoneError::field_not_found(&self.resource_type, name))
    }

    /// Returns `true` if `name` is a declared attribute.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }

    /// Returns `true` if `name` is an attribute, a relationship or the id field.
    pub fn has_field(&self, name: &str) -> bool {
        name == self.id_field || self.has_attribute(name) || self.relationship(name).is_some()
    }

    /// Parses a raw identifier with this type's id type.
    pub fn parse_id(&self, raw: &str) -> KeystoneResult<ResourceId> {
        self.id_type.parse(&self.resource_type, raw)
    }
}

/// Builder for [`ResourceInformation`].
#[derive(Debug, Clone)]
#[must_use]
pub struct ResourceInformationBuilder {
    resource_type: String,
    id_field: String,
    id_type: IdType,
    attributes: Vec<String>,
    relationships: Vec<RelationshipDescriptor>,
}

impl ResourceInformationBuilder {
    fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id_field: "id".to_string(),
            id_type: IdType::default(),
            attributes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Sets the identifier field name. Defaults to `id`.
    pub fn id_field(mut self, name: impl Into<String>) -> Self {
        self.id_field = name.into();
        self
    }

    /// Sets the identifier type. Defaults to [`IdType::Integer`].
    pub fn id_type(mut self, id_type: IdType) -> Self {
        self.id_type = id_type;
        self
    }

    /// Declares an attribute.
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(name.into());
        self
    }

    /// Declares several attributes.
    pub fn attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.extend(names.into_iter().map(Into::into));
        self
    }

    /// Declares a to-one relationship.
    pub fn to_one(self, name: impl Into<String>, target_type: impl Into<String>) -> Self {
        self.relationship(RelationshipDescriptor::new(name, target_type, Cardinality::One))
    }

    /// Declares a to-many relationship.
    pub fn to_many(self, name: impl Into<String>, target_type: impl Into<String>) -> Self {
        self.relationship(RelationshipDescriptor::new(name, target_type, Cardinality::Many))
    }

    /// Declares a relationship.
    pub fn relationship(mut self, descriptor: RelationshipDescriptor) -> Self {
        self.relationships.push(descriptor);
        self
    }

    /// Validates the definition and builds the metadata.
    ///
    /// # Errors
    ///
    /// Returns [`InitializationError::InvalidResource`] for empty or
    /// `/`-containing names, reserved field names and duplicate fields.
    pub fn build(self) -> Result<ResourceInformation, InitializationError> {
        let invalid = |reason: String| InitializationError::InvalidResource {
            resource_type: self.resource_type.clone(),
            reason,
        };

        if self.resource_type.is_empty() {
            return Err(invalid("resource type name must not be empty".to_string()));
        }
        if self.resource_type.contains('/') {
            return Err(invalid("resource type name must not contain '/'".to_string()));
        }
        if self.id_field.is_empty() {
            return Err(invalid("identifier field name must not be empty".to_string()));
        }

        let mut seen = HashSet::new();
        let fields = self
            .attributes
            .iter()
            .map(String::as_str)
            .chain(self.relationships.iter().map(|r| r.name.as_str()));
        for field in fields {
            if field.is_empty() || field.contains('/') {
                return Err(invalid(format!("invalid field name '{field}'")));
            }
            if RESERVED_FIELD_NAMES.contains(&field) || field == self.id_field {
                return Err(invalid(format!("field name '{field}' is reserved")));
            }
            if !seen.insert(field) {
                return Err(invalid(format!("field '{field}' is declared more than once")));
            }
        }

        Ok(ResourceInformation {
            resource_type: self.resource_type,
            id_field: self.id_field,
            id_type: self.id_type,
            attributes: self.attributes,
            relationships: self.relationships,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_builder_defaults() {
        let info = ResourceInformation::builder("projects")
            .attributes(["name", "description"])
            .to_many("tasks", "tasks")
            .build()
            .unwrap();

        assert_eq!(info.id_field(), "id");
        assert_eq!(info.id_type(), IdType::Integer);
        assert_eq!(info.attributes(), ["name", "description"]);
        assert!(info.relationship("tasks").unwrap().is_many());
        assert!(info.has_field("id"));
        assert!(!info.has_field("owner"));
    }

    #[test]
    fn test_builder_rejects_bad_definitions() {
        assert!(ResourceInformation::builder("").build().is_err());
        assert!(ResourceInformation::builder("a/b").build().is_err());
        assert!(ResourceInformation::builder("tasks").attribute("type").build().is_err());
        assert!(ResourceInformation::builder("tasks")
            .attribute("project")
            .to_one("project", "projects")
            .build()
            .is_err());
        assert!(ResourceInformation::builder("tasks")
            .id_field("key")
            .attribute("key")
            .build()
            .is_err());
    }

    #[test]
    fn test_require_relationship() {
        let info = ResourceInformation::builder("tasks")
            .to_one("project", "projects")
            .build()
            .unwrap();
        let error = info.require_relationship("owner").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ResourceFieldNotFound);
    }

    #[test]
    fn test_id_parsing() {
        assert_eq!(IdType::Integer.parse("tasks", "42").unwrap(), ResourceId::Integer(42));
        assert_eq!(
            IdType::Integer.parse("tasks", "abc").unwrap_err().kind(),
            ErrorKind::InvalidIdentifier
        );
        assert_eq!(
            IdType::String.parse("tags", "rust").unwrap(),
            ResourceId::String("rust".to_string())
        );
        assert!(IdType::String.parse("tags", "").is_err());

        let uuid = Uuid::now_v7();
        assert_eq!(
            IdType::Uuid.parse("users", &uuid.to_string()).unwrap(),
            ResourceId::Uuid(uuid)
        );
        assert!(IdType::Uuid.parse("users", "not-a-uuid").is_err());
    }
}
