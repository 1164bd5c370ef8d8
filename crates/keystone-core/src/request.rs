//! Wire-format request payloads.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::linkage::LinkageData;

/// Top-level request document.
///
/// `data` is absent or `null`, a single resource object, or an array of
/// resource objects (relationship endpoints).
///
/// # Example
///
/// ```
/// use keystone_core::RequestBody;
///
/// let body: RequestBody = serde_json::from_str(
///     r#"{"data": {"type": "projects", "attributes": {"name": "sample project"}}}"#,
/// )
/// .unwrap();
///
/// let data = body.single().unwrap();
/// assert_eq!(data.resource_type, "projects");
/// assert!(data.id.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestBody {
    /// Primary data.
    #[serde(default)]
    pub data: Option<BodyData>,
}

impl RequestBody {
    /// Wraps a single resource object.
    pub fn single_data(data: DataBody) -> Self {
        Self {
            data: Some(BodyData::Single(data)),
        }
    }

    /// Wraps several resource objects.
    pub fn multiple_data(data: Vec<DataBody>) -> Self {
        Self {
            data: Some(BodyData::Multiple(data)),
        }
    }

    /// Returns the single resource object, if `data` is one.
    pub fn single(&self) -> Option<&DataBody> {
        match &self.data {
            Some(BodyData::Single(data)) => Some(data),
            _ => None,
        }
    }

    /// Returns the resource objects as a list: empty for `null`, one element
    /// for a single object.
    pub fn as_list(&self) -> &[DataBody] {
        match &self.data {
            None => &[],
            Some(BodyData::Single(data)) => std::slice::from_ref(data),
            Some(BodyData::Multiple(items)) => items,
        }
    }
}

/// Primary data of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BodyData {
    /// A single resource object.
    Single(DataBody),
    /// An array of resource objects.
    Multiple(Vec<DataBody>),
}

/// A resource object as sent by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataBody {
    /// Resource type.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Identifier; absent when the server generates it.
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Attribute values.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, Value>,
    /// Relationship linkage.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub relationships: IndexMap<String, RelationshipEntry>,
}

impl DataBody {
    /// Creates a resource object of the given type.
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
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Sets relationship linkage.
    #[must_use]
    pub fn with_relationship(mut self, name: impl Into<String>, data: RelationshipData) -> Self {
        self.relationships.insert(name.into(), RelationshipEntry { data });
        self
    }

    /// Returns `{type, id}` if the object carries an id.
    pub fn linkage(&self) -> Option<LinkageData> {
        self.id
            .as_ref()
            .map(|id| LinkageData::new(&self.resource_type, id))
    }
}

/// A relationship inside a resource object.
///
/// Both `{"data": ...}` and `{"linkage": ...}` wrappers are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEntry {
    /// The linkage.
    #[serde(alias = "linkage")]
    pub data: RelationshipData,
}

/// Relationship linkage sent by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationshipData {
    /// To-many linkage.
    Many(Vec<LinkageData>),
    /// To-one linkage; `None` for `null`.
    One(Option<LinkageData>),
}

impl RelationshipData {
    /// All identifier objects in this linkage.
    pub fn items(&self) -> Vec<&LinkageData> {
        match self {
            Self::Many(items) => items.iter().collect(),
            Self::One(item) => item.iter().collect(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) => Ok(Some(id)),
        Some(Value::Number(id)) => Ok(Some(id.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "identifier must be a string, got {other}"
        ))),
    }
}
