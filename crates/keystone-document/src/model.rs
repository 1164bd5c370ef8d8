//! JSON:API document types.
//!
//! These types mirror the wire shape of a top-level document:
//! <https://jsonapi.org/format/>

use indexmap::IndexMap;
use keystone_core::{ErrorData, Linkage};
use serde::Serialize;
use serde_json::Value;

/// Top-level document.
///
/// Success documents carry `data` and error documents carry `errors`; the two
/// never appear together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Primary data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<PrimaryData>,
    /// Error objects.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorData>,
    /// Links of the document itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    /// Side-loaded resources.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<ResourceObject>,
}

impl Document {
    /// Creates a success document.
    pub fn with_data(data: PrimaryData, links: Links) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
            links: Some(links),
            included: Vec::new(),
        }
    }

    /// Creates an error document.
    pub fn with_errors(errors: Vec<ErrorData>) -> Self {
        Self {
            data: None,
            errors,
            links: None,
            included: Vec::new(),
        }
    }
}

/// Primary data of a success document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PrimaryData {
    /// A resource object, or `null`.
    Resource(Option<ResourceObject>),
    /// An array of resource objects.
    Collection(Vec<ResourceObject>),
    /// Relationship linkage.
    Linkage(Linkage),
}

/// A resource object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceObject {
    /// Resource type name.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Identifier, rendered as a string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Attribute values in declaration order.
    pub attributes: IndexMap<String, Value>,
    /// Relationship objects in declaration order.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub relationships: IndexMap<String, RelationshipObject>,
    /// `self` link of the resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

/// A relationship object: links plus linkage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipObject {
    /// `<base>/<type>/<id>/relationships/<name>`
    #[serde(rename = "self", skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    /// `<base>/<type>/<id>/<name>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,
    /// `null`/object for to-one, array for to-many. Never omitted.
    pub linkage: Linkage,
}

/// A links object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Links {
    /// `self` link.
    #[serde(rename = "self")]
    pub self_link: String,
    /// `related` link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,
}

impl Links {
    /// Creates links with only `self`.
    pub fn self_only(self_link: impl Into<String>) -> Self {
        Self {
            self_link: self_link.into(),
            related: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_primary_data_is_rendered() {
        let document = Document::with_data(PrimaryData::Resource(None), Links::self_only("/tasks/1/project"));
        assert_eq!(
            serde_json::to_value(document).unwrap(),
            json!({"data": null, "links": {"self": "/tasks/1/project"}})
        );
    }

    #[test]
    fn test_error_document_has_no_data() {
        let error = ErrorData::builder().detail("missing").build();
        let value = serde_json::to_value(Document::with_errors(vec![error])).unwrap();
        assert!(value.get("data").is_none());
        assert_eq!(value["errors"][0]["detail"], json!("missing"));
    }
}
