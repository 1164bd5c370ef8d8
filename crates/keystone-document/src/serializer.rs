//! Response serialization.

use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use indexmap::IndexMap;
use keystone_core::{
    Cardinality, ErrorData, KeystoneError, KeystoneResult, Linkage, QueryParams, Resource, ResourceRegistry,
};
use keystone_dispatch::{BaseResponse, CollectionResponse, LinkageResponse, ResourceResponse};
use keystone_router::JsonPath;
use serde_json::Value;

use crate::include::{collect_included, IncludePath};
use crate::links::LinkBuilder;
use crate::model::{Document, Links, PrimaryData, RelationshipObject, ResourceObject};

/// Media type of every rendered document.
pub const MEDIA_TYPE: &str = "application/vnd.api+json";

/// Default limit on the number of segments of an include path.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 3;

/// A response ready for the transport layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    /// HTTP status.
    pub status: StatusCode,
    /// Document body; `None` for `204 No Content`.
    pub body: Option<Value>,
}

impl RenderedDocument {
    /// `Content-Type` of the body, if there is one.
    pub fn content_type(&self) -> Option<&'static str> {
        self.body.as_ref().map(|_| MEDIA_TYPE)
    }

    /// Encodes the body as JSON. Empty when there is no body.
    pub fn to_bytes(&self) -> KeystoneResult<Bytes> {
        match &self.body {
            Some(body) => serde_json::to_vec(body)
                .map(Bytes::from)
                .map_err(|e| KeystoneError::internal_with_source("failed to encode document", e)),
            None => Ok(Bytes::new()),
        }
    }
}

/// Turns dispatch outcomes into JSON:API documents.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use http::StatusCode;
/// use keystone_core::{fixtures, QueryParams, Resource};
/// use keystone_dispatch::{BaseResponse, ResourceResponse};
/// use keystone_document::DocumentSerializer;
/// use keystone_router::JsonPath;
/// use serde_json::json;
///
/// let registry = Arc::new(fixtures::sample_registry().unwrap());
/// let serializer = DocumentSerializer::new(registry);
///
/// let task = Resource::new("tasks").with_id(1_i64).with_attribute("name", "write docs");
/// let path = JsonPath::resource("tasks", 1_i64);
/// let response = BaseResponse::from(ResourceResponse::ok(Some(task), &path, &QueryParams::new()));
///
/// let rendered = serializer.render(&response).unwrap();
/// assert_eq!(rendered.status, StatusCode::OK);
/// let body = rendered.body.unwrap();
/// assert_eq!(body["data"]["attributes"], json!({"name": "write docs", "description": null}));
/// assert_eq!(body["data"]["relationships"]["project"]["linkage"], json!(null));
/// assert_eq!(body["links"]["self"], json!("https://service.local/tasks/1"));
/// ```
#[derive(Debug, Clone)]
pub struct DocumentSerializer {
    registry: Arc<ResourceRegistry>,
    links: LinkBuilder,
    max_include_depth: usize,
}

impl DocumentSerializer {
    /// Creates a serializer generating links under the registry's base URL.
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        let links = LinkBuilder::new(registry.base_url());
        Self {
            registry,
            links,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    /// Sets the include depth limit.
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Generates links under `base_url` instead of the registry's.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.links = LinkBuilder::new(base_url);
        self
    }

    /// The link builder in use.
    pub fn links(&self) -> &LinkBuilder {
        &self.links
    }

    /// Checks the include paths of `params` against the type `path` targets
    /// and the include depth limit.
    ///
    /// Hosts call this before dispatching so that a bad `include` is
    /// rejected before any repository write.
    ///
    /// # Errors
    ///
    /// Returns [`KeystoneError::QueryParameters`] for an unknown, empty or
    /// too deep include path.
    pub fn validate_includes(&self, path: &JsonPath, params: &QueryParams) -> KeystoneResult<()> {
        IncludePath::parse_all(&self.registry, path.target_type(), params.includes(), self.max_include_depth)?;
        Ok(())
    }

    /// Renders a dispatch outcome to status and body.
    pub fn render(&self, response: &BaseResponse) -> KeystoneResult<RenderedDocument> {
        let status = response.http_status();
        let body = match self.document(response)? {
            Some(document) => Some(
                serde_json::to_value(document)
                    .map_err(|e| KeystoneError::internal_with_source("failed to serialize document", e))?,
            ),
            None => None,
        };
        Ok(RenderedDocument { status, body })
    }

    /// Renders an error document.
    pub fn render_errors(&self, status: StatusCode, errors: Vec<ErrorData>) -> KeystoneResult<RenderedDocument> {
        let body = serde_json::to_value(Document::with_errors(errors))
            .map_err(|e| KeystoneError::internal_with_source("failed to serialize error document", e))?;
        Ok(RenderedDocument {
            status,
            body: Some(body),
        })
    }

    /// Builds the document for a dispatch outcome. `None` for no content.
    pub fn document(&self, response: &BaseResponse) -> KeystoneResult<Option<Document>> {
        match response {
            BaseResponse::Resource(response) if response.status == StatusCode::NO_CONTENT => Ok(None),
            BaseResponse::Resource(response) => self.resource_document(response).map(Some),
            BaseResponse::Collection(response) => self.collection_document(response).map(Some),
            BaseResponse::Linkage(response) => Ok(Some(self.linkage_document(response))),
            BaseResponse::Error(response) => Ok(Some(Document::with_errors(response.errors.clone()))),
        }
    }

    /// Builds the resource object of `resource`.
    ///
    /// Attributes follow declaration order and `fields[type]`; relationship
    /// linkage is `null`/`[]` for unset relationships.
    pub fn resource_object(&self, resource: &Resource, params: &QueryParams) -> KeystoneResult<ResourceObject> {
        let resource_type = resource.resource_type.as_str();
        let information = self
            .registry
            .get_entry(resource_type)
            .ok_or_else(|| KeystoneError::internal(format!("cannot serialize unregistered type '{resource_type}'")))?
            .information();

        let fields = params.fields_for(resource_type);
        let attributes: IndexMap<String, Value> = information
            .attributes()
            .iter()
            .filter(|name| fields.map_or(true, |fields| fields.contains(name.as_str())))
            .map(|name| (name.clone(), resource.attribute(name).cloned().unwrap_or(Value::Null)))
            .collect();

        let relationships = information
            .relationships()
            .iter()
            .map(|descriptor| {
                let linkage = match (resource.related(&descriptor.name), descriptor.cardinality) {
                    (Some(related), _) => Linkage::from_related(related),
                    (None, Cardinality::One) => Linkage::One(None),
                    (None, Cardinality::Many) => Linkage::Many(Vec::new()),
                };
                let (self_link, related) = match &resource.id {
                    Some(id) => (
                        Some(self.links.relationship_self(resource_type, id, &descriptor.name)),
                        Some(self.links.relationship_related(resource_type, id, &descriptor.name)),
                    ),
                    None => (None, None),
                };
                (
                    descriptor.name.clone(),
                    RelationshipObject {
                        self_link,
                        related,
                        linkage,
                    },
                )
            })
            .collect();

        Ok(ResourceObject {
            resource_type: resource_type.to_string(),
            id: resource.id.as_ref().map(ToString::to_string),
            attributes,
            relationships,
            links: resource
                .id
                .as_ref()
                .map(|id| Links::self_only(self.links.resource(resource_type, id))),
        })
    }

    fn resource_document(&self, response: &ResourceResponse) -> KeystoneResult<Document> {
        let data = response
            .data
            .as_ref()
            .map(|resource| self.resource_object(resource, &response.params))
            .transpose()?;
        let primary: Vec<&Resource> = response.data.iter().collect();

        let mut document = Document::with_data(PrimaryData::Resource(data), self.self_links(&response.path));
        document.included = self.included(&response.path, &primary, &response.params)?;
        Ok(document)
    }

    fn collection_document(&self, response: &CollectionResponse) -> KeystoneResult<Document> {
        let data = response
            .data
            .iter()
            .map(|resource| self.resource_object(resource, &response.params))
            .collect::<KeystoneResult<Vec<_>>>()?;
        let primary: Vec<&Resource> = response.data.iter().collect();

        let mut document = Document::with_data(PrimaryData::Collection(data), self.self_links(&response.path));
        document.included = self.included(&response.path, &primary, &response.params)?;
        Ok(document)
    }

    fn linkage_document(&self, response: &LinkageResponse) -> Document {
        let links = match (response.path.parent(), response.path.relationship()) {
            (Some(parent), Some(relationship)) => Links {
                self_link: self
                    .links
                    .relationship_self(&parent.resource_type, &parent.id, &relationship.name),
                related: Some(self.links.relationship_related(
                    &parent.resource_type,
                    &parent.id,
                    &relationship.name,
                )),
            },
            _ => Links::self_only(self.links.path(&response.path)),
        };
        Document::with_data(PrimaryData::Linkage(response.linkage.clone()), links)
    }

    fn self_links(&self, path: &JsonPath) -> Links {
        Links::self_only(self.links.path(path))
    }

    fn included(&self, path: &JsonPath, primary: &[&Resource], params: &QueryParams) -> KeystoneResult<Vec<ResourceObject>> {
        if params.includes().is_empty() {
            return Ok(Vec::new());
        }
        let paths = IncludePath::parse_all(&self.registry, path.target_type(), params.includes(), self.max_include_depth)?;
        let included = collect_included(primary, &paths);
        tracing::debug!(path = %path, included = included.len(), "Resolved included resources");
        included
            .into_iter()
            .map(|resource| self.resource_object(resource, params))
            .collect()
    }
}
