//! Single resource controllers, plus resource creation on collection paths.

use std::sync::Arc;

use http::Method;
use keystone_core::{KeystoneError, KeystoneResult, QueryParams, RequestBody, ResourceRegistry};
use keystone_router::JsonPath;

use super::body;
use super::Controller;
use crate::response::{BaseResponse, ResourceResponse};

/// `GET /<type>/<id>`
#[derive(Debug, Clone)]
pub struct ResourceGet {
    registry: Arc<ResourceRegistry>,
}

impl ResourceGet {
    /// Creates the controller.
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self { registry }
    }
}

impl Controller for ResourceGet {
    fn name(&self) -> &'static str {
        "ResourceGet"
    }

    fn is_acceptable(&self, path: &JsonPath, method: &Method) -> bool {
        matches!(path, JsonPath::Resource(_)) && method == Method::GET
    }

    fn handle(&self, path: &JsonPath, params: &QueryParams, _body: Option<&RequestBody>) -> KeystoneResult<BaseResponse> {
        let JsonPath::Resource(resource_path) = path else {
            return Err(KeystoneError::internal(format!("{} cannot handle {path}", self.name())));
        };
        let resource = self
            .registry
            .entry(&resource_path.resource_type)?
            .repository()
            .find_one(&resource_path.id, params)?
            .ok_or_else(|| {
                KeystoneError::resource_not_found(&resource_path.resource_type, resource_path.id.to_string())
            })?;
        Ok(ResourceResponse::ok(Some(resource), path, params).into())
    }
}

/// `POST /<type>`
///
/// Client-generated ids are accepted.
#[derive(Debug, Clone)]
pub struct ResourcePost {
    registry: Arc<ResourceRegistry>,
}

impl ResourcePost {
    /// Creates the controller.
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self { registry }
    }
}

impl Controller for ResourcePost {
    fn name(&self) -> &'static str {
        "ResourcePost"
    }

    fn is_acceptable(&self, path: &JsonPath, method: &Method) -> bool {
        matches!(path, JsonPath::Collection(_)) && method == Method::POST
    }

    fn handle(&self, path: &JsonPath, params: &QueryParams, body: Option<&RequestBody>) -> KeystoneResult<BaseResponse> {
        let resource_type = path.resource_type();
        let data = body::require_single(body, &Method::POST, resource_type)?;
        body::check_type(&self.registry, data, resource_type, &Method::POST)?;

        let entry = self.registry.entry(resource_type)?;
        let resource = body::build_resource(&self.registry, entry.information(), data, &Method::POST)?;
        let saved = entry.repository().save(resource)?;

        tracing::debug!(resource_type, id = ?saved.id, "Resource created");
        Ok(ResourceResponse::created(saved, path, params).into())
    }
}

/// `PATCH /<type>/<id>`
///
/// Attributes and relationships present in the body replace the stored values;
/// everything else is kept.
#[derive(Debug, Clone)]
pub struct ResourcePatch {
    registry: Arc<ResourceRegistry>,
}

impl ResourcePatch {
    /// Creates the controller.
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self { registry }
    }
}

impl Controller for ResourcePatch {
    fn name(&self) -> &'static str {
        "ResourcePatch"
    }

    fn is_acceptable(&self, path: &JsonPath, method: &Method) -> bool {
        matches!(path, JsonPath::Resource(_)) && method == Method::PATCH
    }

    fn handle(&self, path: &JsonPath, params: &QueryParams, body: Option<&RequestBody>) -> KeystoneResult<BaseResponse> {
        let JsonPath::Resource(resource_path) = path else {
            return Err(KeystoneError::internal(format!("{} cannot handle {path}", self.name())));
        };
        let resource_type = resource_path.resource_type.as_str();
        let data = body::require_single(body, &Method::PATCH, resource_type)?;
        body::check_type(&self.registry, data, resource_type, &Method::PATCH)?;

        let entry = self.registry.entry(resource_type)?;
        if let Some(raw) = &data.id {
            if entry.information().parse_id(raw)? != resource_path.id {
                return Err(KeystoneError::request_body(
                    &Method::PATCH,
                    resource_type,
                    format!("body id '{raw}' does not match path id '{}'", resource_path.id),
                ));
            }
        }
        let mut stored = entry
            .repository()
            .find_one(&resource_path.id, params)?
            .ok_or_else(|| KeystoneError::resource_not_found(resource_type, resource_path.id.to_string()))?;

        let changes = body::build_resource(&self.registry, entry.information(), data, &Method::PATCH)?;
        stored.attributes.extend(changes.attributes);
        stored.relationships = changes.relationships;
        stored.id = Some(resource_path.id.clone());

        let saved = entry.repository().save(stored)?;
        Ok(ResourceResponse::ok(Some(saved), path, params).into())
    }
}

/// `DELETE /<type>/<id>`
///
/// Deleting an absent resource succeeds.
#[derive(Debug, Clone)]
pub struct ResourceDelete {
    registry: Arc<ResourceRegistry>,
}

impl ResourceDelete {
    /// Creates the controller.
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self { registry }
    }
}

impl Controller for ResourceDelete {
    fn name(&self) -> &'static str {
        "ResourceDelete"
    }

    fn is_acceptable(&self, path: &JsonPath, method: &Method) -> bool {
        matches!(path, JsonPath::Resource(_)) && method == Method::DELETE
    }

    fn handle(&self, path: &JsonPath, params: &QueryParams, _body: Option<&RequestBody>) -> KeystoneResult<BaseResponse> {
        let JsonPath::Resource(resource_path) = path else {
            return Err(KeystoneError::internal(format!("{} cannot handle {path}", self.name())));
        };
        self.registry
            .entry(&resource_path.resource_type)?
            .repository()
            .delete(&resource_path.id)?;
        Ok(ResourceResponse::no_content(path, params).into())
    }
}
