//! Request body helpers shared by controllers.

use http::Method;
use keystone_core::{
    Cardinality, DataBody, KeystoneError, KeystoneResult, LinkageData, QueryParams, Related, RelationshipData,
    RelationshipDescriptor, RequestBody, Resource, ResourceId, ResourceInformation, ResourceRegistry,
};
use keystone_router::ResourcePath;

/// Returns the body, failing when it is absent.
pub(crate) fn require_body<'a>(
    body: Option<&'a RequestBody>,
    method: &Method,
    resource_type: &str,
) -> KeystoneResult<&'a RequestBody> {
    body.ok_or_else(|| KeystoneError::request_body(method, resource_type, "request body is missing"))
}

/// Returns the single resource object of the body.
pub(crate) fn require_single<'a>(
    body: Option<&'a RequestBody>,
    method: &Method,
    resource_type: &str,
) -> KeystoneResult<&'a DataBody> {
    let body = require_body(body, method, resource_type)?;
    match body.data {
        None => Err(KeystoneError::request_body(method, resource_type, "no data field")),
        Some(_) => body.single().ok_or_else(|| {
            KeystoneError::request_body(method, resource_type, "expected a single resource object")
        }),
    }
}

/// Checks that the body names a registered type equal to `expected`.
pub(crate) fn check_type(
    registry: &ResourceRegistry,
    data: &DataBody,
    expected: &str,
    method: &Method,
) -> KeystoneResult<()> {
    registry.entry(&data.resource_type)?;
    if data.resource_type == expected {
        Ok(())
    } else {
        Err(KeystoneError::request_body(
            method,
            expected,
            format!("body type '{}' does not match '{expected}'", data.resource_type),
        ))
    }
}

/// Loads the owning resource of a field or relationships path.
pub(crate) fn find_parent(registry: &ResourceRegistry, parent: &ResourcePath) -> KeystoneResult<Resource> {
    registry
        .entry(&parent.resource_type)?
        .repository()
        .find_one(&parent.id, &QueryParams::new())?
        .ok_or_else(|| KeystoneError::resource_not_found(&parent.resource_type, parent.id.to_string()))
}

/// Resolves one linkage object of `descriptor` to the stored target.
pub(crate) fn resolve_target(
    registry: &ResourceRegistry,
    descriptor: &RelationshipDescriptor,
    item: &LinkageData,
    method: &Method,
    source_type: &str,
) -> KeystoneResult<Resource> {
    let id = target_id(registry, descriptor, item, method, source_type)?;
    registry
        .entry(&descriptor.target_type)?
        .repository()
        .find_one(&id, &QueryParams::new())?
        .ok_or_else(|| KeystoneError::resource_not_found(&descriptor.target_type, &item.id))
}

/// Converts one linkage object of `descriptor` to a target id, without
/// loading the target.
pub(crate) fn target_id(
    registry: &ResourceRegistry,
    descriptor: &RelationshipDescriptor,
    item: &LinkageData,
    method: &Method,
    source_type: &str,
) -> KeystoneResult<ResourceId> {
    if item.resource_type != descriptor.target_type {
        return Err(KeystoneError::request_body(
            method,
            source_type,
            format!(
                "relationship '{}' expects type '{}', got '{}'",
                descriptor.name, descriptor.target_type, item.resource_type
            ),
        ));
    }
    registry
        .entry(&descriptor.target_type)?
        .information()
        .parse_id(&item.id)
}

/// Resolves linkage objects to the ids of existing targets.
pub(crate) fn resolve_ids(
    registry: &ResourceRegistry,
    descriptor: &RelationshipDescriptor,
    items: &[DataBody],
    method: &Method,
    source_type: &str,
) -> KeystoneResult<Vec<ResourceId>> {
    items
        .iter()
        .map(|item| {
            let linkage = item.linkage().ok_or_else(|| {
                KeystoneError::request_body(method, source_type, "linkage object without id")
            })?;
            let target = resolve_target(registry, descriptor, &linkage, method, source_type)?;
            target
                .id
                .ok_or_else(|| KeystoneError::internal("repository returned a resource without id"))
        })
        .collect()
}

/// Converts a resource object into a domain object of type `information`.
///
/// Attribute and relationship names must be declared; relationship linkage is
/// resolved through the target repositories.
pub(crate) fn build_resource(
    registry: &ResourceRegistry,
    information: &ResourceInformation,
    data: &DataBody,
    method: &Method,
) -> KeystoneResult<Resource> {
    let resource_type = information.resource_type();
    let mut resource = Resource::new(resource_type);
    if let Some(raw) = &data.id {
        resource.id = Some(information.parse_id(raw)?);
    }

    for (name, value) in &data.attributes {
        if !information.has_attribute(name) {
            return Err(KeystoneError::field_not_found(resource_type, name)
                .at_pointer(format!("/data/attributes/{name}")));
        }
        resource.attributes.insert(name.clone(), value.clone());
    }

    for (name, entry) in &data.relationships {
        let descriptor = information
            .require_relationship(name)
            .map_err(|e| e.at_pointer(format!("/data/relationships/{name}")))?;
        let related = match (descriptor.cardinality, &entry.data) {
            (Cardinality::One, RelationshipData::One(None)) => Related::One(None),
            (Cardinality::One, RelationshipData::One(Some(item))) => Related::One(Some(Box::new(
                resolve_target(registry, descriptor, item, method, resource_type)?,
            ))),
            (Cardinality::Many, RelationshipData::Many(items)) => Related::Many(
                items
                    .iter()
                    .map(|item| resolve_target(registry, descriptor, item, method, resource_type))
                    .collect::<KeystoneResult<_>>()?,
            ),
            (Cardinality::One, RelationshipData::Many(_)) => {
                return Err(KeystoneError::request_body(
                    method,
                    resource_type,
                    format!("relationship '{name}' is to-one and expects an object or null"),
                ))
            }
            (Cardinality::Many, RelationshipData::One(_)) => {
                return Err(KeystoneError::request_body(
                    method,
                    resource_type,
                    format!("relationship '{name}' is to-many and expects an array"),
                ))
            }
        };
        resource.relationships.insert(name.clone(), related);
    }

    Ok(resource)
}
