//! Linkage-only access: `/<type>/<id>/relationships/<relationship>`.

use std::sync::Arc;

use http::Method;
use keystone_core::{
    Cardinality, KeystoneError, KeystoneResult, Linkage, QueryParams, RelationshipRepository, RequestBody,
    ResourceId, ResourceRegistry,
};
use keystone_router::{JsonPath, RelationshipsPath};

use super::body;
use super::Controller;
use crate::response::{BaseResponse, LinkageResponse, ResourceResponse};

fn relationships_path<'a>(controller: &dyn Controller, path: &'a JsonPath) -> KeystoneResult<&'a RelationshipsPath> {
    match path {
        JsonPath::Relationships(relationships) => Ok(relationships),
        _ => Err(KeystoneError::internal(format!(
            "{} cannot handle {path}",
            controller.name()
        ))),
    }
}

fn accepts(path: &JsonPath, method: &Method, expected: &Method, cardinality: Cardinality) -> bool {
    matches!(path, JsonPath::Relationships(r) if r.relationship.cardinality == cardinality) && method == expected
}

/// Checks the parent exists and returns the relationship repository.
fn prepare<'r>(
    registry: &'r ResourceRegistry,
    path: &RelationshipsPath,
) -> KeystoneResult<&'r Arc<dyn RelationshipRepository>> {
    body::find_parent(registry, &path.parent)?;
    registry
        .entry(&path.parent.resource_type)?
        .relationship_repository(&path.relationship.name)
}

/// Reads the single linkage object of a to-one body; `None` for `null`.
fn to_one_target(
    registry: &ResourceRegistry,
    path: &RelationshipsPath,
    body: Option<&RequestBody>,
    method: &Method,
) -> KeystoneResult<Option<ResourceId>> {
    let source_type = path.parent.resource_type.as_str();
    let request = body::require_body(body, method, source_type)?;
    if request.data.is_none() {
        return Ok(None);
    }
    let data = body::require_single(body, method, source_type)?;
    let ids = body::resolve_ids(
        registry,
        &path.relationship,
        std::slice::from_ref(data),
        method,
        source_type,
    )?;
    Ok(ids.into_iter().next())
}

/// Reads the linkage objects of a to-many body, resolving each target.
fn to_many_targets(
    registry: &ResourceRegistry,
    path: &RelationshipsPath,
    body: Option<&RequestBody>,
    method: &Method,
) -> KeystoneResult<Vec<ResourceId>> {
    let source_type = path.parent.resource_type.as_str();
    let request = body::require_body(body, method, source_type)?;
    body::resolve_ids(registry, &path.relationship, request.as_list(), method, source_type)
}

/// `GET /<type>/<id>/relationships/<relationship>`
#[derive(Debug, Clone)]
pub struct RelationshipsResourceGet {
    registry: Arc<ResourceRegistry>,
}

impl RelationshipsResourceGet {
    /// Creates the controller.
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self { registry }
    }
}

impl Controller for RelationshipsResourceGet {
    fn name(&self) -> &'static str {
        "RelationshipsResourceGet"
    }

    fn is_acceptable(&self, path: &JsonPath, method: &Method) -> bool {
        matches!(path, JsonPath::Relationships(_)) && method == Method::GET
    }

    fn handle(&self, path: &JsonPath, params: &QueryParams, _body: Option<&RequestBody>) -> KeystoneResult<BaseResponse> {
        let relationships = relationships_path(self, path)?;
        let repository = prepare(&self.registry, relationships)?;
        let source = &relationships.parent.id;
        let name = relationships.relationship.name.as_str();

        let linkage = match relationships.relationship.cardinality {
            Cardinality::One => Linkage::One(
                repository
                    .find_one_target(source, name, params)?
                    .and_then(|target| target.linkage_data()),
            ),
            Cardinality::Many => Linkage::Many(
                repository
                    .find_many_targets(source, name, params)?
                    .iter()
                    .filter_map(|target| target.linkage_data())
                    .collect(),
            ),
        };

        Ok(LinkageResponse {
            linkage,
            path: path.clone(),
            params: params.clone(),
        }
        .into())
    }
}

/// `POST /<type>/<id>/relationships/<relationship>`
///
/// To-one: sets the relationship. To-many: adds members.
#[derive(Debug, Clone)]
pub struct RelationshipsResourcePost {
    registry: Arc<ResourceRegistry>,
    cardinality: Cardinality,
}

impl RelationshipsResourcePost {
    /// Creates the controller for relationships of `cardinality`.
    pub fn new(registry: Arc<ResourceRegistry>, cardinality: Cardinality) -> Self {
        Self { registry, cardinality }
    }
}

impl Controller for RelationshipsResourcePost {
    fn name(&self) -> &'static str {
        match self.cardinality {
            Cardinality::One => "ToOneRelationshipsResourcePost",
            Cardinality::Many => "ToManyRelationshipsResourcePost",
        }
    }

    fn is_acceptable(&self, path: &JsonPath, method: &Method) -> bool {
        accepts(path, method, &Method::POST, self.cardinality)
    }

    fn handle(&self, path: &JsonPath, params: &QueryParams, body: Option<&RequestBody>) -> KeystoneResult<BaseResponse> {
        let relationships = relationships_path(self, path)?;
        let repository = prepare(&self.registry, relationships)?;
        let source = &relationships.parent.id;
        let name = relationships.relationship.name.as_str();

        match self.cardinality {
            Cardinality::One => {
                let target = to_one_target(&self.registry, relationships, body, &Method::POST)?.ok_or_else(|| {
                    KeystoneError::request_body(
                        &Method::POST,
                        &relationships.parent.resource_type,
                        "no data field",
                    )
                })?;
                repository.set_relation(source, Some(&target), name)?;
            }
            Cardinality::Many => {
                let targets = to_many_targets(&self.registry, relationships, body, &Method::POST)?;
                repository.add_relations(source, &targets, name)?;
            }
        }
        Ok(ResourceResponse::no_content(path, params).into())
    }
}

/// `PATCH /<type>/<id>/relationships/<relationship>`
///
/// To-one: sets the relationship, `null` clears it. To-many: replaces all
/// members, `[]` clears them.
#[derive(Debug, Clone)]
pub struct RelationshipsResourcePatch {
    registry: Arc<ResourceRegistry>,
    cardinality: Cardinality,
}

impl RelationshipsResourcePatch {
    /// Creates the controller for relationships of `cardinality`.
    pub fn new(registry: Arc<ResourceRegistry>, cardinality: Cardinality) -> Self {
        Self { registry, cardinality }
    }
}

impl Controller for RelationshipsResourcePatch {
    fn name(&self) -> &'static str {
        match self.cardinality {
            Cardinality::One => "ToOneRelationshipsResourcePatch",
            Cardinality::Many => "ToManyRelationshipsResourcePatch",
        }
    }

    fn is_acceptable(&self, path: &JsonPath, method: &Method) -> bool {
        accepts(path, method, &Method::PATCH, self.cardinality)
    }

    fn handle(&self, path: &JsonPath, params: &QueryParams, body: Option<&RequestBody>) -> KeystoneResult<BaseResponse> {
        let relationships = relationships_path(self, path)?;
        let repository = prepare(&self.registry, relationships)?;
        let source = &relationships.parent.id;
        let name = relationships.relationship.name.as_str();

        match self.cardinality {
            Cardinality::One => {
                let target = to_one_target(&self.registry, relationships, body, &Method::PATCH)?;
                repository.set_relation(source, target.as_ref(), name)?;
            }
            Cardinality::Many => {
                let targets = to_many_targets(&self.registry, relationships, body, &Method::PATCH)?;
                repository.set_relations(source, &targets, name)?;
            }
        }
        Ok(ResourceResponse::no_content(path, params).into())
    }
}

/// `DELETE /<type>/<id>/relationships/<relationship>`
///
/// To-one: clears the relationship, the body is ignored. To-many: removes the
/// listed members; targets do not need to exist.
#[derive(Debug, Clone)]
pub struct RelationshipsResourceDelete {
    registry: Arc<ResourceRegistry>,
    cardinality: Cardinality,
}

impl RelationshipsResourceDelete {
    /// Creates the controller for relationships of `cardinality`.
    pub fn new(registry: Arc<ResourceRegistry>, cardinality: Cardinality) -> Self {
        Self { registry, cardinality }
    }
}

impl Controller for RelationshipsResourceDelete {
    fn name(&self) -> &'static str {
        match self.cardinality {
            Cardinality::One => "ToOneRelationshipsResourceDelete",
            Cardinality::Many => "ToManyRelationshipsResourceDelete",
        }
    }

    fn is_acceptable(&self, path: &JsonPath, method: &Method) -> bool {
        accepts(path, method, &Method::DELETE, self.cardinality)
    }

    fn handle(&self, path: &JsonPath, params: &QueryParams, body: Option<&RequestBody>) -> KeystoneResult<BaseResponse> {
        let relationships = relationships_path(self, path)?;
        let repository = prepare(&self.registry, relationships)?;
        let source = &relationships.parent.id;
        let source_type = relationships.parent.resource_type.as_str();
        let name = relationships.relationship.name.as_str();

        match self.cardinality {
            Cardinality::One => repository.set_relation(source, None, name)?,
            Cardinality::Many => {
                let request = body::require_body(body, &Method::DELETE, source_type)?;
                let targets = request
                    .as_list()
                    .iter()
                    .map(|item| {
                        let linkage = item.linkage().ok_or_else(|| {
                            KeystoneError::request_body(&Method::DELETE, source_type, "linkage object without id")
                        })?;
                        body::target_id(
                            &self.registry,
                            &relationships.relationship,
                            &linkage,
                            &Method::DELETE,
                            source_type,
                        )
                    })
                    .collect::<KeystoneResult<Vec<_>>>()?;
                repository.remove_relations(source, &targets, name)?;
            }
        }
        Ok(ResourceResponse::no_content(path, params).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use keystone_core::{fixtures, DataBody, ErrorKind, LinkageData, Resource};
    use keystone_router::PathBuilder;

    struct Fixture {
        registry: Arc<ResourceRegistry>,
        paths: PathBuilder,
        task: ResourceId,
        projects: Vec<ResourceId>,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(fixtures::sample_registry().unwrap());
        let task = registry
            .entry("tasks")
            .unwrap()
            .repository()
            .save(Resource::new("tasks"))
            .unwrap()
            .id
            .unwrap();
        let projects = (0..3)
            .map(|_| {
                registry
                    .entry("projects")
                    .unwrap()
                    .repository()
                    .save(Resource::new("projects"))
                    .unwrap()
                    .id
                    .unwrap()
            })
            .collect();
        Fixture {
            paths: PathBuilder::new(registry.clone()),
            registry,
            task,
            projects,
        }
    }

    fn linkage_body(ids: &[&ResourceId]) -> RequestBody {
        RequestBody::multiple_data(
            ids.iter()
                .map(|id| DataBody::new("projects").with_id(id.to_string()))
                .collect(),
        )
    }

    fn linkage(fixture: &Fixture, relationship: &str) -> Linkage {
        let path = fixture
            .paths
            .build_path(&format!("/tasks/{}/relationships/{relationship}", fixture.task))
            .unwrap();
        match RelationshipsResourceGet::new(fixture.registry.clone())
            .handle(&path, &QueryParams::new(), None)
            .unwrap()
        {
            BaseResponse::Linkage(response) => response.linkage,
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn test_get_empty_linkage() {
        let fixture = fixture();
        assert_eq!(linkage(&fixture, "project"), Linkage::One(None));
        assert_eq!(linkage(&fixture, "projects"), Linkage::Many(Vec::new()));
    }

    #[test]
    fn test_to_one_post_patch_delete() {
        let fixture = fixture();
        let path = fixture
            .paths
            .build_path(&format!("/tasks/{}/relationships/project", fixture.task))
            .unwrap();
        let params = QueryParams::new();
        let first = &fixture.projects[0];
        let second = &fixture.projects[1];

        let body = RequestBody::single_data(DataBody::new("projects").with_id(first.to_string()));
        let response = RelationshipsResourcePost::new(fixture.registry.clone(), Cardinality::One)
            .handle(&path, &params, Some(&body))
            .unwrap();
        assert_eq!(response.http_status(), StatusCode::NO_CONTENT);
        assert_eq!(
            linkage(&fixture, "project"),
            Linkage::One(Some(LinkageData::new("projects", first.to_string())))
        );

        let body = RequestBody::single_data(DataBody::new("projects").with_id(second.to_string()));
        RelationshipsResourcePatch::new(fixture.registry.clone(), Cardinality::One)
            .handle(&path, &params, Some(&body))
            .unwrap();
        assert_eq!(
            linkage(&fixture, "project"),
            Linkage::One(Some(LinkageData::new("projects", second.to_string())))
        );

        RelationshipsResourcePatch::new(fixture.registry.clone(), Cardinality::One)
            .handle(&path, &params, Some(&RequestBody::default()))
            .unwrap();
        assert_eq!(linkage(&fixture, "project"), Linkage::One(None));

        RelationshipsResourcePost::new(fixture.registry.clone(), Cardinality::One)
            .handle(&path, &params, Some(&body))
            .unwrap();
        RelationshipsResourceDelete::new(fixture.registry.clone(), Cardinality::One)
            .handle(&path, &params, None)
            .unwrap();
        assert_eq!(linkage(&fixture, "project"), Linkage::One(None));
    }

    #[test]
    fn test_to_many_post_patch_delete() {
        let fixture = fixture();
        let path = fixture
            .paths
            .build_path(&format!("/tasks/{}/relationships/projects", fixture.task))
            .unwrap();
        let params = QueryParams::new();
        let [a, b, c] = [&fixture.projects[0], &fixture.projects[1], &fixture.projects[2]];
        let ids = |linkage: Linkage| match linkage {
            Linkage::Many(items) => items.into_iter().map(|item| item.id).collect::<Vec<_>>(),
            other => panic!("unexpected linkage {other:?}"),
        };

        RelationshipsResourcePost::new(fixture.registry.clone(), Cardinality::Many)
            .handle(&path, &params, Some(&linkage_body(&[a, b])))
            .unwrap();
        assert_eq!(ids(linkage(&fixture, "projects")), [a.to_string(), b.to_string()]);

        RelationshipsResourceDelete::new(fixture.registry.clone(), Cardinality::Many)
            .handle(&path, &params, Some(&linkage_body(&[a])))
            .unwrap();
        assert_eq!(ids(linkage(&fixture, "projects")), [b.to_string()]);

        RelationshipsResourcePatch::new(fixture.registry.clone(), Cardinality::Many)
            .handle(&path, &params, Some(&linkage_body(&[c, a])))
            .unwrap();
        assert_eq!(ids(linkage(&fixture, "projects")), [c.to_string(), a.to_string()]);

        RelationshipsResourcePatch::new(fixture.registry.clone(), Cardinality::Many)
            .handle(&path, &params, Some(&linkage_body(&[])))
            .unwrap();
        assert!(ids(linkage(&fixture, "projects")).is_empty());
    }

    #[test]
    fn test_missing_target_and_parent() {
        let fixture = fixture();
        let params = QueryParams::new();
        let missing = ResourceId::Integer(999);

        let path = fixture
            .paths
            .build_path(&format!("/tasks/{}/relationships/projects", fixture.task))
            .unwrap();
        let error = RelationshipsResourcePost::new(fixture.registry.clone(), Cardinality::Many)
            .handle(&path, &params, Some(&linkage_body(&[&missing])))
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ResourceNotFound);

        let orphan = fixture.paths.build_path("/tasks/999/relationships/projects").unwrap();
        let error = RelationshipsResourceGet::new(fixture.registry.clone())
            .handle(&orphan, &params, None)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ResourceNotFound);
    }

    #[test]
    fn test_to_one_post_requires_data() {
        let fixture = fixture();
        let path = fixture
            .paths
            .build_path(&format!("/tasks/{}/relationships/project", fixture.task))
            .unwrap();
        let error = RelationshipsResourcePost::new(fixture.registry.clone(), Cardinality::One)
            .handle(&path, &QueryParams::new(), Some(&RequestBody::default()))
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::RequestBody);
    }

    #[test]
    fn test_acceptance_by_cardinality() {
        let fixture = fixture();
        let to_one = fixture.paths.build_path("/tasks/1/relationships/project").unwrap();
        let to_many = fixture.paths.build_path("/tasks/1/relationships/projects").unwrap();
        let patch_one = RelationshipsResourcePatch::new(fixture.registry.clone(), Cardinality::One);

        assert!(patch_one.is_acceptable(&to_one, &Method::PATCH));
        assert!(!patch_one.is_acceptable(&to_many, &Method::PATCH));
        assert!(!patch_one.is_acceptable(&to_one, &Method::POST));
        assert!(RelationshipsResourceGet::new(fixture.registry.clone()).is_acceptable(&to_many, &Method::GET));
    }
}
