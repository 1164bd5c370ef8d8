//! Relationships accessed as nested resources: `/<type>/<id>/<relationship>`.

use std::sync::Arc;

use http::Method;
use keystone_core::{Cardinality, KeystoneError, KeystoneResult, QueryParams, RequestBody, ResourceRegistry};
use keystone_router::JsonPath;

use super::body;
use super::Controller;
use crate::response::{BaseResponse, CollectionResponse, ResourceResponse};

/// `GET /<type>/<id>/<relationship>`
///
/// To-one relationships yield a resource response (with `null` data when
/// unset), to-many relationships a collection response.
#[derive(Debug, Clone)]
pub struct FieldResourceGet {
    registry: Arc<ResourceRegistry>,
}

impl FieldResourceGet {
    /// Creates the controller.
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self { registry }
    }
}

impl Controller for FieldResourceGet {
    fn name(&self) -> &'static str {
        "FieldResourceGet"
    }

    fn is_acceptable(&self, path: &JsonPath, method: &Method) -> bool {
        matches!(path, JsonPath::Field(_)) && method == Method::GET
    }

    fn handle(&self, path: &JsonPath, params: &QueryParams, _body: Option<&RequestBody>) -> KeystoneResult<BaseResponse> {
        let JsonPath::Field(field) = path else {
            return Err(KeystoneError::internal(format!("{} cannot handle {path}", self.name())));
        };
        body::find_parent(&self.registry, &field.parent)?;

        let name = field.relationship.name.as_str();
        let repository = self
            .registry
            .entry(&field.parent.resource_type)?
            .relationship_repository(name)?;

        Ok(match field.relationship.cardinality {
            Cardinality::One => {
                let target = repository.find_one_target(&field.parent.id, name, params)?;
                ResourceResponse::ok(target, path, params).into()
            }
            Cardinality::Many => CollectionResponse {
                data: repository.find_many_targets(&field.parent.id, name, params)?,
                path: path.clone(),
                params: params.clone(),
            }
            .into(),
        })
    }
}

/// `POST /<type>/<id>/<relationship>`
///
/// Creates the target resource, then links it to the parent: to-one
/// relationships are set, to-many relationships gain a member. The parent must
/// exist before anything is saved.
#[derive(Debug, Clone)]
pub struct FieldResourcePost {
    registry: Arc<ResourceRegistry>,
    cardinality: Cardinality,
}

impl FieldResourcePost {
    /// Creates the controller for relationships of `cardinality`.
    pub fn new(registry: Arc<ResourceRegistry>, cardinality: Cardinality) -> Self {
        Self { registry, cardinality }
    }
}

impl Controller for FieldResourcePost {
    fn name(&self) -> &'static str {
        match self.cardinality {
            Cardinality::One => "ToOneFieldResourcePost",
            Cardinality::Many => "ToManyFieldResourcePost",
        }
    }

    fn is_acceptable(&self, path: &JsonPath, method: &Method) -> bool {
        matches!(path, JsonPath::Field(field) if field.relationship.cardinality == self.cardinality)
            && method == Method::POST
    }

    fn handle(&self, path: &JsonPath, params: &QueryParams, body: Option<&RequestBody>) -> KeystoneResult<BaseResponse> {
        let JsonPath::Field(field) = path else {
            return Err(KeystoneError::internal(format!("{} cannot handle {path}", self.name())));
        };
        let parent_type = field.parent.resource_type.as_str();
        let relationship = &field.relationship;

        body::find_parent(&self.registry, &field.parent)?;

        let data = body::require_single(body, &Method::POST, parent_type)?;
        body::check_type(&self.registry, data, &relationship.target_type, &Method::POST)?;

        let target_entry = self.registry.entry(&relationship.target_type)?;
        let resource = body::build_resource(&self.registry, target_entry.information(), data, &Method::POST)?;
        let saved = target_entry.repository().save(resource)?;
        let saved_id = saved
            .id
            .clone()
            .ok_or_else(|| KeystoneError::internal("repository returned a resource without id"))?;

        let repository = self
            .registry
            .entry(parent_type)?
            .relationship_repository(&relationship.name)?;
        match self.cardinality {
            Cardinality::One => repository.set_relation(&field.parent.id, Some(&saved_id), &relationship.name)?,
            Cardinality::Many => repository.add_relations(
                &field.parent.id,
                std::slice::from_ref(&saved_id),
                &relationship.name,
            )?,
        }

        tracing::debug!(
            parent = %path,
            target_type = %relationship.target_type,
            id = %saved_id,
            "Related resource created"
        );
        Ok(ResourceResponse::created(saved, path, params).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use keystone_core::{fixtures, DataBody, ErrorKind, InMemoryStore, Resource, ResourceId};
    use keystone_router::PathBuilder;
    use serde_json::json;

    fn setup() -> (Arc<ResourceRegistry>, InMemoryStore, PathBuilder) {
        let (registry, store) = fixtures::sample_registry_with_store().unwrap();
        let registry = Arc::new(registry);
        (registry.clone(), store, PathBuilder::new(registry))
    }

    fn create_task(registry: &ResourceRegistry) -> ResourceId {
        registry
            .entry("tasks")
            .unwrap()
            .repository()
            .save(Resource::new("tasks").with_attribute("name", "sample task"))
            .unwrap()
            .id
            .unwrap()
    }

    fn project_body() -> RequestBody {
        RequestBody::single_data(DataBody::new("projects").with_attribute("name", "sample project"))
    }

    #[test]
    fn test_post_acceptance() {
        let (registry, _, paths) = setup();
        let to_one = FieldResourcePost::new(registry.clone(), Cardinality::One);
        let to_many = FieldResourcePost::new(registry, Cardinality::Many);

        let project = paths.build_path("tasks/1/project").unwrap();
        let projects = paths.build_path("tasks/1/projects").unwrap();
        let resource = paths.build_path("tasks/1").unwrap();

        assert!(to_one.is_acceptable(&project, &Method::POST));
        assert!(!to_one.is_acceptable(&projects, &Method::POST));
        assert!(to_many.is_acceptable(&projects, &Method::POST));
        assert!(!to_one.is_acceptable(&resource, &Method::POST));
        assert!(!to_one.is_acceptable(&project, &Method::GET));
    }

    #[test]
    fn test_post_to_missing_parent_saves_nothing() {
        let (registry, store, paths) = setup();
        let path = paths.build_path("/tasks/-1/project").unwrap();

        let error = FieldResourcePost::new(registry, Cardinality::One)
            .handle(&path, &QueryParams::new(), Some(&project_body()))
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::ResourceNotFound);
        assert_eq!(store.count("projects"), 0);
    }

    #[test]
    fn test_post_to_one_creates_and_links() {
        let (registry, _, paths) = setup();
        let task_id = create_task(&registry);
        let path = paths.build_path(&format!("/tasks/{task_id}/project")).unwrap();
        let params = QueryParams::new();

        let response = FieldResourcePost::new(registry.clone(), Cardinality::One)
            .handle(&path, &params, Some(&project_body()))
            .unwrap();
        assert_eq!(response.http_status(), StatusCode::CREATED);

        let BaseResponse::Resource(ResourceResponse { data: Some(project), .. }) = response else {
            panic!("expected a resource response");
        };
        assert_eq!(project.resource_type, "projects");
        assert!(project.id.is_some());
        assert_eq!(project.attribute("name"), Some(&json!("sample project")));

        let linked = registry
            .entry("tasks")
            .unwrap()
            .relationship_repository("project")
            .unwrap()
            .find_one_target(&task_id, "project", &params)
            .unwrap()
            .unwrap();
        assert_eq!(linked.id, project.id);
    }

    #[test]
    fn test_post_to_many_adds_member() {
        let (registry, _, paths) = setup();
        let task_id = create_task(&registry);
        let path = paths.build_path(&format!("/tasks/{task_id}/projects")).unwrap();
        let controller = FieldResourcePost::new(registry.clone(), Cardinality::Many);
        let params = QueryParams::new();

        controller.handle(&path, &params, Some(&project_body())).unwrap();
        controller.handle(&path, &params, Some(&project_body())).unwrap();

        match FieldResourceGet::new(registry).handle(&path, &params, None).unwrap() {
            BaseResponse::Collection(response) => assert_eq!(response.data.len(), 2),
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn test_post_wrong_body_type() {
        let (registry, _, paths) = setup();
        let task_id = create_task(&registry);
        let path = paths.build_path(&format!("/tasks/{task_id}/project")).unwrap();
        let body = RequestBody::single_data(DataBody::new("users"));

        let error = FieldResourcePost::new(registry, Cardinality::One)
            .handle(&path, &QueryParams::new(), Some(&body))
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::RequestBody);
    }

    #[test]
    fn test_get_unset_to_one_is_null() {
        let (registry, _, paths) = setup();
        let task_id = create_task(&registry);
        let path = paths.build_path(&format!("/tasks/{task_id}/project")).unwrap();

        match FieldResourceGet::new(registry).handle(&path, &QueryParams::new(), None).unwrap() {
            BaseResponse::Resource(response) => {
                assert_eq!(response.status, StatusCode::OK);
                assert!(response.data.is_none());
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn test_get_missing_parent() {
        let (registry, _, paths) = setup();
        let path = paths.build_path("/tasks/9/projects").unwrap();
        let error = FieldResourceGet::new(registry)
            .handle(&path, &QueryParams::new(), None)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ResourceNotFound);
    }
}
