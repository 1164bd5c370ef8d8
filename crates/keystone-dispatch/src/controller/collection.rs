use std::sync::Arc;

use http::Method;
use keystone_core::{KeystoneResult, QueryParams, RequestBody, ResourceRegistry};
use keystone_router::JsonPath;

use super::Controller;
use crate::response::{BaseResponse, CollectionResponse};

/// `GET /<type>`
#[derive(Debug, Clone)]
pub struct CollectionGet {
    registry: Arc<ResourceRegistry>,
}

impl CollectionGet {
    /// Creates the controller.
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self { registry }
    }
}

impl Controller for CollectionGet {
    fn name(&self) -> &'static str {
        "CollectionGet"
    }

    fn is_acceptable(&self, path: &JsonPath, method: &Method) -> bool {
        matches!(path, JsonPath::Collection(_)) && method == Method::GET
    }

    fn handle(&self, path: &JsonPath, params: &QueryParams, _body: Option<&RequestBody>) -> KeystoneResult<BaseResponse> {
        let data = self
            .registry
            .entry(path.resource_type())?
            .repository()
            .find_all(params)?;
        Ok(CollectionResponse {
            data,
            path: path.clone(),
            params: params.clone(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_core::{fixtures, Resource};

    #[test]
    fn test_lists_resources() {
        let registry = Arc::new(fixtures::sample_registry().unwrap());
        let projects = registry.entry("projects").unwrap().repository().clone();
        projects.save(Resource::new("projects").with_attribute("name", "b")).unwrap();
        projects.save(Resource::new("projects").with_attribute("name", "a")).unwrap();

        let controller = CollectionGet::new(registry);
        let path = JsonPath::collection("projects");
        assert!(controller.is_acceptable(&path, &Method::GET));
        assert!(!controller.is_acceptable(&path, &Method::DELETE));

        let params = QueryParams::from_query_string("sort=name").unwrap();
        match controller.handle(&path, &params, None).unwrap() {
            BaseResponse::Collection(response) => {
                let names: Vec<_> = response
                    .data
                    .iter()
                    .filter_map(|p| p.attribute("name").and_then(|v| v.as_str()))
                    .collect();
                assert_eq!(names, ["a", "b"]);
                assert_eq!(response.params, params);
            }
            other => panic!("unexpected response {other:?}"),
        }
    }
}
