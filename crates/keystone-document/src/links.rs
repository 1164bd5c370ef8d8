//! Link generation.

use keystone_core::ResourceId;
use keystone_router::{JsonPath, RELATIONSHIPS_SEGMENT};

/// Builds absolute links under a base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBuilder {
    base_url: String,
}

impl LinkBuilder {
    /// Creates a builder. A trailing `/` on `base_url` is ignored.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// The base URL, without trailing `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base>/<type>/<id>`
    pub fn resource(&self, resource_type: &str, id: &ResourceId) -> String {
        format!("{}/{resource_type}/{id}", self.base_url)
    }

    /// `<base>/<type>/<id>/relationships/<name>`
    pub fn relationship_self(&self, resource_type: &str, id: &ResourceId, name: &str) -> String {
        format!("{}/{RELATIONSHIPS_SEGMENT}/{name}", self.resource(resource_type, id))
    }

    /// `<base>/<type>/<id>/<name>`
    pub fn relationship_related(&self, resource_type: &str, id: &ResourceId, name: &str) -> String {
        format!("{}/{name}", self.resource(resource_type, id))
    }

    /// `<base><path>`
    pub fn path(&self, path: &JsonPath) -> String {
        format!("{}{}", self.base_url, path.to_url_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links() {
        let links = LinkBuilder::new("https://service.local/");
        let id = ResourceId::Integer(1);

        assert_eq!(links.base_url(), "https://service.local");
        assert_eq!(links.resource("tasks", &id), "https://service.local/tasks/1");
        assert_eq!(
            links.relationship_self("tasks", &id, "project"),
            "https://service.local/tasks/1/relationships/project"
        );
        assert_eq!(
            links.relationship_related("tasks", &id, "project"),
            "https://service.local/tasks/1/project"
        );
        assert_eq!(links.path(&JsonPath::collection("tasks")), "https://service.local/tasks");
    }

    #[test]
    fn test_empty_base_url_gives_relative_links() {
        let links = LinkBuilder::new("");
        assert_eq!(links.resource("tasks", &ResourceId::from("a")), "/tasks/a");
    }
}
