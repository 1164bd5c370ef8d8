//! Sample resource model for tests and documentation.
//!
//! | Type | Attributes | Relationships |
//! |---|---|---|
//! | `tasks` | `name`, `description` | `project` → `projects` (to-one), `projects` → `projects` (to-many) |
//! | `projects` | `name`, `description` | `tasks` → `tasks` (to-many) |
//! | `users` | `name` | `assignedProjects` → `projects` (to-many) |
//!
//! # Example
//!
//! ```
//! use keystone_core::fixtures;
//!
//! let (registry, store) = fixtures::sample_registry_with_store().unwrap();
//! assert_eq!(registry.base_url(), fixtures::BASE_URL);
//! assert_eq!(store.count("tasks"), 0);
//! ```

use crate::error::InitializationError;
use crate::information::ResourceInformation;
use crate::memory::InMemoryStore;
use crate::registry::ResourceRegistry;

/// Base URL used by the sample registry.
pub const BASE_URL: &str = "https://service.local";

/// Metadata for `tasks`.
pub fn task_information() -> Result<ResourceInformation, InitializationError> {
    ResourceInformation::builder("tasks")
        .attributes(["name", "description"])
        .to_one("project", "projects")
        .to_many("projects", "projects")
        .build()
}

/// Metadata for `projects`.
pub fn project_information() -> Result<ResourceInformation, InitializationError> {
    ResourceInformation::builder("projects")
        .attributes(["name", "description"])
        .to_many("tasks", "tasks")
        .build()
}

/// Metadata for `users`.
pub fn user_information() -> Result<ResourceInformation, InitializationError> {
    ResourceInformation::builder("users")
        .attribute("name")
        .to_many("assignedProjects", "projects")
        .build()
}

/// Builds the sample registry over `store`.
pub fn registry_for(store: &InMemoryStore, base_url: &str) -> Result<ResourceRegistry, InitializationError> {
    let mut builder = ResourceRegistry::builder(base_url);
    for information in [task_information()?, project_information()?, user_information()?] {
        builder = builder.resource(information.clone(), store.resource_repository(&information));
        for relationship in information.relationships() {
            builder = builder.relationship(
                information.resource_type(),
                relationship.name.clone(),
                store.relationship_repository(&information, &relationship.name),
            );
        }
    }
    builder.build()
}

/// Builds the sample registry over a fresh store.
pub fn sample_registry() -> Result<ResourceRegistry, InitializationError> {
    registry_for(&InMemoryStore::new(), BASE_URL)
}

/// Builds the sample registry and returns the store behind it.
pub fn sample_registry_with_store() -> Result<(ResourceRegistry, InMemoryStore), InitializationError> {
    let store = InMemoryStore::new();
    let registry = registry_for(&store, BASE_URL)?;
    Ok((registry, store))
}
