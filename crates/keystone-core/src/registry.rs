//! Resource registry.
//!
//! The registry binds each resource type to its metadata and repositories. It
//! is built once at startup, validated, and shared read-only (behind an
//! `Arc`) by the path builder, controllers and serializer.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{InitializationError, KeystoneError, KeystoneResult};
use crate::information::ResourceInformation;
use crate::repository::{RelationshipRepository, ResourceRepository};

/// Metadata and repositories for one resource type.
#[derive(Clone)]
pub struct RegistryEntry {
    information: ResourceInformation,
    repository: Arc<dyn ResourceRepository>,
    relationship_repositories: HashMap<String, Arc<dyn RelationshipRepository>>,
}

impl RegistryEntry {
    /// Resource metadata.
    pub fn information(&self) -> &ResourceInformation {
        &self.information
    }

    /// Resource repository.
    pub fn repository(&self) -> &Arc<dyn ResourceRepository> {
        &self.repository
    }

    /// Repository for a declared relationship.
    ///
    /// # Errors
    ///
    /// Returns [`KeystoneError::ResourceFieldNotFound`] if the relationship is
    /// not declared.
    pub fn relationship_repository(&self, name: &str) -> KeystoneResult<&Arc<dyn RelationshipRepository>> {
        self.relationship_repositories
            .get(name)
            .ok_or_else(|| KeystoneError::field_not_found(self.information.resource_type(), name))
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut relationships: Vec<_> = self.relationship_repositories.keys().collect();
        relationships.sort();
        f.debug_struct("RegistryEntry")
            .field("information", &self.information)
            .field("relationship_repositories", &relationships)
            .finish_non_exhaustive()
    }
}

/// Registry of all resource types.
///
/// # Example
///
/// ```
/// use keystone_core::fixtures;
///
/// let registry = fixtures::sample_registry().unwrap();
/// assert!(registry.get_entry("tasks").is_some());
/// assert!(registry.entry("unknown").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ResourceRegistry {
    base_url: String,
    entries: IndexMap<String, RegistryEntry>,
}

impl ResourceRegistry {
    /// Creates a builder. `base_url` prefixes every generated link; a trailing
    /// `/` is removed.
    pub fn builder(base_url: impl Into<String>) -> ResourceRegistryBuilder {
        ResourceRegistryBuilder {
            base_url: base_url.into(),
            resources: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Base URL used for links, without trailing `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Looks up a resource type.
    pub fn get_entry(&self, resource_type: &str) -> Option<&RegistryEntry> {
        self.entries.get(resource_type)
    }

    /// Looks up a resource type, failing with a not-found error.
    ///
    /// # Errors
    ///
    /// Returns [`KeystoneError::ResourceNotFound`] if the type is not registered.
    pub fn entry(&self, resource_type: &str) -> KeystoneResult<&RegistryEntry> {
        self.get_entry(resource_type)
            .ok_or_else(|| KeystoneError::resource_type_not_found(resource_type))
    }

    /// Registered type names, in registration order.
    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no type is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder for [`ResourceRegistry`].
#[must_use]
pub struct ResourceRegistryBuilder {
    base_url: String,
    resources: Vec<(ResourceInformation, Arc<dyn ResourceRepository>)>,
    relationships: Vec<(String, String, Arc<dyn RelationshipRepository>)>,
}

impl ResourceRegistryBuilder {
    /// Registers a resource type with its repository.
    pub fn resource(mut self, information: ResourceInformation, repository: Arc<dyn ResourceRepository>) -> Self {
        self.resources.push((information, repository));
        self
    }

    /// Registers the repository for one relationship of a resource type.
    pub fn relationship(
        mut self,
        resource_type: impl Into<String>,
        relationship: impl Into<String>,
        repository: Arc<dyn RelationshipRepository>,
    ) -> Self {
        self.relationships
            .push((resource_type.into(), relationship.into(), repository));
        self
    }

    /// Validates and builds the registry.
    ///
    /// # Errors
    ///
    /// Fails when a type is registered twice, when a relationship targets an
    /// unregistered type, or when a declared relationship has no repository.
    pub fn build(self) -> Result<ResourceRegistry, InitializationError> {
        let mut entries: IndexMap<String, RegistryEntry> = IndexMap::new();
        for (information, repository) in self.resources {
            let resource_type = information.resource_type().to_string();
            if entries.contains_key(&resource_type) {
                return Err(InitializationError::DuplicateResource(resource_type));
            }
            entries.insert(
                resource_type,
                RegistryEntry {
                    information,
                    repository,
                    relationship_repositories: HashMap::new(),
                },
            );
        }

        for (resource_type, relationship, repository) in self.relationships {
            let entry = entries
                .get_mut(&resource_type)
                .filter(|entry| entry.information.relationship(&relationship).is_some())
                .ok_or_else(|| InitializationError::UndeclaredRelationship {
                    resource_type: resource_type.clone(),
                    relationship: relationship.clone(),
                })?;
            entry.relationship_repositories.insert(relationship, repository);
        }

        for entry in entries.values() {
            let info = &entry.information;
            for descriptor in info.relationships() {
                if !entries.contains_key(&descriptor.target_type) {
                    return Err(InitializationError::UnknownRelationshipTarget {
                        resource_type: info.resource_type().to_string(),
                        relationship: descriptor.name.clone(),
                        target: descriptor.target_type.clone(),
                    });
                }
                if !entry.relationship_repositories.contains_key(&descriptor.name) {
                    return Err(InitializationError::MissingRelationshipRepository {
                        resource_type: info.resource_type().to_string(),
                        relationship: descriptor.name.clone(),
                    });
                }
            }
        }

        tracing::debug!(
            resource_types = entries.len(),
            base_url = %self.base_url,
            "Resource registry built"
        );

        Ok(ResourceRegistry {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            entries,
        })
    }
}
