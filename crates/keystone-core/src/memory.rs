//! In-memory repositories.
//!
//! [`InMemoryStore`] keeps resources and relationship links in memory and
//! hands out [`ResourceRepository`] and [`RelationshipRepository`]
//! implementations backed by it. It is used by fixtures and tests, and is a
//! reasonable starting point for prototypes.
//!
//! Returned resources have their relationships loaded from stored links, up
//! to a configurable depth. Relationships below that depth are left unloaded.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{KeystoneError, KeystoneResult};
use crate::information::{Cardinality, IdType, ResourceInformation};
use crate::query::{QueryParams, SortDirection};
use crate::repository::{RelationshipRepository, ResourceRepository};
use crate::resource::{Related, Resource, ResourceId};

/// Default depth to which relationships of returned resources are loaded.
pub const DEFAULT_HYDRATION_DEPTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LinkKey {
    resource_type: String,
    id: ResourceId,
    field: String,
}

impl LinkKey {
    fn new(resource_type: &str, id: &ResourceId, field: &str) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            id: id.clone(),
            field: field.to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct StoreData {
    schema: HashMap<String, ResourceInformation>,
    resources: HashMap<String, BTreeMap<ResourceId, Resource>>,
    links: HashMap<LinkKey, Vec<ResourceId>>,
    sequences: HashMap<String, i64>,
}

impl StoreData {
    fn information(&self, resource_type: &str) -> KeystoneResult<&ResourceInformation> {
        self.schema
            .get(resource_type)
            .ok_or_else(|| KeystoneError::resource_type_not_found(resource_type))
    }

    fn target_type(&self, resource_type: &str, field: &str) -> KeystoneResult<String> {
        Ok(self
            .information(resource_type)?
            .require_relationship(field)?
            .target_type
            .clone())
    }

    fn next_id(&mut self, info: &ResourceInformation) -> KeystoneResult<ResourceId> {
        match info.id_type() {
            IdType::Integer => {
                let sequence = self
                    .sequences
                    .entry(info.resource_type().to_string())
                    .or_insert(0);
                let next = sequence.checked_add(1).ok_or_else(|| {
                    KeystoneError::repository(format!(
                        "integer id sequence of '{}' is exhausted",
                        info.resource_type()
                    ))
                })?;
                *sequence = next;
                Ok(ResourceId::Integer(next))
            }
            IdType::String => Ok(ResourceId::String(Uuid::now_v7().to_string())),
            IdType::Uuid => Ok(ResourceId::Uuid(Uuid::now_v7())),
        }
    }

    fn bump_sequence(&mut self, resource_type: &str, id: &ResourceId) {
        if let ResourceId::Integer(value) = id {
            let sequence = self.sequences.entry(resource_type.to_string()).or_insert(0);
            *sequence = (*sequence).max(*value);
        }
    }

    fn get(&self, resource_type: &str, id: &ResourceId) -> Option<&Resource> {
        self.resources.get(resource_type)?.get(id)
    }

    fn targets(&self, resource_type: &str, id: &ResourceId, field: &str, target_type: &str) -> Vec<&Resource> {
        self.links
            .get(&LinkKey::new(resource_type, id, field))
            .map(|ids| ids.iter().filter_map(|target| self.get(target_type, target)).collect())
            .unwrap_or_default()
    }

    fn hydrate(&self, stored: &Resource, depth: usize) -> Resource {
        let mut resource = stored.clone();
        if depth == 0 {
            return resource;
        }
        let (Some(info), Some(id)) = (self.schema.get(&stored.resource_type), stored.id.as_ref()) else {
            return resource;
        };

        for descriptor in info.relationships() {
            let targets = self
                .targets(&stored.resource_type, id, &descriptor.name, &descriptor.target_type)
                .into_iter()
                .map(|target| self.hydrate(target, depth - 1));
            let related = match descriptor.cardinality {
                Cardinality::One => Related::One(targets.take(1).next().map(Box::new)),
                Cardinality::Many => Related::Many(targets.collect()),
            };
            resource.relationships.insert(descriptor.name.clone(), related);
        }
        resource
    }
}

/// Shared in-memory storage.
///
/// Cloning the store is cheap; clones share the same data.
///
/// # Example
///
/// ```
/// use keystone_core::{InMemoryStore, QueryParams, Resource, ResourceInformation, ResourceRepository};
///
/// let info = ResourceInformation::builder("projects").attribute("name").build().unwrap();
/// let store = InMemoryStore::new();
/// let projects = store.resource_repository(&info);
///
/// let saved = projects.save(Resource::new("projects").with_attribute("name", "sample")).unwrap();
/// let id = saved.id.unwrap();
/// assert!(projects.find_one(&id, &QueryParams::new()).unwrap().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    data: Arc<RwLock<StoreData>>,
    depth: usize,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(StoreData::default())),
            depth: DEFAULT_HYDRATION_DEPTH,
        }
    }

    /// Sets the depth to which relationships of returned resources are loaded.
    #[must_use]
    pub fn with_hydration_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Registers resource metadata with the store.
    pub fn register(&self, information: &ResourceInformation) {
        self.data
            .write()
            .schema
            .insert(information.resource_type().to_string(), information.clone());
    }

    /// Creates the repository for a resource type.
    pub fn resource_repository(&self, information: &ResourceInformation) -> Arc<InMemoryResourceRepository> {
        self.register(information);
        Arc::new(InMemoryResourceRepository {
            store: self.clone(),
            resource_type: information.resource_type().to_string(),
        })
    }

    /// Creates the repository for one relationship of a resource type.
    pub fn relationship_repository(
        &self,
        information: &ResourceInformation,
        relationship: &str,
    ) -> Arc<InMemoryRelationshipRepository> {
        self.register(information);
        Arc::new(InMemoryRelationshipRepository {
            store: self.clone(),
            source_type: information.resource_type().to_string(),
            relationship: relationship.to_string(),
        })
    }

    /// Number of stored resources of a type.
    pub fn count(&self, resource_type: &str) -> usize {
        self.data
            .read()
            .resources
            .get(resource_type)
            .map_or(0, BTreeMap::len)
    }
}

/// [`ResourceRepository`] backed by an [`InMemoryStore`].
#[derive(Debug)]
pub struct InMemoryResourceRepository {
    store: InMemoryStore,
    resource_type: String,
}

impl ResourceRepository for InMemoryResourceRepository {
    fn find_one(&self, id: &ResourceId, _params: &QueryParams) -> KeystoneResult<Option<Resource>> {
        let data = self.store.data.read();
        Ok(data
            .get(&self.resource_type, id)
            .map(|stored| data.hydrate(stored, self.store.depth)))
    }

    fn find_all(&self, params: &QueryParams) -> KeystoneResult<Vec<Resource>> {
        let data = self.store.data.read();
        let info = data.information(&self.resource_type)?;
        let candidates: Vec<&Resource> = data
            .resources
            .get(&self.resource_type)
            .map(|resources| resources.values().collect())
            .unwrap_or_default();

        let mut filters = params.untyped_filters();
        filters.extend(params.filters_for(&self.resource_type));
        Ok(select(info, candidates, &filters, params)
            .into_iter()
            .map(|stored| data.hydrate(stored, self.store.depth))
            .collect())
    }

    fn save(&self, resource: Resource) -> KeystoneResult<Resource> {
        if resource.resource_type != self.resource_type {
            return Err(KeystoneError::internal(format!(
                "cannot save '{}' resource in '{}' repository",
                resource.resource_type, self.resource_type
            )));
        }

        let mut data = self.store.data.write();
        let info = data.information(&self.resource_type)?.clone();
        if let Some(field) = resource.relationships.keys().find(|field| info.relationship(field).is_none()) {
            return Err(KeystoneError::field_not_found(&self.resource_type, field));
        }
        let id = match resource.id.clone() {
            Some(id) => {
                data.bump_sequence(&self.resource_type, &id);
                id
            }
            None => data.next_id(&info)?,
        };

        for (field, related) in &resource.relationships {
            let targets = related.iter().filter_map(|r| r.id.clone()).collect();
            data.links
                .insert(LinkKey::new(&self.resource_type, &id, field), targets);
        }

        let stored = Resource {
            resource_type: self.resource_type.clone(),
            id: Some(id.clone()),
            attributes: resource.attributes,
            relationships: Default::default(),
        };
        data.resources
            .entry(self.resource_type.clone())
            .or_default()
            .insert(id.clone(), stored.clone());
        let hydrated = data.hydrate(&stored, self.store.depth);

        tracing::trace!(resource_type = %self.resource_type, id = %id, "Resource saved");
        Ok(hydrated)
    }

    fn delete(&self, id: &ResourceId) -> KeystoneResult<()> {
        let mut data = self.store.data.write();
        if let Some(resources) = data.resources.get_mut(&self.resource_type) {
            resources.remove(id);
        }
        let resource_type = &self.resource_type;
        data.links
            .retain(|key, _| !(key.resource_type == *resource_type && key.id == *id));
        Ok(())
    }
}

/// [`RelationshipRepository`] backed by an [`InMemoryStore`].
#[derive(Debug)]
pub struct InMemoryRelationshipRepository {
    store: InMemoryStore,
    source_type: String,
    relationship: String,
}

impl InMemoryRelationshipRepository {
    fn update<F>(&self, source: &ResourceId, field: &str, change: F) -> KeystoneResult<()>
    where
        F: FnOnce(&mut Vec<ResourceId>),
    {
        if field != self.relationship {
            return Err(KeystoneError::field_not_found(&self.source_type, field));
        }
        let mut data = self.store.data.write();
        data.target_type(&self.source_type, field)?;
        let targets = data
            .links
            .entry(LinkKey::new(&self.source_type, source, field))
            .or_default();
        change(targets);
        Ok(())
    }

    fn load_targets(&self, source: &ResourceId, field: &str, params: &QueryParams) -> KeystoneResult<Vec<Resource>> {
        let data = self.store.data.read();
        let target_type = data.target_type(&self.source_type, field)?;
        let info = data.information(&target_type)?;
        let targets = data.targets(&self.source_type, source, field, &target_type);
        Ok(select(info, targets, &params.filters_for(&target_type), params)
            .into_iter()
            .map(|stored| data.hydrate(stored, self.store.depth))
            .collect())
    }
}

impl RelationshipRepository for InMemoryRelationshipRepository {
    fn set_relation(&self, source: &ResourceId, target: Option<&ResourceId>, field: &str) -> KeystoneResult<()> {
        self.update(source, field, |targets| {
            targets.clear();
            targets.extend(target.cloned());
        })
    }

    fn set_relations(&self, source: &ResourceId, targets: &[ResourceId], field: &str) -> KeystoneResult<()> {
        self.update(source, field, |current| {
            current.clear();
            for target in targets {
                if !current.contains(target) {
                    current.push(target.clone());
                }
            }
        })
    }

    fn add_relations(&self, source: &ResourceId, targets: &[ResourceId], field: &str) -> KeystoneResult<()> {
        self.update(source, field, |current| {
            for target in targets {
                if !current.contains(target) {
                    current.push(target.clone());
                }
            }
        })
    }

    fn remove_relations(&self, source: &ResourceId, targets: &[ResourceId], field: &str) -> KeystoneResult<()> {
        self.update(source, field, |current| current.retain(|id| !targets.contains(id)))
    }

    fn find_one_target(
        &self,
        source: &ResourceId,
        field: &str,
        params: &QueryParams,
    ) -> KeystoneResult<Option<Resource>> {
        Ok(self.load_targets(source, field, params)?.into_iter().next())
    }

    fn find_many_targets(
        &self,
        source: &ResourceId,
        field: &str,
        params: &QueryParams,
    ) -> KeystoneResult<Vec<Resource>> {
        self.load_targets(source, field, params)
    }
}

/// Applies filters, sort and pagination.
fn select<'a>(
    info: &ResourceInformation,
    mut resources: Vec<&'a Resource>,
    filters: &BTreeMap<String, String>,
    params: &QueryParams,
) -> Vec<&'a Resource> {
    let id_field = info.id_field();
    let field_value = |resource: &Resource, field: &str| -> Option<Value> {
        if field == id_field {
            resource.id.as_ref().map(|id| match id {
                ResourceId::Integer(value) => Value::from(*value),
                other => Value::from(other.to_string()),
            })
        } else {
            resource.attribute(field).cloned()
        }
    };

    resources.retain(|resource| {
        filters
            .iter()
            .all(|(field, expected)| matches_filter(field_value(resource, field).as_ref(), expected))
    });

    if !params.sort().is_empty() {
        resources.sort_by(|a, b| {
            params
                .sort()
                .iter()
                .map(|sort| {
                    let ordering = compare_values(
                        field_value(a, &sort.field).as_ref(),
                        field_value(b, &sort.field).as_ref(),
                    );
                    match sort.direction {
                        SortDirection::Ascending => ordering,
                        SortDirection::Descending => ordering.reverse(),
                    }
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });
    }

    let page = params.page();
    resources
        .into_iter()
        .skip(page.offset.unwrap_or(0))
        .take(page.limit.unwrap_or(usize::MAX))
        .collect()
}

fn matches_filter(value: Option<&Value>, expected: &str) -> bool {
    match value {
        Some(Value::String(value)) => value == expected,
        Some(Value::Null) | None => expected == "null",
        Some(other) => other.to_string() == expected,
    }
}

fn value_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_) | Value::Object(_)) => 4,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        _ => value_rank(a).cmp(&value_rank(b)),
    }
}
