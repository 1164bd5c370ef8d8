//! `include` resolution.

use std::collections::HashSet;

use indexmap::IndexSet;
use keystone_core::{KeystoneError, KeystoneResult, Resource, ResourceRegistry};

/// Name of the query parameter carrying include paths.
const INCLUDE_PARAMETER: &str = "include";

/// A validated dotted include path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IncludePath {
    segments: Vec<String>,
}

impl IncludePath {
    /// Parses and validates `raw` against the relationships of the types it
    /// traverses, starting at `root_type`.
    pub(crate) fn parse(
        registry: &ResourceRegistry,
        root_type: &str,
        raw: &str,
        max_depth: usize,
    ) -> KeystoneResult<Self> {
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(KeystoneError::query_parameters(
                INCLUDE_PARAMETER,
                format!("include path '{raw}' contains an empty segment"),
            ));
        }
        if segments.len() > max_depth {
            return Err(KeystoneError::query_parameters(
                INCLUDE_PARAMETER,
                format!("include path '{raw}' exceeds the maximum depth of {max_depth}"),
            ));
        }

        let mut current = root_type.to_string();
        for segment in &segments {
            let information = registry.entry(&current)?.information();
            let descriptor = information.relationship(segment).ok_or_else(|| {
                KeystoneError::query_parameters(
                    INCLUDE_PARAMETER,
                    format!("'{segment}' is not a relationship of '{current}'"),
                )
            })?;
            current = descriptor.target_type.clone();
        }

        Ok(Self { segments })
    }

    /// Parses every include path of a request.
    pub(crate) fn parse_all(
        registry: &ResourceRegistry,
        root_type: &str,
        includes: &IndexSet<String>,
        max_depth: usize,
    ) -> KeystoneResult<Vec<Self>> {
        includes
            .iter()
            .map(|raw| Self::parse(registry, root_type, raw, max_depth))
            .collect()
    }
}

/// Collects the resources reachable through `paths` from `primary`.
///
/// Resources are deduplicated by (type, id) in first-seen order; primary
/// resources and resources without id are never included. Only relationships
/// loaded on the resources are followed.
pub(crate) fn collect_included<'a>(primary: &[&'a Resource], paths: &[IncludePath]) -> Vec<&'a Resource> {
    let mut seen: HashSet<(&str, String)> = primary
        .iter()
        .filter_map(|resource| Some((resource.resource_type.as_str(), resource.id.as_ref()?.to_string())))
        .collect();
    let mut included = Vec::new();

    for path in paths {
        let mut current: Vec<&'a Resource> = primary.to_vec();
        for segment in &path.segments {
            let next: Vec<&'a Resource> = current
                .iter()
                .filter_map(|resource| resource.related(segment))
                .flat_map(|related| related.iter())
                .collect();
            for resource in &next {
                let Some(id) = &resource.id else { continue };
                if seen.insert((resource.resource_type.as_str(), id.to_string())) {
                    included.push(*resource);
                }
            }
            current = next;
        }
    }

    included
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_core::{fixtures, ErrorKind};

    fn project(id: i64) -> Resource {
        Resource::new("projects").with_id(id).with_attribute("name", format!("project {id}"))
    }

    #[test]
    fn test_parse_validates_segments() {
        let registry = fixtures::sample_registry().unwrap();

        assert!(IncludePath::parse(&registry, "tasks", "project.tasks", 3).is_ok());

        for (raw, fragment) in [
            ("owner", "not a relationship of 'tasks'"),
            ("project.owner", "not a relationship of 'projects'"),
            ("project..tasks", "empty segment"),
            ("project.tasks.project.tasks", "maximum depth"),
        ] {
            let error = IncludePath::parse(&registry, "tasks", raw, 3).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::QueryParameters, "{raw}");
            assert!(error.to_string().contains(fragment), "{raw}: {error}");
        }
    }

    #[test]
    fn test_collect_deduplicates_and_skips_primary() {
        let registry = fixtures::sample_registry().unwrap();
        let first = Resource::new("tasks")
            .with_id(1_i64)
            .with_one("project", Some(project(10)))
            .with_many("projects", vec![project(10), project(11)]);
        let second = Resource::new("tasks").with_id(2_i64).with_one("project", Some(project(11)));

        let paths = [
            IncludePath::parse(&registry, "tasks", "project", 3).unwrap(),
            IncludePath::parse(&registry, "tasks", "projects", 3).unwrap(),
        ];
        let included = collect_included(&[&first, &second], &paths);

        let ids: Vec<String> = included
            .iter()
            .map(|r| r.id.as_ref().unwrap().to_string())
            .collect();
        assert_eq!(ids, ["10", "11"]);
    }

    #[test]
    fn test_collect_nested() {
        let registry = fixtures::sample_registry().unwrap();
        let sibling = Resource::new("tasks").with_id(2_i64);
        let task = Resource::new("tasks")
            .with_id(1_i64)
            .with_one("project", Some(project(10).with_many("tasks", vec![sibling])));

        let paths = [IncludePath::parse(&registry, "tasks", "project.tasks", 3).unwrap()];
        let included = collect_included(&[&task], &paths);

        let keys: Vec<(&str, String)> = included
            .iter()
            .map(|r| (r.resource_type.as_str(), r.id.as_ref().unwrap().to_string()))
            .collect();
        assert_eq!(keys, [("projects", "10".to_string()), ("tasks", "2".to_string())]);
    }
}
