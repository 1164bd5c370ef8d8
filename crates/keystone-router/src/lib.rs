//! JSON:API path model for Keystone.
//!
//! This crate turns request path strings into typed [`JsonPath`] values,
//! validating resource types, identifiers and relationship names against a
//! [`ResourceRegistry`](keystone_core::ResourceRegistry).
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use keystone_core::fixtures;
//! use keystone_router::{JsonPath, PathBuilder};
//!
//! let registry = Arc::new(fixtures::sample_registry().unwrap());
//! let builder = PathBuilder::new(registry);
//!
//! let path = builder.build_path("/tasks/1/project").unwrap();
//! assert_eq!(path.resource_type(), "tasks");
//! assert_eq!(path.target_type(), "projects");
//! assert!(matches!(path, JsonPath::Field(_)));
//! ```

mod builder;
mod path;

pub use builder::PathBuilder;
pub use path::{
    CollectionPath, FieldPath, JsonPath, PathKind, RelationshipsPath, ResourcePath, RELATIONSHIPS_SEGMENT,
};
