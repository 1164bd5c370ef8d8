//! # Keystone Core
//!
//! Core types and traits for the Keystone JSON:API framework.
//!
//! This crate provides the foundational types used throughout Keystone:
//!
//! - [`ResourceInformation`] - Per-type metadata (id, attributes, relationships)
//! - [`ResourceRegistry`] - Immutable registry of types and their repositories
//! - [`ResourceRepository`] / [`RelationshipRepository`] - Data-access interfaces
//! - [`Resource`] - Domain objects exchanged with repositories
//! - [`RequestBody`] - Wire-format request payloads
//! - [`QueryParams`] - Parsed `filter`/`sort`/`include`/`fields`/`page` parameters
//! - [`KeystoneError`] - Standard error types
//! - [`InMemoryStore`] - Reference in-memory repositories

#![doc(html_root_url = "https://docs.rs/keystone-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod fixtures;
mod information;
mod linkage;
pub mod memory;
mod query;
mod registry;
mod repository;
mod request;
mod resource;

pub use error::{
    ErrorData, ErrorDataBuilder, ErrorKind, ErrorSource, InitializationError, KeystoneError, KeystoneResult,
};
pub use information::{
    Cardinality, IdType, RelationshipDescriptor, ResourceInformation, ResourceInformationBuilder,
    RESERVED_FIELD_NAMES,
};
pub use linkage::{Linkage, LinkageData};
pub use memory::InMemoryStore;
pub use query::{Pagination, QueryParams, SortDirection, SortField};
pub use registry::{RegistryEntry, ResourceRegistry, ResourceRegistryBuilder};
pub use repository::{RelationshipRepository, ResourceRepository};
pub use request::{BodyData, DataBody, RelationshipData, RelationshipEntry, RequestBody};
pub use resource::{Related, Resource, ResourceId};
