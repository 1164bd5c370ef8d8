//! Controllers.
//!
//! A controller handles one combination of path shape and method. The
//! [`ControllerRegistry`](crate::ControllerRegistry) asks each controller in
//! turn whether it [accepts](Controller::is_acceptable) a request and hands the
//! request to the first one that does.
//!
//! | Controller | Path | Method |
//! |---|---|---|
//! | [`RelationshipsResourceGet`] | relationships | GET |
//! | [`RelationshipsResourcePost`] | relationships | POST |
//! | [`RelationshipsResourcePatch`] | relationships | PATCH |
//! | [`RelationshipsResourceDelete`] | relationships | DELETE |
//! | [`FieldResourceGet`] | field | GET |
//! | [`FieldResourcePost`] | field | POST |
//! | [`ResourceGet`] | resource | GET |
//! | [`ResourcePost`] | collection | POST |
//! | [`ResourcePatch`] | resource | PATCH |
//! | [`ResourceDelete`] | resource | DELETE |
//! | [`CollectionGet`] | collection | GET |
//!
//! Relationship mutations come in a to-one and a to-many flavour, selected by
//! the relationship cardinality.

mod body;
mod collection;
mod field;
mod relationships;
mod resource;

use http::Method;
use keystone_core::{KeystoneResult, QueryParams, RequestBody};
use keystone_router::JsonPath;

use crate::response::BaseResponse;

pub use collection::CollectionGet;
pub use field::{FieldResourceGet, FieldResourcePost};
pub use relationships::{
    RelationshipsResourceDelete, RelationshipsResourceGet, RelationshipsResourcePatch, RelationshipsResourcePost,
};
pub use resource::{ResourceDelete, ResourceGet, ResourcePatch, ResourcePost};

/// Handler for one path shape and method.
pub trait Controller: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Returns `true` if this controller handles `method` on `path`.
    ///
    /// Must be a pure function of the path variant, the relationship
    /// cardinality and the method.
    fn is_acceptable(&self, path: &JsonPath, method: &Method) -> bool;

    /// Handles the request. Writes are delegated to repositories.
    fn handle(&self, path: &JsonPath, params: &QueryParams, body: Option<&RequestBody>) -> KeystoneResult<BaseResponse>;
}
