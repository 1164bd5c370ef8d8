//! # Keystone Document
//!
//! JSON:API document serialization for Keystone.
//!
//! [`DocumentSerializer`] turns a [`BaseResponse`](keystone_dispatch::BaseResponse)
//! into a top-level document:
//!
//! - `data`: resource objects with `type`, `id`, `attributes`,
//!   `relationships` and `links.self`
//! - relationship objects with `self` and `related` links and `linkage`,
//!   which is `null` for an unset to-one relationship and `[]` for an empty
//!   to-many relationship
//! - `included`: resources requested with `include`, deduplicated by type
//!   and id
//! - `errors` for mapped failures
//!
//! Rendering yields a [`RenderedDocument`] with the status of the response and
//! an optional body in the [`MEDIA_TYPE`] media type.

#![doc(html_root_url = "https://docs.rs/keystone-document/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod include;
mod links;
mod model;
mod serializer;

pub use links::LinkBuilder;
pub use model::{Document, Links, PrimaryData, RelationshipObject, ResourceObject};
pub use serializer::{DocumentSerializer, RenderedDocument, DEFAULT_MAX_INCLUDE_DEPTH, MEDIA_TYPE};
