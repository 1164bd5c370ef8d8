//! Request dispatch for Keystone.
//!
//! This crate provides:
//!
//! - [`Controller`] implementations, one per path shape and method
//! - [`ControllerRegistry`] - ordered controller selection
//! - [`ExceptionMapperRegistry`] - failure kind to error response mapping
//! - [`RequestDispatcher`] - selects, runs and maps
//! - [`BaseResponse`] - the outcome of a dispatch
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use http::{Method, StatusCode};
//! use keystone_core::{fixtures, DataBody, QueryParams, RequestBody};
//! use keystone_dispatch::{BaseResponse, ControllerRegistry, ExceptionMapperRegistry, RequestDispatcher};
//! use keystone_router::PathBuilder;
//!
//! let registry = Arc::new(fixtures::sample_registry().unwrap());
//! let paths = PathBuilder::new(registry.clone());
//! let dispatcher = RequestDispatcher::new(
//!     Arc::new(ControllerRegistry::with_defaults(registry)),
//!     Arc::new(ExceptionMapperRegistry::with_defaults()),
//! );
//!
//! let body = RequestBody::single_data(DataBody::new("tasks").with_attribute("name", "write docs"));
//! let response = dispatcher
//!     .dispatch_request(&paths.build_path("/tasks").unwrap(), &Method::POST, &QueryParams::new(), Some(&body))
//!     .unwrap();
//! assert_eq!(response.http_status(), StatusCode::CREATED);
//! assert!(matches!(response, BaseResponse::Resource(_)));
//! ```

#![doc(html_root_url = "https://docs.rs/keystone-dispatch/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod controller;
mod dispatcher;
mod mapper;
mod registry;
mod response;

pub use controller::{
    CollectionGet, Controller, FieldResourceGet, FieldResourcePost, RelationshipsResourceDelete,
    RelationshipsResourceGet, RelationshipsResourcePatch, RelationshipsResourcePost, ResourceDelete, ResourceGet,
    ResourcePatch, ResourcePost,
};
pub use dispatcher::RequestDispatcher;
pub use mapper::{DefaultExceptionMapper, ExceptionMapper, ExceptionMapperRegistry};
pub use registry::{ControllerLookup, ControllerRegistry};
pub use response::{BaseResponse, CollectionResponse, ErrorResponse, LinkageResponse, ResourceResponse};
