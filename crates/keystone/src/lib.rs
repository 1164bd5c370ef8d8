//! # Keystone
//!
//! **JSON:API request dispatch for Rust services**
//!
//! Keystone takes a request already parsed by the transport layer (method,
//! path, query string, body) and turns it into a JSON:API document:
//!
//! - **Path routing**: `/tasks`, `/tasks/1`, `/tasks/1/project` and
//!   `/tasks/1/relationships/project` are validated against the registered
//!   resource types
//! - **Controllers**: the first controller accepting the path and method
//!   handles the request through the type's repositories
//! - **Error mapping**: client failures become `{"errors": [...]}` documents;
//!   anything else is returned to the host unchanged
//! - **Serialization**: resource objects with `self`/`related` links,
//!   relationship linkage, sparse fieldsets and `included` resources
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use http::StatusCode;
//! use keystone::prelude::*;
//!
//! let store = InMemoryStore::new();
//! let registry = keystone::core::fixtures::registry_for(&store, "https://service.local").unwrap();
//! let app = Keystone::builder(Arc::new(registry)).build();
//!
//! let created = app
//!     .handle(
//!         &JsonApiRequest::post("/projects")
//!             .with_body(r#"{"data": {"type": "projects", "attributes": {"name": "docs"}}}"#),
//!     )
//!     .unwrap();
//! assert_eq!(created.status, StatusCode::CREATED);
//!
//! let missing = app.handle(&JsonApiRequest::get("/projects/99")).unwrap();
//! assert_eq!(missing.status, StatusCode::NOT_FOUND);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! path ─► PathBuilder ─► JsonPath ─► ControllerRegistry ─► Controller ─► repositories
//!                                                                           │
//! RenderedDocument ◄─ DocumentSerializer ◄─ BaseResponse ◄─ ExceptionMapper ◄┘
//! ```

#![doc(html_root_url = "https://docs.rs/keystone/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod request;

pub use app::{Keystone, KeystoneBuilder};
pub use request::JsonApiRequest;

pub use keystone_config as config;
pub use keystone_core as core;
pub use keystone_dispatch as dispatch;
pub use keystone_document as document;
pub use keystone_router as router;
pub use keystone_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```rust
/// use keystone::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{JsonApiRequest, Keystone, KeystoneBuilder};

    pub use keystone_config::{ConfigLoader, KeystoneConfig};

    pub use keystone_core::{
        Cardinality, ErrorData, ErrorKind, IdType, InMemoryStore, KeystoneError, KeystoneResult,
        QueryParams, RelationshipRepository, Resource, ResourceId, ResourceInformation,
        ResourceRegistry, ResourceRepository,
    };

    pub use keystone_dispatch::{
        BaseResponse, Controller, ControllerLookup, ControllerRegistry, ErrorResponse,
        ExceptionMapper, ExceptionMapperRegistry, RequestDispatcher,
    };

    pub use keystone_document::{DocumentSerializer, RenderedDocument, MEDIA_TYPE};

    pub use keystone_router::{JsonPath, PathBuilder};

    pub use keystone_telemetry::init_telemetry;
}
