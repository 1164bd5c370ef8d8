//! # Keystone Test
//!
//! Test utilities for Keystone: requests go straight to a
//! [`Keystone`](keystone::Keystone) application, without a transport layer.
//!
//! - [`TestClient`]: fluent request building
//! - [`TestResponse`]: JSON pointer access and JSON:API assertions
//!
//! ## Example
//!
//! ```
//! use http::StatusCode;
//! use keystone_test::TestClient;
//!
//! let (client, _store) = TestClient::sample().unwrap();
//!
//! client.get("/tasks/42").send().assert_error(StatusCode::NOT_FOUND, "Resource not found");
//! client.get("/tasks").send().assert_status(StatusCode::OK);
//! ```

#![doc(html_root_url = "https://docs.rs/keystone-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use response::TestResponse;
