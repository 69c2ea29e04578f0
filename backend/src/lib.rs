//! # Readers Service
//!
//! A small REST service exposing CRUD operations over library readers stored
//! in PostgreSQL.
//!
//! ## Architecture
//!
//! The crate is organized into a few logical modules:
//!
//! - [`models`]: The `Reader` entity and its identifier
//! - [`db`]: Configuration, repository trait, and the Postgres / in-memory backends
//! - [`http`]: Axum-based HTTP server, router, and request handlers
//!
//! Requests flow through the router into the handlers, which call the
//! repository and translate its typed errors into HTTP status codes.

// Allow large error types - RepositoryError carries context for diagnostics
#![allow(clippy::result_large_err)]

pub mod db;
pub mod models;

#[cfg(feature = "http-server")]
pub mod http;

pub use models::{Reader, ReaderId};
