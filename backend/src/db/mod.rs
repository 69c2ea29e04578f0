//! Database module for reader storage.
//!
//! This module provides abstractions for database operations via the
//! Repository pattern, allowing the storage backend to be swapped easily.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP handlers (http::handlers)                          │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │  Arc<dyn ReaderRepository>
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Trait (repository) - Abstract Interface      │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴───────────────┐
//!     │                               │
//! ┌───▼──────────────────┐  ┌─────────▼────────────┐
//! │  PostgresRepository  │  │  LocalRepository     │
//! │  (Diesel + r2d2)     │  │  (in-memory)         │
//! └──────────────────────┘  └──────────────────────┘
//! ```
//!
//! The module includes:
//! - `config`: Connection settings read from the environment
//! - `repo_config`: Optional TOML configuration file
//! - `repository`: Trait definition and error types
//! - `repositories::postgres`: Postgres implementation with Diesel ORM
//! - `repositories::local`: In-memory implementation for tests and local development
//! - `factory`: Factory for creating repository instances

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod config;
pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

pub use config::{DbConfig, PostgresConfig};
pub use factory::{RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;

pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::{PoolStats, PostgresRepository};
pub use repository::{ErrorContext, ReaderRepository, RepositoryError, RepositoryResult};
