//! Repository trait definitions for database operations.
//!
//! - [`error`]: Error types for repository operations
//! - [`reader`]: CRUD operations for readers
//!
//! Handlers depend on `Arc<dyn ReaderRepository>` so the Postgres and
//! in-memory backends are interchangeable.

pub mod error;
pub mod reader;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use reader::ReaderRepository;
