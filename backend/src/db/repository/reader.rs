//! Reader repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Reader, ReaderId};

/// Repository trait for reader database operations.
///
/// Implementations never log; failures are reported through
/// [`RepositoryError`](super::RepositoryError) and the caller decides how to
/// surface them.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to be shared across request tasks.
#[async_trait]
pub trait ReaderRepository: Send + Sync {
    // ==================== Health & Connection ====================

    /// Check if the database connection is healthy.
    ///
    /// # Returns
    /// - `Ok(true)` if a round trip to the database succeeded
    /// - `Ok(false)` if the backend reports itself unhealthy without an error
    /// - `Err(RepositoryError)` if the check itself failed
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Release the underlying connections.
    ///
    /// Idempotent. Every operation issued after `close` fails with
    /// `RepositoryError::ConnectionError`.
    async fn close(&self);

    // ==================== Reader Operations ====================

    /// Fetch the reader with `id`.
    ///
    /// # Returns
    /// * `Ok(Reader)` - The stored reader
    /// * `Err(RepositoryError::NotFound)` - If no reader has this id
    /// * `Err(RepositoryError)` - If the query fails
    async fn get_reader(&self, id: ReaderId) -> RepositoryResult<Reader>;

    /// List every reader.
    ///
    /// Order is whatever the storage returns and must not be relied upon.
    /// An empty table yields an empty vector.
    async fn list_readers(&self) -> RepositoryResult<Vec<Reader>>;

    /// Insert a new reader and return the id generated by the database.
    ///
    /// `reader.id` is ignored.
    async fn add_reader(&self, reader: &Reader) -> RepositoryResult<ReaderId>;

    /// Replace name, address, and phone of the reader with `reader.id`.
    ///
    /// # Returns
    /// * `Ok(())` - If exactly that row was rewritten
    /// * `Err(RepositoryError::NotFound)` - If no reader has this id
    /// * `Err(RepositoryError)` - If the statement fails
    async fn update_reader(&self, reader: &Reader) -> RepositoryResult<()>;

    /// Delete the reader with `id` together with its `books_in_use` rows.
    ///
    /// Both deletes run in one transaction. Deleting an id that does not
    /// exist succeeds.
    async fn delete_reader(&self, id: ReaderId) -> RepositoryResult<()>;
}
