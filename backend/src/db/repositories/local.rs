//! In-memory local repository implementation.
//!
//! Stores readers and their `books_in_use` rows in memory with the same
//! observable semantics as the Postgres backend: database-style id
//! assignment, `NotFound` on absent rows, and an all-or-nothing cascading
//! delete. Suitable for unit tests and local development.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::{Reader, ReaderId};

/// Failure modes that tests can inject into a [`LocalRepository`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFault {
    /// Every data operation fails with a query error.
    QueryFailure,
    /// `delete_reader` fails after the association rows are gone but before
    /// the reader row is removed.
    DeleteAfterAssociations,
}

/// A `books_in_use` row referencing a reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookInUse {
    pub reader_id: ReaderId,
    pub book_num: i32,
}

/// In-memory local repository.
///
/// # Example
/// ```
/// use readers_service::db::repositories::LocalRepository;
/// use readers_service::db::ReaderRepository;
/// use readers_service::Reader;
///
/// # tokio_test_block(async {
/// let repo = LocalRepository::new();
/// let id = repo.add_reader(&Reader::new("Vasya", Some("Mira 6"), "555")).await.unwrap();
/// assert_eq!(repo.get_reader(id).await.unwrap().name, "Vasya");
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
    operations: Arc<AtomicU64>,
}

struct LocalData {
    readers: HashMap<ReaderId, Reader>,
    books_in_use: Vec<BookInUse>,

    // Mirrors the `reader_num` sequence: ids are never reused.
    next_reader_id: i32,

    // Connection health
    is_healthy: bool,
    closed: bool,
    fault: Option<InjectedFault>,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            readers: HashMap::new(),
            books_in_use: Vec::new(),
            next_reader_id: 1,
            is_healthy: true,
            closed: false,
            fault: None,
        }
    }
}

fn reader_context(operation: &str, id: Option<ReaderId>) -> ErrorContext {
    let ctx = ErrorContext::new(operation).with_entity("reader");
    match id {
        Some(id) => ctx.with_entity_id(id),
        None => ctx,
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
            operations: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Set the health status for testing connection failures.
    ///
    /// An unhealthy repository fails every data operation with a
    /// connection error.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Inject (or clear, with `None`) a failure mode.
    pub fn inject_fault(&self, fault: Option<InjectedFault>) {
        self.data.write().fault = fault;
    }

    /// Record that `reader_id` currently holds `book_num`.
    pub fn lend_book(&self, reader_id: ReaderId, book_num: i32) {
        self.data.write().books_in_use.push(BookInUse {
            reader_id,
            book_num,
        });
    }

    /// Number of `books_in_use` rows referencing `reader_id`.
    pub fn books_in_use_count(&self, reader_id: ReaderId) -> usize {
        self.data
            .read()
            .books_in_use
            .iter()
            .filter(|b| b.reader_id == reader_id)
            .count()
    }

    /// Number of readers stored.
    pub fn reader_count(&self) -> usize {
        self.data.read().readers.len()
    }

    /// Number of data operations (get/list/add/update/delete) issued so far.
    pub fn operation_count(&self) -> u64 {
        self.operations.load(Ordering::Relaxed)
    }

    /// Clear all data, keeping health, fault, and closed state.
    pub fn clear(&self) {
        let mut data = self.data.write();
        data.readers.clear();
        data.books_in_use.clear();
        data.next_reader_id = 1;
    }

    /// Count the call and fail if the repository cannot serve it.
    fn begin(&self, data: &LocalData, context: ErrorContext) -> RepositoryResult<()> {
        self.operations.fetch_add(1, Ordering::Relaxed);
        if data.closed {
            return Err(RepositoryError::connection_with_context(
                "Repository is closed",
                context,
            ));
        }
        if !data.is_healthy {
            return Err(RepositoryError::connection_with_context(
                "Database is not healthy",
                context,
            ));
        }
        if data.fault == Some(InjectedFault::QueryFailure) {
            return Err(RepositoryError::query_with_context(
                "Injected query failure",
                context,
            ));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReaderRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        let data = self.data.read();
        if data.closed {
            return Err(RepositoryError::connection_with_context(
                "Repository is closed",
                ErrorContext::new("health_check"),
            ));
        }
        Ok(data.is_healthy)
    }

    async fn close(&self) {
        self.data.write().closed = true;
    }

    async fn get_reader(&self, id: ReaderId) -> RepositoryResult<Reader> {
        let data = self.data.read();
        self.begin(&data, reader_context("get_reader", Some(id)))?;

        data.readers.get(&id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Reader {} not found", id),
                reader_context("get_reader", Some(id)),
            )
        })
    }

    async fn list_readers(&self) -> RepositoryResult<Vec<Reader>> {
        let data = self.data.read();
        self.begin(&data, reader_context("list_readers", None))?;

        Ok(data.readers.values().cloned().collect())
    }

    async fn add_reader(&self, reader: &Reader) -> RepositoryResult<ReaderId> {
        let mut data = self.data.write();
        self.begin(&data, reader_context("add_reader", None))?;

        let id = ReaderId(data.next_reader_id);
        data.next_reader_id = data.next_reader_id.checked_add(1).ok_or_else(|| {
            RepositoryError::query_with_context(
                "reader_num sequence exhausted",
                reader_context("add_reader", None),
            )
        })?;
        data.readers.insert(id, reader.clone().with_id(id));

        Ok(id)
    }

    async fn update_reader(&self, reader: &Reader) -> RepositoryResult<()> {
        let mut data = self.data.write();
        self.begin(&data, reader_context("update_reader", Some(reader.id)))?;

        match data.readers.get_mut(&reader.id) {
            Some(stored) => {
                stored.name = reader.name.clone();
                stored.address = reader.address.clone();
                stored.phone = reader.phone.clone();
                Ok(())
            }
            None => Err(RepositoryError::not_found_with_context(
                format!("Reader {} not found", reader.id),
                reader_context("update_reader", Some(reader.id)),
            )),
        }
    }

    async fn delete_reader(&self, id: ReaderId) -> RepositoryResult<()> {
        let mut data = self.data.write();
        self.begin(&data, reader_context("delete_reader", Some(id)))?;

        // Work on a copy and only publish it once both steps succeeded.
        let mut remaining_books = data.books_in_use.clone();
        remaining_books.retain(|b| b.reader_id != id);

        if data.fault == Some(InjectedFault::DeleteAfterAssociations) {
            return Err(RepositoryError::query_with_context(
                "Injected failure after deleting books_in_use",
                reader_context("delete_reader", Some(id)),
            ));
        }

        data.books_in_use = remaining_books;
        data.readers.remove(&id);
        Ok(())
    }
}
