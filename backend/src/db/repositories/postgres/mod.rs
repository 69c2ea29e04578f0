//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Eager liveness check on connect
//! - Per-call deadline, mirrored as `statement_timeout` on every pooled
//!   connection
//! - Query statistics for health monitoring
//!
//! Configuration lives in [`crate::db::config`]. Every statement goes through
//! Diesel's query builder or bound parameters; no user input is ever
//! interpolated into SQL text.

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sql_query;
use diesel::sql_types::Integer;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;

use crate::db::config::PostgresConfig;
use crate::db::repository::{ErrorContext, ReaderRepository, RepositoryError, RepositoryResult};
use crate::models::{Reader, ReaderId};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
}

/// Applies the server-side statement deadline to each new connection.
#[derive(Debug)]
struct StatementTimeout {
    millis: u64,
}

impl CustomizeConnection<PgConnection, diesel::r2d2::Error> for StatementTimeout {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), diesel::r2d2::Error> {
        sql_query(format!("SET statement_timeout = {}", self.millis))
            .execute(conn)
            .map(|_| ())
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Diesel-backed repository for Postgres.
///
/// Cloning is cheap and shares the pool. After [`close`](ReaderRepository::close)
/// the pool is dropped and every clone reports a connection error.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: Arc<RwLock<Option<PgPool>>>,
    config: PostgresConfig,
    // Metrics counters
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
}

fn reader_context(operation: &str, id: Option<ReaderId>) -> ErrorContext {
    let ctx = ErrorContext::new(operation).with_entity("reader");
    match id {
        Some(id) => ctx.with_entity_id(id),
        None => ctx,
    }
}

impl PostgresRepository {
    /// Open the pool, run migrations if configured, and verify liveness.
    ///
    /// # Returns
    /// * `Ok(PostgresRepository)` once a round trip to the database succeeded
    /// * `Err(RepositoryError::ConnectionError)` if the database cannot be
    ///   reached or does not answer
    pub async fn connect(config: PostgresConfig) -> RepositoryResult<Self> {
        let repo = task::spawn_blocking(move || Self::new(config))
            .await
            .map_err(|e| {
                RepositoryError::internal_with_context(
                    format!("Task join error: {}", e),
                    ErrorContext::new("connect"),
                )
            })??;

        repo.ping().await.map_err(|e| {
            RepositoryError::connection_with_context(
                format!("Database did not answer ping: {}", e.message()),
                ErrorContext::new("connect"),
            )
        })?;

        Ok(repo)
    }

    /// Build the pool synchronously. Prefer [`PostgresRepository::connect`],
    /// which also pings the database.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .connection_customizer(Box::new(StatementTimeout {
                millis: config.query_timeout_ms,
            }))
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        if config.run_migrations {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool: Arc::new(RwLock::new(Some(pool))),
            config,
            total_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation on a pooled connection.
    ///
    /// The blocking Diesel call runs on the blocking thread pool under the
    /// configured deadline. Failures are returned once; nothing is retried.
    /// Every error is tagged with `context`.
    async fn with_conn<T, F>(&self, context: ErrorContext, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static,
    {
        let pool = match self.pool.read().as_ref() {
            Some(pool) => pool.clone(),
            None => {
                return Err(RepositoryError::connection_with_context(
                    "Repository is closed",
                    context,
                ))
            }
        };
        let total_queries = self.total_queries.clone();
        let deadline = Duration::from_millis(self.config.query_timeout_ms);

        let call = task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(RepositoryError::from)?;
            total_queries.fetch_add(1, Ordering::Relaxed);
            f(&mut conn)
        });

        let result = match tokio::time::timeout(deadline, call).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(RepositoryError::internal(format!(
                "Task join error: {}",
                join_err
            ))),
            Err(_) => Err(RepositoryError::timeout_with_context(
                format!("Database call exceeded {} ms", deadline.as_millis()),
                ErrorContext::default(),
            )),
        };

        result.map_err(|e| {
            self.failed_queries.fetch_add(1, Ordering::Relaxed);
            e.with_context(context)
        })
    }

    async fn ping(&self) -> RepositoryResult<()> {
        self.with_conn(ErrorContext::new("ping"), |conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| ())
                .map_err(RepositoryError::from)
        })
        .await
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let (connections, idle) = match self.pool.read().as_ref() {
            Some(pool) => {
                let state = pool.state();
                (state.connections, state.idle_connections)
            }
            None => (0, 0),
        };
        PoolStats {
            connections_in_use: connections - idle,
            idle_connections: idle,
            total_connections: connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl ReaderRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.ping().await.map(|_| true)
    }

    async fn close(&self) {
        // Dropping the last pool handle closes its connections once any
        // in-flight calls return theirs.
        self.pool.write().take();
    }

    async fn get_reader(&self, id: ReaderId) -> RepositoryResult<Reader> {
        self.with_conn(reader_context("get_reader", Some(id)), move |conn| {
            readers::table
                .find(id.value())
                .select(ReaderRow::as_select())
                .first::<ReaderRow>(conn)
                .optional()
                .map_err(RepositoryError::from)?
                .map(Reader::from)
                .ok_or_else(|| RepositoryError::not_found(format!("Reader {} not found", id)))
        })
        .await
    }

    async fn list_readers(&self) -> RepositoryResult<Vec<Reader>> {
        self.with_conn(reader_context("list_readers", None), |conn| {
            let rows = readers::table
                .select(ReaderRow::as_select())
                .load::<ReaderRow>(conn)
                .map_err(RepositoryError::from)?;

            Ok(rows.into_iter().map(Reader::from).collect())
        })
        .await
    }

    async fn add_reader(&self, reader: &Reader) -> RepositoryResult<ReaderId> {
        let new_row = NewReaderRow::from(reader);
        self.with_conn(reader_context("add_reader", None), move |conn| {
            // INSERT ... RETURNING keeps insert and id retrieval in one round trip.
            diesel::insert_into(readers::table)
                .values(&new_row)
                .returning(readers::reader_num)
                .get_result::<i32>(conn)
                .map(ReaderId)
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn update_reader(&self, reader: &Reader) -> RepositoryResult<()> {
        let id = reader.id;
        let changes = ReaderChangeset::from(reader);
        self.with_conn(reader_context("update_reader", Some(id)), move |conn| {
            let updated = diesel::update(readers::table.find(id.value()))
                .set(&changes)
                .execute(conn)
                .map_err(RepositoryError::from)?;

            if updated == 0 {
                return Err(RepositoryError::not_found(format!("Reader {} not found", id)));
            }
            Ok(())
        })
        .await
    }

    async fn delete_reader(&self, id: ReaderId) -> RepositoryResult<()> {
        self.with_conn(reader_context("delete_reader", Some(id)), move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                sql_query("DELETE FROM books_in_use WHERE reader_num = $1")
                    .bind::<Integer, _>(id.value())
                    .execute(tx)?;

                diesel::delete(readers::table.find(id.value())).execute(tx)?;

                Ok(())
            })
        })
        .await
    }
}
