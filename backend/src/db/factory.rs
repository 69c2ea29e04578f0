//! Repository factory for dependency injection.
//!
//! This module creates repository instances based on runtime configuration.
//! The server builds exactly one repository at startup and hands it to the
//! HTTP state; there is no process-wide singleton.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use super::config::PostgresConfig;
use super::repo_config::RepositoryConfig;
use super::repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
use super::repositories::PostgresRepository;
use super::repository::{ReaderRepository, RepositoryError, RepositoryResult};

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// Postgres + Diesel implementation
    Postgres,
    /// In-memory local repository
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Parse repository type from string ("postgres", "pg", "local").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// The backend used when nothing is configured: Postgres when compiled
    /// in, otherwise the in-memory repository.
    pub fn default_for_build() -> Self {
        if cfg!(feature = "postgres-repo") {
            Self::Postgres
        } else {
            Self::Local
        }
    }

    /// Get repository type from the `REPOSITORY_TYPE` environment variable.
    ///
    /// # Errors
    /// Returns an error if the variable is set to an unknown value.
    pub fn from_env() -> Result<Self, String> {
        match std::env::var("REPOSITORY_TYPE") {
            Ok(val) if !val.trim().is_empty() => val.parse(),
            _ => Ok(Self::default_for_build()),
        }
    }
}

/// Repository factory for creating repository instances.
///
/// # Example
/// ```ignore
/// use readers_service::db::{PostgresConfig, RepositoryFactory, RepositoryType};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = PostgresConfig::from_env()?;
///     let repo = RepositoryFactory::create(RepositoryType::Postgres, Some(&config)).await?;
///     println!("healthy: {}", repo.health_check().await?);
///     Ok(())
/// }
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository instance based on type.
    ///
    /// # Arguments
    /// * `repo_type` - Type of repository to create
    /// * `postgres_config` - Database configuration (required for Postgres)
    ///
    /// # Returns
    /// * `Ok(Arc<dyn ReaderRepository>)` - Connected repository instance
    /// * `Err(RepositoryError)` - If configuration is missing or the
    ///   database cannot be reached
    pub async fn create(
        repo_type: RepositoryType,
        postgres_config: Option<&PostgresConfig>,
    ) -> RepositoryResult<Arc<dyn ReaderRepository>> {
        match repo_type {
            RepositoryType::Postgres => {
                let config = postgres_config.ok_or_else(|| {
                    RepositoryError::configuration("Postgres repository requires PostgresConfig")
                })?;
                Self::create_postgres(config).await
            }
            RepositoryType::Local => Ok(Self::create_local()),
        }
    }

    /// Create a Postgres repository and verify the connection.
    #[cfg(feature = "postgres-repo")]
    pub async fn create_postgres(
        config: &PostgresConfig,
    ) -> RepositoryResult<Arc<dyn ReaderRepository>> {
        let repo = PostgresRepository::connect(config.clone()).await?;
        Ok(Arc::new(repo))
    }

    /// Create a Postgres repository when the feature is disabled.
    #[cfg(not(feature = "postgres-repo"))]
    pub async fn create_postgres(
        _config: &PostgresConfig,
    ) -> RepositoryResult<Arc<dyn ReaderRepository>> {
        Err(RepositoryError::configuration(
            "Postgres repository feature not enabled",
        ))
    }

    /// Create an in-memory local repository.
    pub fn create_local() -> Arc<dyn ReaderRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Create repository from environment configuration.
    ///
    /// Reads `REPOSITORY_TYPE` to pick the backend and, for Postgres, the
    /// variables documented on [`PostgresConfig::from_env`].
    pub async fn from_env() -> RepositoryResult<Arc<dyn ReaderRepository>> {
        let repo_type = RepositoryType::from_env().map_err(RepositoryError::configuration)?;

        match repo_type {
            RepositoryType::Postgres => {
                let config = PostgresConfig::from_env().map_err(RepositoryError::configuration)?;
                Self::create_postgres(&config).await
            }
            RepositoryType::Local => Ok(Self::create_local()),
        }
    }

    /// Create repository from a TOML configuration file.
    pub async fn from_config_file<P: AsRef<Path>>(
        config_path: P,
    ) -> RepositoryResult<Arc<dyn ReaderRepository>> {
        let config = RepositoryConfig::from_file(config_path)?;
        Self::from_repository_config(&config).await
    }

    /// Create repository from a parsed [`RepositoryConfig`].
    pub async fn from_repository_config(
        config: &RepositoryConfig,
    ) -> RepositoryResult<Arc<dyn ReaderRepository>> {
        let repo_type = config.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;
        let pg_config = config.to_postgres_config()?;
        Self::create(repo_type, pg_config.as_ref()).await
    }
}
