//! Repository configuration file support.
//!
//! Reads the backend choice and Postgres settings from a TOML file:
//!
//! ```toml
//! [repository]
//! type = "postgres"
//!
//! [postgres]
//! host = "localhost"
//! port = 5400
//! username = "postgres"
//! password = "docker"
//! database = "postgres"
//! max_connections = 10
//! ```
//!
//! `database_url` may be given instead of the individual connection fields.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::config::{DbConfig, PostgresConfig};
use super::factory::RepositoryType;
use super::repository::RepositoryError;

/// Repository configuration from file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub repository: RepositorySettings,
    #[serde(default)]
    pub postgres: PostgresSettings,
}

/// Repository type settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type")]
    pub repo_type: String,
}

/// Postgres connection settings.
///
/// Connection fields left out fall back to the [`DbConfig`] defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresSettings {
    #[serde(default)]
    pub database_url: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub sslmode: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    #[serde(default)]
    pub run_migrations: bool,
}

impl Default for PostgresSettings {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            host: None,
            port: None,
            username: None,
            password: None,
            database: None,
            sslmode: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout: default_connect_timeout(),
            idle_timeout: default_idle_timeout(),
            query_timeout_ms: default_query_timeout_ms(),
            run_migrations: false,
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_query_timeout_ms() -> u64 {
    5_000
}

impl PostgresSettings {
    fn db_config(&self) -> DbConfig {
        let defaults = DbConfig::default();
        DbConfig {
            host: self.host.clone().unwrap_or(defaults.host),
            port: self.port.unwrap_or(defaults.port),
            username: self.username.clone().unwrap_or(defaults.username),
            password: self.password.clone().unwrap_or(defaults.password),
            database: self.database.clone().unwrap_or(defaults.database),
            sslmode: self.sslmode.clone().unwrap_or(defaults.sslmode),
        }
    }
}

impl RepositoryConfig {
    /// Load repository configuration from a TOML file.
    ///
    /// # Returns
    /// * `Ok(RepositoryConfig)` if successful
    /// * `Err(RepositoryError)` if file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse repository configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, RepositoryError> {
        toml::from_str(content).map_err(|e| {
            RepositoryError::configuration(format!("Failed to parse config file: {}", e))
        })
    }

    /// Find `repository.toml` in the usual places.
    ///
    /// Searches the current directory, then `backend/`, then the parent
    /// directory. Returns `None` when no file exists.
    pub fn find_default_location() -> Option<PathBuf> {
        [
            PathBuf::from("repository.toml"),
            PathBuf::from("backend/repository.toml"),
            PathBuf::from("../repository.toml"),
        ]
        .into_iter()
        .find(|path| path.exists())
    }

    /// Get the repository type from configuration.
    pub fn repository_type(&self) -> Result<RepositoryType, String> {
        RepositoryType::from_str(&self.repository.repo_type)
    }

    /// Convert to PostgresConfig if this is a Postgres configuration.
    ///
    /// Returns `Ok(None)` for other repository types.
    pub fn to_postgres_config(&self) -> Result<Option<PostgresConfig>, RepositoryError> {
        let repo_type = self.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;

        if repo_type != RepositoryType::Postgres {
            return Ok(None);
        }

        let settings = &self.postgres;
        if settings.max_connections == 0 {
            return Err(RepositoryError::configuration(
                "postgres.max_connections must be greater than zero",
            ));
        }
        if settings.min_connections > settings.max_connections {
            return Err(RepositoryError::configuration(
                "postgres.min_connections must not exceed postgres.max_connections",
            ));
        }
        if settings.query_timeout_ms == 0 {
            return Err(RepositoryError::configuration(
                "postgres.query_timeout_ms must be greater than zero",
            ));
        }

        let database_url = if settings.database_url.trim().is_empty() {
            settings.db_config().connection_string()
        } else {
            settings.database_url.clone()
        };

        Ok(Some(PostgresConfig {
            database_url,
            max_pool_size: settings.max_connections,
            min_pool_size: settings.min_connections,
            connection_timeout_sec: settings.connect_timeout,
            idle_timeout_sec: settings.idle_timeout,
            query_timeout_ms: settings.query_timeout_ms,
            run_migrations: settings.run_migrations,
        }))
    }
}
