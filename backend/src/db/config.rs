//! Database configuration and environment variable handling.

use std::env;
use std::fmt;

/// Connection settings for the readers database.
///
/// Every field has a default so a bare development setup works without any
/// environment variables.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Database server hostname
    pub host: String,
    /// Database server port (default: 5400)
    pub port: u16,
    /// Login role
    pub username: String,
    /// Login password
    pub password: String,
    /// Database name
    pub database: String,
    /// libpq `sslmode` (default: `disable`)
    pub sslmode: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5400,
            username: "postgres".to_string(),
            password: "docker".to_string(),
            database: "postgres".to_string(),
            sslmode: "disable".to_string(),
        }
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("sslmode", &self.sslmode)
            .finish()
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `DB_HOST` (default: `localhost`)
    /// - `DB_PORT` (default: `5400`)
    /// - `DB_USERNAME` (default: `postgres`)
    /// - `DB_PASSWORD` (default: `docker`)
    /// - `DB_NAME` (default: `postgres`)
    /// - `DB_SSLMODE` (default: `disable`)
    ///
    /// # Errors
    /// Returns an error if `DB_PORT` is not a valid port number.
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let port = match env::var("DB_PORT") {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| format!("DB_PORT must be a valid port number, got '{}'", raw))?,
            Err(_) => defaults.port,
        };

        Ok(Self {
            host: env::var("DB_HOST").unwrap_or(defaults.host),
            port,
            username: env::var("DB_USERNAME").unwrap_or(defaults.username),
            password: env::var("DB_PASSWORD").unwrap_or(defaults.password),
            database: env::var("DB_NAME").unwrap_or(defaults.database),
            sslmode: env::var("DB_SSLMODE").unwrap_or(defaults.sslmode),
        })
    }

    /// Render a libpq key/value connection string.
    ///
    /// Values are quoted and escaped, so passwords with spaces or quotes are
    /// passed through intact.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={} sslmode={}",
            quote_conninfo_value(&self.host),
            self.port,
            quote_conninfo_value(&self.username),
            quote_conninfo_value(&self.password),
            quote_conninfo_value(&self.database),
            quote_conninfo_value(&self.sslmode),
        )
    }
}

fn quote_conninfo_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if !needs_quotes {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// Pool and connection settings for the Postgres repository.
#[derive(Clone)]
pub struct PostgresConfig {
    /// Database connection string (URL or libpq key/value form)
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of idle connections kept in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Deadline for a single repository call, in milliseconds
    pub query_timeout_ms: u64,
    /// Apply the embedded schema migrations on connect
    pub run_migrations: bool,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: DbConfig::default().connection_string(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            query_timeout_ms: 5_000,
            run_migrations: false,
        }
    }
}

impl fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The connection string embeds the password.
        f.debug_struct("PostgresConfig")
            .field("database_url", &"<redacted>")
            .field("max_pool_size", &self.max_pool_size)
            .field("min_pool_size", &self.min_pool_size)
            .field("connection_timeout_sec", &self.connection_timeout_sec)
            .field("idle_timeout_sec", &self.idle_timeout_sec)
            .field("query_timeout_ms", &self.query_timeout_ms)
            .field("run_migrations", &self.run_migrations)
            .finish()
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `DATABASE_URL`: Full connection string; when unset the string is
    ///   built from the `DB_*` variables (see [`DbConfig::from_env`])
    /// - `PG_POOL_MAX`: Maximum pool size (default: 10)
    /// - `PG_POOL_MIN`: Minimum pool size (default: 1)
    /// - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
    /// - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
    /// - `PG_QUERY_TIMEOUT_MS`: Per-call deadline in milliseconds (default: 5000)
    /// - `PG_RUN_MIGRATIONS`: `true` to create the tables on connect (default: false)
    pub fn from_env() -> Result<Self, String> {
        let database_url = match env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => DbConfig::from_env()?.connection_string(),
        };
        Self::from_env_with_url(database_url)
    }

    /// Read the pool settings from the environment, using `database_url` as is.
    pub fn from_env_with_url(database_url: impl Into<String>) -> Result<Self, String> {
        let defaults = Self::default();

        let max_pool_size = env_parse("PG_POOL_MAX")?.unwrap_or(defaults.max_pool_size);
        let min_pool_size = env_parse("PG_POOL_MIN")?.unwrap_or(defaults.min_pool_size);
        if max_pool_size == 0 {
            return Err("PG_POOL_MAX must be greater than zero".to_string());
        }
        if min_pool_size > max_pool_size {
            return Err(format!(
                "PG_POOL_MIN ({}) must not exceed PG_POOL_MAX ({})",
                min_pool_size, max_pool_size
            ));
        }

        // Zero would time out every call and disable `statement_timeout`.
        let query_timeout_ms =
            env_parse("PG_QUERY_TIMEOUT_MS")?.unwrap_or(defaults.query_timeout_ms);
        if query_timeout_ms == 0 {
            return Err("PG_QUERY_TIMEOUT_MS must be greater than zero".to_string());
        }

        Ok(Self {
            database_url: database_url.into(),
            max_pool_size,
            min_pool_size,
            connection_timeout_sec: env_parse("PG_CONN_TIMEOUT_SEC")?
                .unwrap_or(defaults.connection_timeout_sec),
            idle_timeout_sec: env_parse("PG_IDLE_TIMEOUT_SEC")?
                .unwrap_or(defaults.idle_timeout_sec),
            query_timeout_ms,
            run_migrations: env_parse("PG_RUN_MIGRATIONS")?.unwrap_or(defaults.run_migrations),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, String> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("{} has an invalid value: '{}'", key, raw)),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_connection_string() {
        let cfg = DbConfig::default();
        assert_eq!(
            cfg.connection_string(),
            "host=localhost port=5400 user=postgres password=docker dbname=postgres sslmode=disable"
        );
    }

    #[test]
    fn test_connection_string_quotes_special_values() {
        let cfg = DbConfig {
            password: "it's a secret".to_string(),
            database: String::new(),
            ..Default::default()
        };
        let conn = cfg.connection_string();
        assert!(conn.contains(r"password='it\'s a secret'"));
        assert!(conn.contains("dbname=''"));
    }

    #[test]
    fn test_connection_string_escapes_backslash() {
        assert_eq!(quote_conninfo_value(r"a\b"), r"'a\\b'");
        assert_eq!(quote_conninfo_value("plain"), "plain");
    }

    #[test]
    fn test_debug_redacts_password() {
        let cfg = DbConfig::default();
        let debug = format!("{:?}", cfg);
        assert!(!debug.contains("docker"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_postgres_config_with_url() {
        let cfg = PostgresConfig::with_url("postgres://u:p@h/db");
        assert_eq!(cfg.database_url, "postgres://u:p@h/db");
        assert_eq!(cfg.max_pool_size, 10);
        assert!(!cfg.run_migrations);
    }
}
