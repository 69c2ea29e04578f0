//! Readers HTTP Server Binary
//!
//! This is the main entry point for the readers REST API server.
//! It initializes the repository, sets up the HTTP router, and starts serving requests.
//!
//! # Usage
//!
//! ```bash
//! # Run with local (in-memory) repository (default build)
//! cargo run --bin readers-server
//!
//! # Run against PostgreSQL
//! DB_HOST=localhost DB_PORT=5400 DB_PASSWORD=docker \
//!   cargo run --bin readers-server --features "postgres-repo"
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `READERS_CONFIG`: Path to a `repository.toml` (optional; otherwise the
//!   usual locations are searched, then the environment is used)
//! - `REPOSITORY_TYPE`: `postgres` or `local`
//! - `DATABASE_URL` or `DB_HOST` / `DB_PORT` / `DB_USERNAME` / `DB_PASSWORD` / `DB_NAME`
//! - `RUST_LOG`: Log filter (default: info)

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use readers_service::db::{ReaderRepository, RepositoryConfig, RepositoryFactory};
use readers_service::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting readers HTTP server");

    // A repository that cannot reach its database is fatal at startup.
    let repository = create_repository()
        .await
        .context("Failed to initialize repository")?;
    info!("Repository initialized successfully");

    let state = AppState::new(Arc::clone(&repository));
    let app = create_router(state);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = match env::var("PORT") {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("PORT must be a valid port number, got '{}'", raw))?,
        Err(_) => 8080,
    };
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", host, port))?;

    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    repository.close().await;
    info!("Repository closed");

    served?;
    Ok(())
}

async fn create_repository() -> anyhow::Result<Arc<dyn ReaderRepository>> {
    let config_path = env::var("READERS_CONFIG")
        .ok()
        .map(PathBuf::from)
        .or_else(RepositoryConfig::find_default_location);

    let repository = match config_path {
        Some(path) => {
            info!("Loading repository configuration from {}", path.display());
            RepositoryFactory::from_config_file(&path).await?
        }
        None => RepositoryFactory::from_env().await?,
    };
    Ok(repository)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
