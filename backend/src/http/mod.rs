//! HTTP server module for the readers service.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Router (axum)                                            │
//! │  - Path/method dispatch, 405 on method mismatch           │
//! │  - Tracing, request timeout, body limit                   │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Handlers                                                 │
//! │  - Path and JSON body decoding                            │
//! │  - Error → status mapping and error logging               │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Repository Layer (db/)                                   │
//! │  - PostgresRepository / LocalRepository                   │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::{create_router, create_router_with_timeout};
pub use state::AppState;
