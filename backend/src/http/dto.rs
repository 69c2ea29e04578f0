//! Data Transfer Objects for the HTTP API.
//!
//! Readers travel as [`crate::models::Reader`] directly; only the auxiliary
//! endpoints need their own shapes.

use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Database connection status ("connected", "disconnected", or an error)
    pub database: String,
}
