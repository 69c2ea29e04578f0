//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! repository. Handlers are the only place that logs request failures:
//! server-side faults at `error`, client mistakes at `debug`.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use tracing::{debug, error};

use super::dto::HealthResponse;
use super::error::AppError;
use super::state::AppState;
use crate::db::repository::RepositoryError;
use crate::models::{Reader, ReaderId};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Log a repository failure with its operation and id, then wrap it.
fn repository_failure(
    operation: &'static str,
    id: Option<ReaderId>,
    err: RepositoryError,
) -> AppError {
    let id = id.map(|id| id.value());
    if err.is_not_found() {
        debug!(operation, reader_id = ?id, "{}", err);
    } else {
        error!(operation, reader_id = ?id, error = %err, "reader operation failed");
    }
    AppError::Repository(err)
}

fn parse_reader_id(raw: &str) -> Result<ReaderId, AppError> {
    raw.parse::<ReaderId>().map_err(|e| {
        debug!(raw_id = raw, error = %e, "rejected malformed reader id");
        AppError::BadRequest(format!("Invalid reader ID '{}'", raw))
    })
}

/// Decode a reader from a JSON body.
///
/// Content type is not checked; any body that is not a JSON reader
/// (syntax error, wrong field type, missing `name` or `phone`) is a 400.
fn decode_reader(body: &Bytes) -> Result<Reader, AppError> {
    let deserializer = &mut serde_json::Deserializer::from_slice(body);
    serde_path_to_error::deserialize(deserializer).map_err(|e| {
        let path = e.path().to_string();
        debug!(path = %path, error = %e.inner(), "rejected malformed reader body");
        AppError::BadRequest(format!("Invalid reader JSON at '{}': {}", path, e.inner()))
    })
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the database
/// is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let database = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => {
            error!(error = %e, "health check failed");
            format!("error: {}", e.message())
        }
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        database,
    }))
}

// =============================================================================
// Reader collection
// =============================================================================

/// GET /readers
///
/// List all readers. An empty table yields `[]`.
pub async fn list_readers(State(state): State<AppState>) -> HandlerResult<Vec<Reader>> {
    let readers = state
        .repository
        .list_readers()
        .await
        .map_err(|e| repository_failure("list_readers", None, e))?;

    Ok(Json(readers))
}

/// POST /readers
///
/// Store a new reader. Any `num` in the body is ignored.
pub async fn create_reader(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let reader = decode_reader(&body)?;

    let id = state
        .repository
        .add_reader(&reader)
        .await
        .map_err(|e| repository_failure("add_reader", None, e))?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/readers/{}", id))],
        format!("Added reader with ID: {}", id),
    ))
}

// =============================================================================
// Single reader
// =============================================================================

/// GET /readers/{id}
pub async fn get_reader(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> HandlerResult<Reader> {
    let id = parse_reader_id(&raw_id)?;

    let reader = state
        .repository
        .get_reader(id)
        .await
        .map_err(|e| repository_failure("get_reader", Some(id), e))?;

    Ok(Json(reader))
}

/// PUT /readers/{id}
///
/// Replace name, address, and phone. The id in the path wins over any
/// `num` in the body.
pub async fn update_reader(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_reader_id(&raw_id)?;
    let reader = decode_reader(&body)?.with_id(id);

    state
        .repository
        .update_reader(&reader)
        .await
        .map_err(|e| repository_failure("update_reader", Some(id), e))?;

    Ok((StatusCode::OK, format!("Reader with ID {} updated", id)))
}

/// DELETE /readers/{id}
///
/// Remove the reader and its `books_in_use` rows.
pub async fn delete_reader(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_reader_id(&raw_id)?;

    state
        .repository
        .delete_reader(id)
        .await
        .map_err(|e| repository_failure("delete_reader", Some(id), e))?;

    Ok((StatusCode::OK, format!("Reader with ID {} deleted", id)))
}

/// Fallback for paths no route matches.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}
