//! Assignment CRUD endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use folio_common::model::{Assignment, AssignmentPatch, NewAssignment};
use serde_json::json;
use tracing::debug;

use crate::AppState;

/// GET /api/assignments
pub async fn list_assignments(State(state): State<AppState>) -> Json<Vec<Assignment>> {
    Json(state.repository.list())
}

/// GET /api/assignments/:id
pub async fn get_assignment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Assignment>, AssignmentError> {
    state
        .repository
        .get(id)
        .map(Json)
        .ok_or(AssignmentError::NotFound(id))
}

/// POST /api/assignments
///
/// Title and section are required; the remaining fields get defaults.
pub async fn create_assignment(
    State(state): State<AppState>,
    Json(new): Json<NewAssignment>,
) -> Result<(StatusCode, Json<Assignment>), AssignmentError> {
    new.validate()
        .map_err(|e| AssignmentError::InvalidInput(e.to_string()))?;

    let created = state
        .repository
        .create(new)
        .await
        .map_err(|e| AssignmentError::Conflict(e.to_string()))?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/assignments/:id
///
/// An empty patch returns the record unchanged without persisting or syncing.
pub async fn update_assignment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<AssignmentPatch>,
) -> Result<Json<Assignment>, AssignmentError> {
    if patch.is_empty() {
        debug!(id, "Empty patch, nothing to update");
        return get_assignment(State(state), Path(id)).await;
    }

    state
        .repository
        .update(id, patch)
        .await
        .map(Json)
        .ok_or(AssignmentError::NotFound(id))
}

/// DELETE /api/assignments/:id
pub async fn delete_assignment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AssignmentError> {
    if state.repository.delete(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AssignmentError::NotFound(id))
    }
}

/// Assignment API errors
#[derive(Debug)]
pub enum AssignmentError {
    NotFound(i64),
    InvalidInput(String),
    /// The collection cannot accept the change in its current state
    Conflict(String),
}

impl IntoResponse for AssignmentError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AssignmentError::NotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Assignment not found: {}", id))
            }
            AssignmentError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AssignmentError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
