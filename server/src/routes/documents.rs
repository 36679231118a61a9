//! Project document routes: initial load and autosave.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use frames::ProjectDocument;
use tracing::info;

use crate::frame::ErrorCode;
use crate::routes::auth::AuthUser;
use crate::services::document::DocumentError;
use crate::state::AppState;

fn document_error_to_status(err: DocumentError) -> StatusCode {
    match err {
        DocumentError::NotFound(_) => StatusCode::NOT_FOUND,
        DocumentError::Database(_) | DocumentError::Serialize(_) => {
            tracing::error!(error = %err, code = err.error_code(), "documents: store failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// `GET /api/projects/{id}/document`: the stored snapshot.
pub async fn get_document(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectDocument>, StatusCode> {
    state
        .documents
        .get(&project_id)
        .await
        .map(Json)
        .map_err(document_error_to_status)
}

/// `PUT /api/projects/{id}/document`: replace the stored snapshot.
pub async fn put_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(document): Json<ProjectDocument>,
) -> Result<Json<ProjectDocument>, StatusCode> {
    let objects = document.canvas_data.len();
    let stored = state
        .documents
        .update(&project_id, document)
        .await
        .map_err(document_error_to_status)?;
    info!(%project_id, user_id = %auth.identity.user_id, objects, "documents: saved");
    Ok(Json(stored))
}

#[cfg(test)]
#[path = "documents_test.rs"]
mod tests;
