//! Downloads folder info.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::error::HttpError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct FolderResponse {
    pub success: bool,
    pub path: String,
    pub message: String,
}

/// Report the shared downloads directory, creating it if absent.
pub async fn folder(State(state): State<AppState>) -> Result<Json<FolderResponse>, HttpError> {
    let dir = &state.scheduler.config().downloads_dir;
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        tracing::warn!(path = %dir.display(), error = %e, "Could not create downloads directory");
        HttpError::Internal("Failed to access downloads folder".to_string())
    })?;

    let path = dir.display().to_string();
    Ok(Json(FolderResponse {
        success: true,
        message: format!("Queued downloads are stored in {path} on the server"),
        path,
    }))
}
