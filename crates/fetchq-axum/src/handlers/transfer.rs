//! Direct transfer: resolve a format, then stream the worker's stdout as
//! the response body.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::Response;
use serde::Deserialize;

use fetchq_core::{QualityTier, SourceId};

use super::required;
use crate::error::HttpError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadQuery {
    pub video_id: Option<String>,
    pub quality: Option<String>,
}

/// `GET /api/download?videoId=&quality=`
///
/// Resolution and spawn failures are answered with an error status. Once
/// headers are out, a failing worker aborts the body instead.
pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, HttpError> {
    let source = SourceId::parse(required(query.video_id, "videoId")?)?;
    let tier: QualityTier = required(query.quality, "quality")?.parse()?;

    let prepared = state.transfer.prepare(&source, tier).await?;

    let mut builder = Response::builder()
        .header(CONTENT_TYPE, "video/mp4")
        .header(
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", prepared.filename),
        );
    if let Some(length) = prepared.content_length {
        builder = builder.header(CONTENT_LENGTH, length);
    }

    builder
        .body(Body::from_stream(prepared.body))
        .map_err(|e| HttpError::Internal(format!("Failed to build response: {e}")))
}
