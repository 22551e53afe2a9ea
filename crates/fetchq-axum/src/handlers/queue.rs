//! Queue handlers: submission, per-job and bulk controls, listing, and the
//! progress stream.

use std::convert::Infallible;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::sse::{Event, Sse};
use futures_util::stream::Stream;
use serde::{Deserialize, Serialize};

use fetchq_core::{JobId, ProgressSnapshot, QualityTier, QueueError, SourceId};
use fetchq_download::QueueStats;

use super::required;
use crate::error::HttpError;
use crate::sse::progress_stream;
use crate::state::AppState;

/// Body of `POST /api/queue/start`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
}

impl StartRequest {
    fn validate(self) -> Result<(JobId, SourceId, QualityTier), QueueError> {
        let id = required(self.id, "id")?;
        let source = SourceId::parse(required(self.video_id, "videoId")?)?;
        let quality = required(self.quality, "quality")?.parse()?;
        Ok((JobId::new(id.trim()), source, quality))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub success: bool,
    pub message: String,
    pub download_id: String,
}

/// Reply to every control endpoint.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleared: Option<usize>,
}

impl ActionResponse {
    fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            cleared: None,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct QueueResponse {
    pub success: bool,
    /// Every record in submission order.
    pub downloads: Vec<ProgressSnapshot>,
    pub stats: QueueStats,
}

/// Queue a job.
///
/// Worker failures after this point are reported on the progress stream,
/// never here.
pub async fn start(
    State(state): State<AppState>,
    Json(req): Json<StartRequest>,
) -> Result<Json<StartResponse>, HttpError> {
    let (id, source, quality) = req.validate()?;
    state.scheduler.submit(id.clone(), source, quality).await?;

    Ok(Json(StartResponse {
        success: true,
        message: "Download started".to_string(),
        download_id: id.to_string(),
    }))
}

/// Pause a job. Unknown ids succeed without effect.
pub async fn pause(State(state): State<AppState>, Path(id): Path<String>) -> Json<ActionResponse> {
    if !state.scheduler.pause(&JobId::new(id.as_str())).await {
        tracing::debug!(target: "fetchq.queue", job_id = %id, "Pause ignored");
    }
    ActionResponse::ok("Download paused")
}

/// Resume a paused job. Unknown ids succeed without effect.
pub async fn resume(State(state): State<AppState>, Path(id): Path<String>) -> Json<ActionResponse> {
    if !state.scheduler.resume(&JobId::new(id.as_str())).await {
        tracing::debug!(target: "fetchq.queue", job_id = %id, "Resume ignored");
    }
    ActionResponse::ok("Download resumed")
}

/// Cancel a job.
///
/// Idempotent: cancelling an unknown or finished job still returns success,
/// so a client racing the progress stream never sees an error.
pub async fn cancel(State(state): State<AppState>, Path(id): Path<String>) -> Json<ActionResponse> {
    if !state.scheduler.cancel(&JobId::new(id.as_str())).await {
        tracing::debug!(target: "fetchq.queue", job_id = %id, "Cancel ignored");
    }
    ActionResponse::ok("Download cancelled")
}

pub async fn pause_all(State(state): State<AppState>) -> Json<ActionResponse> {
    state.scheduler.pause_all().await;
    ActionResponse::ok("All downloads paused")
}

pub async fn resume_all(State(state): State<AppState>) -> Json<ActionResponse> {
    state.scheduler.resume_all().await;
    ActionResponse::ok("All downloads resumed")
}

/// Stop every worker and clear the index.
pub async fn cleanup(State(state): State<AppState>) -> Json<ActionResponse> {
    let cleared = state.scheduler.cleanup().await;
    Json(ActionResponse {
        success: true,
        message: format!("Cleaned up {cleared} downloads"),
        cleared: Some(cleared),
    })
}

pub async fn list(State(state): State<AppState>) -> Json<QueueResponse> {
    let listing = state.scheduler.list().await;
    Json(QueueResponse {
        success: true,
        downloads: listing.jobs,
        stats: listing.stats,
    })
}

/// Long-lived progress stream.
pub async fn progress(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
    progress_stream(&state.broadcast, state.keep_alive)
}
