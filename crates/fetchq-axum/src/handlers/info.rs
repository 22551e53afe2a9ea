//! Per-tier exact size probe.

use axum::Json;
use axum::extract::{Query, State};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use fetchq_core::SourceId;

use super::required;
use crate::error::HttpError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfoQuery {
    pub video_id: Option<String>,
}

/// Exact sizes keyed by tier label, highest tier first.
///
/// Tiers without an exact size are listed in `unavailable`; no estimate
/// is ever filled in for them.
#[derive(Debug, Serialize)]
pub struct VideoInfoResponse {
    pub success: bool,
    pub sizes: IndexMap<&'static str, String>,
    pub unavailable: Vec<&'static str>,
}

pub async fn video_info(
    State(state): State<AppState>,
    Query(query): Query<VideoInfoQuery>,
) -> Result<Json<VideoInfoResponse>, HttpError> {
    let source = SourceId::parse(required(query.video_id, "videoId")?)?;
    let report = state.probe.probe_sizes(&source.url()).await;

    let sizes: IndexMap<_, _> = report.formatted().collect();
    let unavailable: Vec<_> = report.unavailable().collect();
    tracing::info!(
        target: "fetchq.probe",
        source = %source,
        known = sizes.len(),
        unavailable = unavailable.len(),
        "Size probe finished"
    );

    Ok(Json(VideoInfoResponse {
        success: true,
        sizes,
        unavailable,
    }))
}
