//! Observer-facing views of a job.

use serde::{Deserialize, Serialize};

use super::{JobId, JobStatus};

/// Size text shown before any progress is known.
pub const IDLE_SIZE: &str = "0 MB";
/// Speed text for jobs that are not transferring.
pub const IDLE_SPEED: &str = "0 MB/s";
/// ETA placeholder when the worker gave none.
pub const UNKNOWN_ETA: &str = "--:--";
/// ETA shown on completion.
pub const DONE_ETA: &str = "00:00";

/// Immutable point-in-time view of a job's transfer progress.
///
/// Broadcast by copy; never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub id: JobId,
    pub status: JobStatus,
    /// Percentage in `0.0..=100.0`.
    pub progress: f64,
    pub downloaded_size: String,
    pub total_size: String,
    pub speed: String,
    pub eta: String,
    /// Milliseconds since the Unix epoch at construction.
    pub timestamp: i64,
    /// Failure detail, present only on failed snapshots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One accepted progress line, as extracted from worker output.
///
/// Every field except `percent` is best-effort.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub percent: f64,
    pub total_size: Option<String>,
    pub downloaded_size: Option<String>,
    pub speed: Option<String>,
    /// Parsed ETA, or [`UNKNOWN_ETA`] when the line had none.
    pub eta: String,
}

impl ProgressUpdate {
    /// An update carrying only a percentage.
    #[must_use]
    pub fn percent_only(percent: f64) -> Self {
        Self {
            percent,
            total_size: None,
            downloaded_size: None,
            speed: None,
            eta: UNKNOWN_ETA.to_string(),
        }
    }
}
