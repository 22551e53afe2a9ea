//! Job domain: identity, status, the authoritative job record and its snapshots.

mod errors;
mod snapshot;
mod types;

use chrono::{DateTime, Utc};

pub use errors::QueueError;
pub use snapshot::{
    DONE_ETA, IDLE_SIZE, IDLE_SPEED, ProgressSnapshot, ProgressUpdate, UNKNOWN_ETA,
};
pub use types::{JobId, JobStatus, QualityTier, SourceId};

/// The unit of work: one request to fetch a source at a given tier.
///
/// The scheduler owns the only mutable copy. Everything else sees
/// [`ProgressSnapshot`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub source: SourceId,
    pub quality: QualityTier,
    format: Option<String>,
    pub status: JobStatus,
    pub progress: f64,
    pub downloaded_size: String,
    pub total_size: String,
    pub speed: String,
    pub eta: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a pending job with idle progress fields.
    pub fn new(id: JobId, source: SourceId, quality: QualityTier) -> Self {
        Self {
            id,
            source,
            quality,
            format: None,
            status: JobStatus::Pending,
            progress: 0.0,
            downloaded_size: IDLE_SIZE.to_string(),
            total_size: IDLE_SIZE.to_string(),
            speed: IDLE_SPEED.to_string(),
            eta: UNKNOWN_ETA.to_string(),
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// The resolved format selector, once known.
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// Record the resolved selector. Only the first call has any effect.
    pub fn set_format(&mut self, selector: impl Into<String>) -> bool {
        if self.format.is_some() {
            return false;
        }
        self.format = Some(selector.into());
        true
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        self.status = JobStatus::Downloading;
        self.started_at = Some(now);
    }

    /// Fold a parsed progress line into the record.
    ///
    /// Returns `false` (and changes nothing) unless a worker is attached.
    /// Percentages never move backwards: a lower reading still refreshes
    /// speed, ETA and total but leaves progress and downloaded size alone.
    pub fn apply_progress(&mut self, update: &ProgressUpdate) -> bool {
        if !self.status.occupies_slot() {
            return false;
        }

        let percent = update.percent.clamp(0.0, 100.0);
        if percent >= self.progress {
            self.progress = percent;
            if let Some(downloaded) = &update.downloaded_size {
                self.downloaded_size.clone_from(downloaded);
            }
        }
        if let Some(total) = &update.total_size {
            self.total_size.clone_from(total);
        }
        if let Some(speed) = &update.speed {
            self.speed.clone_from(speed);
        }
        self.eta.clone_from(&update.eta);
        true
    }

    /// Worker exited with code 0.
    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.status = JobStatus::Completed;
        self.progress = 100.0;
        if self.total_size != IDLE_SIZE {
            self.downloaded_size.clone_from(&self.total_size);
        }
        self.eta = DONE_ETA.to_string();
        self.speed = IDLE_SPEED.to_string();
        self.completed_at = Some(now);
    }

    /// Worker failed; progress fields drop back to their idle forms.
    pub fn fail(&mut self, error: impl Into<String>, now: DateTime<Utc>) {
        self.status = JobStatus::Failed;
        self.progress = 0.0;
        self.speed = IDLE_SPEED.to_string();
        self.eta = UNKNOWN_ETA.to_string();
        self.error = Some(error.into());
        self.completed_at = Some(now);
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot_with_status(self.status)
    }

    /// Snapshot reporting a status other than the stored one (used for the
    /// final `cancelled` broadcast of a removed record).
    #[must_use]
    pub fn snapshot_with_status(&self, status: JobStatus) -> ProgressSnapshot {
        ProgressSnapshot {
            id: self.id.clone(),
            status,
            progress: self.progress,
            downloaded_size: self.downloaded_size.clone(),
            total_size: self.total_size.clone(),
            speed: self.speed.clone(),
            eta: self.eta.clone(),
            timestamp: Utc::now().timestamp_millis(),
            error: self.error.clone(),
        }
    }
}
