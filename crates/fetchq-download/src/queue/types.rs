//! Queue entry types (internal implementation).

use serde::Serialize;

use fetchq_core::{Job, JobId, ProgressSnapshot, QualityTier, SourceId};

/// Generation tag for one occupancy of a job id.
///
/// Delayed work (eviction timers, supervisor commits) carries the lease it
/// was issued under and is ignored once the record has been replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LeaseId(pub(crate) u64);

/// A job record together with its current lease.
#[derive(Debug, Clone)]
pub(crate) struct QueuedJob {
    pub job: Job,
    pub lease: LeaseId,
}

/// How a submission was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// No record existed under the id.
    Inserted,
    /// A terminal record under the same id was purged first.
    ReplacedStale,
}

/// A job that was just moved into a slot.
#[derive(Debug, Clone)]
pub struct Admission {
    pub id: JobId,
    pub lease: LeaseId,
    pub source: SourceId,
    pub quality: QualityTier,
    pub snapshot: ProgressSnapshot,
}

/// Aggregate counters over the whole index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    /// Jobs in `downloading`.
    pub active: usize,
    pub pending: usize,
    pub paused: usize,
    /// Mean progress over every listed job; 0 for an empty index.
    pub total_progress: f64,
}
