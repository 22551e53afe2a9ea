//! Download orchestration for fetchq.
//!
//! - `progress` - worker stdout to progress updates
//! - `probe` - format resolution and exact size probing
//! - `queue` - the pure job index state machine
//! - `scheduler` - admission, job supervisors and event publication
//! - `transfer` - direct (unqueued) streaming transfers
//!
//! Everything here reaches the worker binary through
//! [`fetchq_core::FetchBackend`]; no process is spawned directly.

// Re-export core types for convenience
pub use fetchq_core::{
    JobId, JobStatus, ProgressSnapshot, ProgressUpdate, QualityTier, QueueError, SourceId,
};

pub mod progress;

mod probe;
pub use probe::{ProbeRunner, ResolvedFormat, SizeReport, TierSize};

mod queue;
pub use queue::{JobQueue, LeaseId, QueueStats, SubmitOutcome};

mod scheduler;
pub use scheduler::{
    DEFAULT_DOWNLOADS_DIR, DEFAULT_FAILURE_RETENTION, DEFAULT_MAX_CONCURRENT,
    DEFAULT_SUCCESS_RETENTION, QueueListing, QueueScheduler, SchedulerConfig,
};

mod transfer;
pub use transfer::{DirectTransfer, PreparedTransfer, TransferBody};

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
