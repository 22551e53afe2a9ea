//! Queue scheduler.
//!
//! Owns the job index and the supervisor of every running job, admits
//! pending jobs into free slots, and publishes every state change.
//!
//! # Concurrency Model
//!
//! - The index lives behind one async mutex; every mutation goes through it
//! - Events are emitted while that lock is held, so observers see changes
//!   in the order they happened
//! - Supervisors commit through leased methods; commits carrying an old
//!   lease are dropped
//! - Lock order: queue → supervisors (consistent everywhere)

mod config;
mod supervisor;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use futures_util::future::join_all;

use fetchq_core::{
    ControlEvent, FetchBackend, Job, JobId, JobStatus, ProgressSnapshot, ProgressUpdate,
    QualityTier, QueueError, QueueEventEmitter, SourceId,
};

use crate::probe::ProbeRunner;
use crate::queue::{JobQueue, LeaseId, QueueStats, SubmitOutcome};

pub use config::{
    DEFAULT_DOWNLOADS_DIR, DEFAULT_FAILURE_RETENTION, DEFAULT_MAX_CONCURRENT,
    DEFAULT_SUCCESS_RETENTION, SchedulerConfig,
};
use supervisor::{Outcome, SupervisorHandle};

/// Point-in-time listing of the whole index.
#[derive(Debug, Clone)]
pub struct QueueListing {
    pub jobs: Vec<ProgressSnapshot>,
    pub stats: QueueStats,
}

/// The orchestration core: job index, admission and supervisors.
pub struct QueueScheduler {
    queue: tokio::sync::Mutex<JobQueue>,
    supervisors: Mutex<HashMap<JobId, SupervisorHandle>>,
    backend: Arc<dyn FetchBackend>,
    probe: ProbeRunner,
    emitter: Arc<dyn QueueEventEmitter>,
    config: SchedulerConfig,
}

impl QueueScheduler {
    pub fn new(
        backend: Arc<dyn FetchBackend>,
        emitter: Arc<dyn QueueEventEmitter>,
        config: SchedulerConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            queue: tokio::sync::Mutex::new(JobQueue::new(config.max_concurrent)),
            supervisors: Mutex::new(HashMap::new()),
            probe: ProbeRunner::new(Arc::clone(&backend)),
            backend,
            emitter,
            config,
        })
    }

    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Enqueue a job and admit it straight away if a slot is free.
    ///
    /// # Errors
    ///
    /// [`QueueError::AlreadyActive`] when a non-terminal job holds `id`.
    pub async fn submit(
        self: &Arc<Self>,
        id: JobId,
        source: SourceId,
        quality: QualityTier,
    ) -> Result<SubmitOutcome, QueueError> {
        let mut queue = self.queue.lock().await;
        let outcome = queue.submit(Job::new(id.clone(), source, quality)).inspect_err(|_| {
            tracing::debug!(target: "fetchq.queue", job_id = %id, "Rejected duplicate submission");
        })?;

        if outcome == SubmitOutcome::ReplacedStale {
            tracing::info!(target: "fetchq.queue", job_id = %id, "Purged stale record before requeue");
        }
        tracing::info!(target: "fetchq.queue", job_id = %id, tier = %quality, "Job queued");

        if let Some(job) = queue.get(&id) {
            self.emitter.emit(job.snapshot().into());
        }
        self.admit_locked(&mut queue);
        Ok(outcome)
    }

    /// Mark a running job paused. The worker is not signalled.
    pub async fn pause(&self, id: &JobId) -> bool {
        let mut queue = self.queue.lock().await;
        let Some(snapshot) = queue.pause(id) else {
            return false;
        };
        tracing::info!(target: "fetchq.queue", job_id = %id, "Job paused");
        self.emitter.emit(snapshot.into());
        true
    }

    pub async fn resume(&self, id: &JobId) -> bool {
        let mut queue = self.queue.lock().await;
        let Some(snapshot) = queue.resume(id) else {
            return false;
        };
        tracing::info!(target: "fetchq.queue", job_id = %id, "Job resumed");
        self.emitter.emit(snapshot.into());
        true
    }

    /// Pause every running job; returns how many changed.
    pub async fn pause_all(&self) -> usize {
        let mut queue = self.queue.lock().await;
        let snapshots = queue.pause_all();
        let count = snapshots.len();
        for snapshot in snapshots {
            self.emitter.emit(snapshot.into());
        }
        self.emitter.emit(ControlEvent::pause_all().into());
        tracing::info!(target: "fetchq.queue", count, "Paused all jobs");
        count
    }

    pub async fn resume_all(&self) -> usize {
        let mut queue = self.queue.lock().await;
        let snapshots = queue.resume_all();
        let count = snapshots.len();
        for snapshot in snapshots {
            self.emitter.emit(snapshot.into());
        }
        self.emitter.emit(ControlEvent::resume_all().into());
        tracing::info!(target: "fetchq.queue", count, "Resumed all jobs");
        count
    }

    /// Remove a job, stopping its worker if it has one.
    ///
    /// Unknown and terminal ids are a no-op (returns `false`).
    pub async fn cancel(self: &Arc<Self>, id: &JobId) -> bool {
        let (job, handle) = {
            let mut queue = self.queue.lock().await;
            if queue.get(id).is_none_or(|job| job.status.is_terminal()) {
                tracing::debug!(target: "fetchq.queue", job_id = %id, "Cancel ignored");
                return false;
            }
            let Some(job) = queue.remove(id) else {
                return false;
            };
            let handle = self.lock_supervisors().remove(id);
            // The worker keeps its slot until it has actually stopped.
            if handle.is_some() {
                queue.hold_slots(1);
            }
            (job, handle)
        };

        let held = handle.is_some();
        if let Some(handle) = handle {
            handle.stop().await;
        }

        let mut queue = self.queue.lock().await;
        if held {
            queue.release_slots(1);
        }
        tracing::info!(target: "fetchq.queue", job_id = %id, status = %job.status, "Job cancelled");
        self.emitter
            .emit(job.snapshot_with_status(JobStatus::Cancelled).into());
        self.admit_locked(&mut queue);
        true
    }

    /// Stop every worker and empty the index; returns the number of records removed.
    ///
    /// Jobs submitted while the workers stop stay pending until they are gone.
    pub async fn cleanup(self: &Arc<Self>) -> usize {
        let (cleared, handles) = {
            let mut queue = self.queue.lock().await;
            let handles: Vec<_> = self.lock_supervisors().drain().map(|(_, h)| h).collect();
            queue.hold_slots(handles.len());
            (queue.clear(), handles)
        };

        let stopped = handles.len();
        join_all(handles.into_iter().map(SupervisorHandle::stop)).await;

        let mut queue = self.queue.lock().await;
        queue.release_slots(stopped);
        tracing::info!(target: "fetchq.queue", cleared, stopped, "Queue cleaned up");
        self.emitter.emit(ControlEvent::cleanup(cleared).into());
        self.admit_locked(&mut queue);
        cleared
    }

    /// Every job in submission order, with aggregate counters.
    pub async fn list(&self) -> QueueListing {
        let queue = self.queue.lock().await;
        QueueListing {
            jobs: queue.snapshots(),
            stats: queue.stats(),
        }
    }

    pub async fn snapshot(&self, id: &JobId) -> Option<ProgressSnapshot> {
        self.queue.lock().await.get(id).map(Job::snapshot)
    }

    pub async fn stats(&self) -> QueueStats {
        self.queue.lock().await.stats()
    }

    /// Number of live supervisors.
    pub fn running(&self) -> usize {
        self.lock_supervisors().len()
    }

    // ------------------------------------------------------------------
    // Supervisor commits
    // ------------------------------------------------------------------

    async fn record_format(&self, id: &JobId, lease: LeaseId, selector: &str) {
        if self.queue.lock().await.record_format(id, lease, selector) {
            tracing::debug!(target: "fetchq.queue", job_id = %id, selector, "Format recorded");
        }
    }

    async fn record_progress(&self, id: &JobId, lease: LeaseId, update: &ProgressUpdate) {
        let mut queue = self.queue.lock().await;
        if let Some(snapshot) = queue.apply_progress(id, lease, update) {
            self.emitter.emit(snapshot.into());
        }
    }

    async fn finish(self: &Arc<Self>, id: &JobId, lease: LeaseId, outcome: Outcome) {
        let mut queue = self.queue.lock().await;

        let (snapshot, retention) = match outcome {
            Outcome::Completed => (queue.complete(id, lease), self.config.success_retention),
            Outcome::Failed(error) => {
                tracing::warn!(target: "fetchq.queue", job_id = %id, %error, "Job failed");
                (queue.fail(id, lease, error), self.config.failure_retention)
            }
            Outcome::Stopped => return,
        };
        let Some(snapshot) = snapshot else {
            tracing::debug!(target: "fetchq.queue", job_id = %id, "Ignoring stale finish (lease mismatch)");
            return;
        };

        tracing::info!(target: "fetchq.queue", job_id = %id, status = %snapshot.status, "Job finished");
        self.emitter.emit(snapshot.into());

        {
            let mut supervisors = self.lock_supervisors();
            if supervisors.get(id).is_some_and(|h| h.lease == lease) {
                supervisors.remove(id);
            }
        }

        self.schedule_eviction(id.clone(), lease, retention);
        self.admit_locked(&mut queue);
    }

    /// Start supervisors for whatever the queue admits.
    ///
    /// Called with the queue lock held so admission and registration are
    /// one step from every other caller's point of view.
    fn admit_locked(self: &Arc<Self>, queue: &mut JobQueue) {
        let admissions = queue.admit();
        if admissions.is_empty() {
            return;
        }

        let mut supervisors = self.lock_supervisors();
        for admission in admissions {
            tracing::info!(
                target: "fetchq.queue",
                job_id = %admission.id,
                tier = %admission.quality,
                "Job admitted"
            );
            self.emitter.emit(admission.snapshot.clone().into());
            let id = admission.id.clone();
            supervisors.insert(id, supervisor::spawn(Arc::clone(self), admission));
        }
    }

    fn schedule_eviction(self: &Arc<Self>, id: JobId, lease: LeaseId, after: Duration) {
        let scheduler: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let Some(scheduler) = scheduler.upgrade() else {
                return;
            };
            if scheduler.queue.lock().await.evict(&id, lease) {
                tracing::debug!(target: "fetchq.queue", job_id = %id, "Evicted terminal record");
            }
        });
    }

    fn lock_supervisors(&self) -> std::sync::MutexGuard<'_, HashMap<JobId, SupervisorHandle>> {
        self.supervisors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
