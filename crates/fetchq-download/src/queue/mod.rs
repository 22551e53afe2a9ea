//! Job queue management.
//!
//! This module provides a pure state machine for the job index. No I/O is
//! performed here; the orchestrator (`QueueScheduler`) handles I/O.
//!
//! # Design
//!
//! - Pure synchronous state machine (no async, no IO, no tracing)
//! - Commands return the snapshots the caller should broadcast
//! - Insertion order is admission order (FIFO over `pending`)
//!
//! # Slot Semantics
//!
//! A job occupies a slot while `downloading` or `paused`: a paused job's
//! worker keeps running, so letting it release the slot would exceed the cap.
//! A removed job whose worker is still shutting down keeps its slot through
//! [`JobQueue::hold_slots`] until the caller releases it.

#![allow(clippy::cast_precision_loss)]

mod types;

use chrono::Utc;
use indexmap::IndexMap;

use fetchq_core::{Job, JobId, JobStatus, ProgressSnapshot, ProgressUpdate, QueueError};

pub use types::{Admission, LeaseId, QueueStats, SubmitOutcome};
use types::QueuedJob;

/// Owns every job record, keyed by id in submission order.
///
/// This is a sync type with no internal locking; the caller
/// (`QueueScheduler`) is responsible for synchronization.
#[derive(Debug)]
pub struct JobQueue {
    jobs: IndexMap<JobId, QueuedJob>,
    max_concurrent: usize,
    next_lease: u64,
    /// Slots still held by workers of removed jobs.
    stopping: usize,
}

impl JobQueue {
    /// Create a queue that runs at most `max_concurrent` jobs at once.
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            jobs: IndexMap::new(),
            max_concurrent: max_concurrent.max(1),
            next_lease: 0,
            stopping: 0,
        }
    }

    pub const fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn get(&self, id: &JobId) -> Option<&Job> {
        self.jobs.get(id).map(|entry| &entry.job)
    }

    pub fn lease_of(&self, id: &JobId) -> Option<LeaseId> {
        self.jobs.get(id).map(|entry| entry.lease)
    }

    /// Number of slots in use, stopping workers included.
    pub fn occupied_slots(&self) -> usize {
        self.stopping
            + self
                .jobs
                .values()
                .filter(|entry| entry.job.status.occupies_slot())
                .count()
    }

    /// Keep `count` slots taken after their records were removed.
    pub fn hold_slots(&mut self, count: usize) {
        self.stopping += count;
    }

    /// Give back slots taken with [`JobQueue::hold_slots`].
    pub fn release_slots(&mut self, count: usize) {
        self.stopping = self.stopping.saturating_sub(count);
    }

    /// Add a new pending job.
    ///
    /// A live record under the same id is a conflict. A terminal one is
    /// purged and the insert retried once.
    pub fn submit(&mut self, job: Job) -> Result<SubmitOutcome, QueueError> {
        let mut outcome = SubmitOutcome::Inserted;

        for _attempt in 0..2 {
            match self.jobs.get(&job.id).map(|entry| entry.job.status) {
                None => {
                    let lease = self.mint_lease();
                    self.jobs.insert(job.id.clone(), QueuedJob { job, lease });
                    return Ok(outcome);
                }
                Some(status) if status.is_terminal() => {
                    self.jobs.shift_remove(&job.id);
                    outcome = SubmitOutcome::ReplacedStale;
                }
                Some(_) => break,
            }
        }

        Err(QueueError::already_active(job.id.to_string()))
    }

    /// Move pending jobs into free slots, oldest first.
    pub fn admit(&mut self) -> Vec<Admission> {
        let mut free = self.max_concurrent.saturating_sub(self.occupied_slots());
        let mut admitted = Vec::new();
        if free == 0 {
            return admitted;
        }

        let now = Utc::now();
        for entry in self.jobs.values_mut() {
            if free == 0 {
                break;
            }
            if entry.job.status != JobStatus::Pending {
                continue;
            }
            entry.job.start(now);
            free -= 1;
            admitted.push(Admission {
                id: entry.job.id.clone(),
                lease: entry.lease,
                source: entry.job.source.clone(),
                quality: entry.job.quality,
                snapshot: entry.job.snapshot(),
            });
        }
        admitted
    }

    /// Record the resolved selector for a running job.
    pub fn record_format(&mut self, id: &JobId, lease: LeaseId, selector: &str) -> bool {
        self.leased_mut(id, lease)
            .is_some_and(|job| job.set_format(selector))
    }

    /// Apply one parsed progress line; returns the snapshot to broadcast.
    pub fn apply_progress(
        &mut self,
        id: &JobId,
        lease: LeaseId,
        update: &ProgressUpdate,
    ) -> Option<ProgressSnapshot> {
        let job = self.leased_mut(id, lease)?;
        job.apply_progress(update).then(|| job.snapshot())
    }

    /// Worker exited with code 0.
    pub fn complete(&mut self, id: &JobId, lease: LeaseId) -> Option<ProgressSnapshot> {
        let job = self.leased_mut(id, lease)?;
        if job.status.is_terminal() {
            return None;
        }
        job.complete(Utc::now());
        Some(job.snapshot())
    }

    /// Worker failed, could not start, or no format was viable.
    pub fn fail(
        &mut self,
        id: &JobId,
        lease: LeaseId,
        error: impl Into<String>,
    ) -> Option<ProgressSnapshot> {
        let job = self.leased_mut(id, lease)?;
        if job.status.is_terminal() {
            return None;
        }
        job.fail(error, Utc::now());
        Some(job.snapshot())
    }

    /// `downloading -> paused`. Anything else is a no-op.
    pub fn pause(&mut self, id: &JobId) -> Option<ProgressSnapshot> {
        self.toggle(id, JobStatus::Downloading, JobStatus::Paused)
    }

    /// `paused -> downloading`. Anything else is a no-op.
    pub fn resume(&mut self, id: &JobId) -> Option<ProgressSnapshot> {
        self.toggle(id, JobStatus::Paused, JobStatus::Downloading)
    }

    pub fn pause_all(&mut self) -> Vec<ProgressSnapshot> {
        self.toggle_all(JobStatus::Downloading, JobStatus::Paused)
    }

    pub fn resume_all(&mut self) -> Vec<ProgressSnapshot> {
        self.toggle_all(JobStatus::Paused, JobStatus::Downloading)
    }

    /// Remove a record regardless of status.
    pub fn remove(&mut self, id: &JobId) -> Option<Job> {
        self.jobs.shift_remove(id).map(|entry| entry.job)
    }

    /// Drop a terminal record once its retention period is over.
    ///
    /// Ignored if the id has since been reused.
    pub fn evict(&mut self, id: &JobId, lease: LeaseId) -> bool {
        let expired = self
            .jobs
            .get(id)
            .is_some_and(|entry| entry.lease == lease && entry.job.status.is_terminal());
        if expired {
            self.jobs.shift_remove(id);
        }
        expired
    }

    /// Remove every record; returns how many there were. Held slots stay held.
    pub fn clear(&mut self) -> usize {
        let count = self.jobs.len();
        self.jobs.clear();
        count
    }

    /// Snapshots of every job in submission order.
    pub fn snapshots(&self) -> Vec<ProgressSnapshot> {
        self.jobs.values().map(|entry| entry.job.snapshot()).collect()
    }

    pub fn stats(&self) -> QueueStats {
        let count = |status| {
            self.jobs
                .values()
                .filter(|entry| entry.job.status == status)
                .count()
        };
        let total_progress = if self.jobs.is_empty() {
            0.0
        } else {
            self.jobs.values().map(|entry| entry.job.progress).sum::<f64>()
                / self.jobs.len() as f64
        };

        QueueStats {
            active: count(JobStatus::Downloading),
            pending: count(JobStatus::Pending),
            paused: count(JobStatus::Paused),
            total_progress,
        }
    }

    fn mint_lease(&mut self) -> LeaseId {
        self.next_lease += 1;
        LeaseId(self.next_lease)
    }

    fn leased_mut(&mut self, id: &JobId, lease: LeaseId) -> Option<&mut Job> {
        self.jobs
            .get_mut(id)
            .filter(|entry| entry.lease == lease)
            .map(|entry| &mut entry.job)
    }

    fn toggle(&mut self, id: &JobId, from: JobStatus, to: JobStatus) -> Option<ProgressSnapshot> {
        let job = &mut self.jobs.get_mut(id)?.job;
        if job.status != from {
            return None;
        }
        job.status = to;
        Some(job.snapshot())
    }

    fn toggle_all(&mut self, from: JobStatus, to: JobStatus) -> Vec<ProgressSnapshot> {
        self.jobs
            .values_mut()
            .filter(|entry| entry.job.status == from)
            .map(|entry| {
                entry.job.status = to;
                entry.job.snapshot()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetchq_core::{QualityTier, SourceId};

    fn job(id: &str) -> Job {
        Job::new(
            JobId::new(id),
            SourceId::parse("src").unwrap(),
            QualityTier::P720,
        )
    }

    fn id(s: &str) -> JobId {
        JobId::new(s)
    }

    #[test]
    fn first_submission_is_admitted_immediately() {
        let mut queue = JobQueue::new(1);
        assert_eq!(queue.submit(job("a")).unwrap(), SubmitOutcome::Inserted);

        let admitted = queue.admit();
        assert_eq!(admitted.len(), 1);
        assert_eq!(admitted[0].snapshot.status, JobStatus::Downloading);
        assert!(queue.get(&id("a")).unwrap().started_at.is_some());
        assert!(queue.admit().is_empty());
    }

    #[test]
    fn second_job_waits_for_the_slot() {
        let mut queue = JobQueue::new(1);
        queue.submit(job("a")).unwrap();
        let a = queue.admit().remove(0);
        queue.submit(job("b")).unwrap();

        assert!(queue.admit().is_empty());
        assert_eq!(queue.get(&id("b")).unwrap().status, JobStatus::Pending);

        queue.complete(&a.id, a.lease).unwrap();
        let next = queue.admit();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].id, id("b"));
    }

    #[test]
    fn admission_is_fifo_up_to_the_cap() {
        let mut queue = JobQueue::new(2);
        for name in ["a", "b", "c"] {
            queue.submit(job(name)).unwrap();
        }
        let ids: Vec<_> = queue.admit().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![id("a"), id("b")]);
        assert_eq!(queue.stats().pending, 1);
    }

    #[test]
    fn paused_job_keeps_its_slot() {
        let mut queue = JobQueue::new(1);
        queue.submit(job("a")).unwrap();
        queue.admit();
        queue.pause(&id("a")).unwrap();
        queue.submit(job("b")).unwrap();

        assert!(queue.admit().is_empty());
        assert_eq!(queue.occupied_slots(), 1);
    }

    #[test]
    fn held_slot_blocks_admission_until_released() {
        let mut queue = JobQueue::new(1);
        queue.submit(job("a")).unwrap();
        queue.admit();
        queue.remove(&id("a")).unwrap();
        queue.hold_slots(1);
        queue.submit(job("b")).unwrap();

        assert!(queue.admit().is_empty());
        assert_eq!(queue.clear(), 1);
        assert_eq!(queue.occupied_slots(), 1);

        queue.submit(job("c")).unwrap();
        queue.release_slots(1);
        let admitted = queue.admit();
        assert_eq!(admitted.len(), 1);
        assert_eq!(admitted[0].id, id("c"));
    }

    #[test]
    fn live_duplicate_is_rejected() {
        let mut queue = JobQueue::new(1);
        queue.submit(job("a")).unwrap();
        queue.admit();

        let err = queue.submit(job("a")).unwrap_err();
        assert!(matches!(err, QueueError::AlreadyActive { .. }));
    }

    #[test]
    fn pending_duplicate_is_rejected() {
        let mut queue = JobQueue::new(1);
        queue.submit(job("busy")).unwrap();
        queue.admit();
        queue.submit(job("a")).unwrap();
        assert!(queue.submit(job("a")).is_err());
    }

    #[test]
    fn terminal_duplicate_is_purged_and_replaced() {
        let mut queue = JobQueue::new(1);
        queue.submit(job("a")).unwrap();
        let first = queue.admit().remove(0);
        queue.fail(&first.id, first.lease, "boom").unwrap();

        assert_eq!(queue.submit(job("a")).unwrap(), SubmitOutcome::ReplacedStale);
        let job = queue.get(&id("a")).unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.error.is_none());
        assert_ne!(queue.lease_of(&id("a")), Some(first.lease));
    }

    #[test]
    fn stale_lease_cannot_touch_replacement() {
        let mut queue = JobQueue::new(1);
        queue.submit(job("a")).unwrap();
        let old = queue.admit().remove(0);
        queue.complete(&old.id, old.lease).unwrap();
        queue.submit(job("a")).unwrap();

        assert!(!queue.evict(&old.id, old.lease));
        assert!(queue.complete(&old.id, old.lease).is_none());
        assert!(
            queue
                .apply_progress(&old.id, old.lease, &ProgressUpdate::percent_only(5.0))
                .is_none()
        );
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn eviction_only_applies_to_terminal_records() {
        let mut queue = JobQueue::new(1);
        queue.submit(job("a")).unwrap();
        let a = queue.admit().remove(0);

        assert!(!queue.evict(&a.id, a.lease));
        queue.complete(&a.id, a.lease);
        assert!(queue.evict(&a.id, a.lease));
        assert!(queue.is_empty());
    }

    #[test]
    fn pause_and_resume_only_toggle_matching_states() {
        let mut queue = JobQueue::new(1);
        queue.submit(job("a")).unwrap();
        queue.submit(job("b")).unwrap();
        queue.admit();

        assert!(queue.resume(&id("a")).is_none());
        assert!(queue.pause(&id("b")).is_none());
        assert!(queue.pause(&id("missing")).is_none());

        assert_eq!(queue.pause(&id("a")).unwrap().status, JobStatus::Paused);
        assert_eq!(queue.resume(&id("a")).unwrap().status, JobStatus::Downloading);
    }

    #[test]
    fn bulk_pause_and_resume() {
        let mut queue = JobQueue::new(2);
        for name in ["a", "b", "c"] {
            queue.submit(job(name)).unwrap();
        }
        queue.admit();

        assert_eq!(queue.pause_all().len(), 2);
        assert_eq!(queue.stats().paused, 2);
        assert_eq!(queue.resume_all().len(), 2);
        assert_eq!(queue.stats().active, 2);
    }

    #[test]
    fn progress_only_reaches_leased_running_jobs() {
        let mut queue = JobQueue::new(1);
        queue.submit(job("a")).unwrap();
        queue.submit(job("b")).unwrap();
        let a = queue.admit().remove(0);
        let b_lease = queue.lease_of(&id("b")).unwrap();

        let update = ProgressUpdate::percent_only(30.0);
        assert!(queue.apply_progress(&id("b"), b_lease, &update).is_none());
        let snapshot = queue.apply_progress(&a.id, a.lease, &update).unwrap();
        assert!((snapshot.progress - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn format_is_recorded_once() {
        let mut queue = JobQueue::new(1);
        queue.submit(job("a")).unwrap();
        let a = queue.admit().remove(0);

        assert!(queue.record_format(&a.id, a.lease, "best[height<=720]"));
        assert!(!queue.record_format(&a.id, a.lease, "worst"));
        assert_eq!(queue.get(&a.id).unwrap().format(), Some("best[height<=720]"));
    }

    #[test]
    fn stats_average_progress_over_all_jobs() {
        let mut queue = JobQueue::new(1);
        assert!(queue.stats().total_progress.abs() < f64::EPSILON);

        queue.submit(job("a")).unwrap();
        queue.submit(job("b")).unwrap();
        let a = queue.admit().remove(0);
        queue.apply_progress(&a.id, a.lease, &ProgressUpdate::percent_only(50.0));

        let stats = queue.stats();
        assert_eq!(stats.active, 1);
        assert_eq!(stats.pending, 1);
        assert!((stats.total_progress - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn remove_and_clear() {
        let mut queue = JobQueue::new(1);
        queue.submit(job("a")).unwrap();
        queue.submit(job("b")).unwrap();

        assert!(queue.remove(&id("a")).is_some());
        assert!(queue.remove(&id("a")).is_none());
        assert_eq!(queue.clear(), 1);
        assert!(queue.is_empty());
    }
}
