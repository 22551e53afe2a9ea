//! Job supervisor.
//!
//! One task per admitted job: resolve the format, spawn the worker, fold its
//! stdout into the record, and report how it ended. The task never touches
//! the queue directly; it goes through the scheduler's leased commit methods,
//! so a cancelled or replaced job cannot be written to by a late supervisor.

use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use fetchq_core::{JobId, QueueError, TransferRequest, TransferTarget, WorkerChild, WorkerProcess};

use super::QueueScheduler;
use crate::progress::{ProgressParser, stderr_tail};
use crate::queue::{Admission, LeaseId};

/// Stdout read size.
const READ_BUF: usize = 8 * 1024;

/// How a supervised run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Outcome {
    Completed,
    Failed(String),
    /// Stopped on request; the caller already dealt with the record.
    Stopped,
}

/// Scheduler-side handle to a running supervisor.
#[derive(Debug)]
pub(super) struct SupervisorHandle {
    pub lease: LeaseId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SupervisorHandle {
    /// Stop the worker and wait for the task to wind down.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            if e.is_panic() {
                tracing::warn!(target: "fetchq.worker", "Supervisor task panicked during stop");
            }
        }
    }
}

/// Spawn the supervisor task for a freshly admitted job.
pub(super) fn spawn(scheduler: Arc<QueueScheduler>, admission: Admission) -> SupervisorHandle {
    let cancel = CancellationToken::new();
    let lease = admission.lease;
    let task = tokio::spawn(supervise(scheduler, admission, cancel.clone()));
    SupervisorHandle {
        lease,
        cancel,
        task,
    }
}

async fn supervise(scheduler: Arc<QueueScheduler>, admission: Admission, cancel: CancellationToken) {
    let outcome = match run(&scheduler, &admission, &cancel).await {
        Ok(outcome) => outcome,
        Err(e) => Outcome::Failed(e.user_message()),
    };

    if outcome == Outcome::Stopped {
        tracing::debug!(target: "fetchq.worker", job_id = %admission.id, "Supervisor stopped");
        return;
    }
    scheduler.finish(&admission.id, admission.lease, outcome).await;
}

async fn run(
    scheduler: &QueueScheduler,
    admission: &Admission,
    cancel: &CancellationToken,
) -> Result<Outcome, QueueError> {
    let id = &admission.id;
    let lease = admission.lease;
    let url = admission.source.url();

    let resolved = tokio::select! {
        biased;
        () = cancel.cancelled() => return Ok(Outcome::Stopped),
        resolved = scheduler.probe.resolve(&url, admission.quality) => resolved?,
    };
    scheduler
        .record_format(id, lease, resolved.selector())
        .await;

    let dir = &scheduler.config.downloads_dir;
    tokio::fs::create_dir_all(dir).await?;

    let request = TransferRequest {
        url,
        selector: resolved.selector().to_string(),
        target: TransferTarget::File {
            template: dir.join(output_template(id, admission.quality.height())),
        },
    };
    let WorkerProcess {
        mut stdout,
        stderr,
        mut child,
    } = scheduler.backend.spawn_transfer(&request).await?;

    tracing::info!(
        target: "fetchq.worker",
        job_id = %id,
        selector = %request.selector,
        pid = ?child.pid(),
        "Worker started"
    );

    let tail = tokio::spawn(stderr_tail(stderr, id.to_string()));
    let mut parser = ProgressParser::new();
    let mut buf = vec![0u8; READ_BUF];

    loop {
        let read = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                stop_worker(child.as_mut(), id).await;
                tail.abort();
                return Ok(Outcome::Stopped);
            }
            read = stdout.read(&mut buf) => read,
        };

        match read {
            Ok(0) => break,
            Ok(n) => {
                for update in parser.feed(&buf[..n]) {
                    scheduler.record_progress(id, lease, &update).await;
                }
            }
            Err(e) => {
                tracing::warn!(target: "fetchq.worker", job_id = %id, error = %e, "Worker stdout read failed");
                break;
            }
        }
    }
    if let Some(update) = parser.finish() {
        scheduler.record_progress(id, lease, &update).await;
    }

    let exit = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            stop_worker(child.as_mut(), id).await;
            tail.abort();
            return Ok(Outcome::Stopped);
        }
        exit = child.wait() => exit?,
    };
    let detail = tail.await.unwrap_or_default();

    if exit.success() {
        Ok(Outcome::Completed)
    } else {
        Ok(Outcome::Failed(
            QueueError::worker_exit(exit.code, detail).user_message(),
        ))
    }
}

/// `%(title)s_720p_{job}.%(ext)s`: title for readability, job id so that
/// concurrent jobs sharing the directory never collide.
fn output_template(id: &JobId, height: u32) -> String {
    format!("%(title)s_{height}p_{}.%(ext)s", id.file_safe())
}

async fn stop_worker(child: &mut dyn WorkerChild, id: &JobId) {
    match child.shutdown().await {
        Ok(exit) => {
            tracing::info!(target: "fetchq.worker", job_id = %id, code = ?exit.code, "Worker stopped");
        }
        Err(e) => {
            tracing::warn!(target: "fetchq.worker", job_id = %id, error = %e, "Failed to stop worker");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_embeds_tier_and_file_safe_id() {
        let template = output_template(&JobId::new("abc_720_1700000000000"), 720);
        assert!(template.starts_with("%(title)s_720p_"));
        assert!(template.ends_with(".%(ext)s"));
    }
}
