//! `get` - run one job through a local scheduler with a terminal progress bar.
//!
//! Uses the same scheduler and supervisor as the HTTP server; only the
//! event sink differs. Ctrl+C cancels the job and stops the worker.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::oneshot;

use fetchq_core::{
    FetchBackend, JobId, JobStatus, ProgressSnapshot, QualityTier, QueueEvent, QueueEventEmitter,
    SourceId,
};
use fetchq_download::{QueueScheduler, SchedulerConfig};

use super::parse_source;
use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext, source: &str, tier: QualityTier) -> Result<()> {
    let source = parse_source(source)?;
    let downloads_dir = ctx.config.scheduler.downloads_dir.clone();
    let bar = progress_bar();

    println!("Downloading {} at {tier}", source.url());
    let interrupt = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let snapshot = run_job(
        ctx.backend.clone(),
        ctx.config.scheduler.clone(),
        source,
        tier,
        &bar,
        interrupt,
    )
    .await?;

    println!(
        "✓ Completed {} ({}) into {}",
        snapshot.id,
        snapshot.total_size,
        downloads_dir.display()
    );
    Ok(())
}

/// Submit one job and wait for its terminal snapshot.
///
/// `interrupt` resolving first cancels the job.
pub async fn run_job<F>(
    backend: Arc<dyn FetchBackend>,
    config: SchedulerConfig,
    source: SourceId,
    tier: QualityTier,
    bar: &ProgressBar,
    interrupt: F,
) -> Result<ProgressSnapshot, CliError>
where
    F: Future<Output = ()>,
{
    let id = JobId::derive(&source, tier, Utc::now().timestamp_millis());
    let (done_tx, done_rx) = oneshot::channel();
    let emitter = Arc::new(TerminalEmitter::new(id.clone(), bar.clone(), done_tx));
    let scheduler = QueueScheduler::new(backend, emitter, config);

    scheduler.submit(id.clone(), source, tier).await?;

    let outcome = tokio::select! {
        done = done_rx => done.map_err(|_| CliError::Io("scheduler stopped before the job finished".into())),
        () = interrupt => {
            scheduler.cancel(&id).await;
            bar.abandon_with_message("cancelled");
            Err(CliError::Interrupted)
        }
    };
    scheduler.cleanup().await;

    let snapshot = outcome?;
    match snapshot.status {
        JobStatus::Completed => Ok(snapshot),
        JobStatus::Cancelled => Err(CliError::Interrupted),
        _ => Err(CliError::JobFailed(
            snapshot.error.clone().unwrap_or_else(|| "worker failed".to_string()),
        )),
    }
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(PERCENT_SCALE);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% {msg}")
    {
        bar.set_style(style.progress_chars("█▓░"));
    }
    bar
}

const PERCENT_SCALE: u64 = 1000;

/// Feeds one job's snapshots into a progress bar and reports its end.
struct TerminalEmitter {
    job: JobId,
    bar: ProgressBar,
    done: Mutex<Option<oneshot::Sender<ProgressSnapshot>>>,
}

impl TerminalEmitter {
    fn new(job: JobId, bar: ProgressBar, done: oneshot::Sender<ProgressSnapshot>) -> Self {
        Self {
            job,
            bar,
            done: Mutex::new(Some(done)),
        }
    }

    fn finish(&self, snapshot: ProgressSnapshot) {
        match snapshot.status {
            JobStatus::Completed => self.bar.finish_with_message("done"),
            JobStatus::Failed => self.bar.abandon_with_message("failed"),
            _ => self.bar.abandon(),
        }
        let sender = self
            .done
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sender) = sender {
            let _ = sender.send(snapshot);
        }
    }
}

impl QueueEventEmitter for TerminalEmitter {
    fn emit(&self, event: QueueEvent) {
        let QueueEvent::Progress(snapshot) = event else {
            return;
        };
        if snapshot.id != self.job {
            return;
        }

        if snapshot.status.is_terminal() {
            self.finish(snapshot);
            return;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let position = (snapshot.progress.clamp(0.0, 100.0) * 10.0).round() as u64;
        self.bar.set_position(position);
        self.bar.set_message(format!(
            "{} of {} at {} ETA {} ({})",
            snapshot.downloaded_size, snapshot.total_size, snapshot.speed, snapshot.eta, snapshot.status
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::pending;

    use fetchq_core::ProbeOutput;
    use fetchq_download::testing::{AutoWorker, ScriptedBackend};

    const OUTPUT: &str = "[download]  42.0% of 1.00MiB at 512.00KiB/s ETA 00:01\n\
[download] 100% of 1.00MiB in 00:02\n";

    fn config(dir: &tempfile::TempDir) -> SchedulerConfig {
        SchedulerConfig::default().with_downloads_dir(dir.path())
    }

    fn source() -> SourceId {
        SourceId::parse("abc123").unwrap()
    }

    #[tokio::test]
    async fn completed_job_returns_final_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend::new().with_auto_worker(AutoWorker::new(OUTPUT, 0)));
        let bar = ProgressBar::hidden();

        let snapshot = run_job(backend.clone(), config(&dir), source(), QualityTier::P720, &bar, pending())
            .await
            .unwrap();

        assert_eq!(snapshot.status, JobStatus::Completed);
        assert!((snapshot.progress - 100.0).abs() < f64::EPSILON);
        assert!(snapshot.id.as_str().starts_with("abc123_720_"));
        assert_eq!(backend.transfer_requests().len(), 1);
        assert!(bar.is_finished());
    }

    #[tokio::test]
    async fn failed_worker_maps_to_job_failed() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend::new().with_auto_worker(
            AutoWorker::new("", 1).with_stderr("ERROR: Video unavailable\n"),
        ));

        let err = run_job(backend, config(&dir), source(), QualityTier::P480, &ProgressBar::hidden(), pending())
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("Video unavailable"));
    }

    #[tokio::test]
    async fn no_viable_format_fails_the_job() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend::new().with_probe(|_| None::<ProbeOutput>));

        let err = run_job(backend, config(&dir), source(), QualityTier::P1080, &ProgressBar::hidden(), pending())
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::JobFailed(_)));
    }

    #[tokio::test]
    async fn interrupt_cancels_and_stops_the_worker() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend::new());
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let run = tokio::spawn({
            let backend = backend.clone();
            let dir = dir.path().to_path_buf();
            async move {
                let config = SchedulerConfig::default().with_downloads_dir(dir);
                run_job(backend, config, source(), QualityTier::P720, &ProgressBar::hidden(), async {
                    let _ = stop_rx.await;
                })
                .await
            }
        });

        let mut worker = backend.next_worker().await;
        worker.emit("[download]  10.0% of 1.00MiB at 1.00MiB/s ETA 00:01").await;
        stop_tx.send(()).unwrap();

        let err = run.await.unwrap().unwrap_err();
        assert!(matches!(err, CliError::Interrupted));
        assert_eq!(backend.shutdown_count(), 1);
    }
}
