//! Fetch backend port.
//!
//! Abstracts the external fetch binary behind its two uses: a metadata-only
//! probe for one format selector, and a transfer worker whose stdout carries
//! either progress text or the media bytes themselves.

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::job::QueueError;

/// What a successful probe reported for one selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutput {
    /// Name the worker would give the output file.
    pub filename: String,
    /// Exact size in bytes, when the source advertises one.
    pub size_bytes: Option<u64>,
}

/// Where a transfer worker writes the media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferTarget {
    /// Write to disk using the given output template; stdout carries
    /// progress lines.
    File { template: PathBuf },
    /// Write media bytes to stdout.
    Stdout,
}

/// Everything needed to launch one transfer worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub url: String,
    pub selector: String,
    pub target: TransferTarget,
}

/// How a worker process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerExit {
    /// Exit code; `None` when terminated by a signal.
    pub code: Option<i32>,
}

impl WorkerExit {
    #[must_use]
    pub const fn success(self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Control over a spawned worker.
#[async_trait]
pub trait WorkerChild: Send {
    /// OS process id, if still known.
    fn pid(&self) -> Option<u32>;

    /// Wait for the worker to exit on its own.
    async fn wait(&mut self) -> io::Result<WorkerExit>;

    /// Terminate the worker and reap it.
    async fn shutdown(&mut self) -> io::Result<WorkerExit>;
}

/// A running worker with its output streams detached.
///
/// Dropping this kills the worker.
pub struct WorkerProcess {
    pub stdout: Box<dyn AsyncRead + Send + Unpin>,
    pub stderr: Box<dyn AsyncRead + Send + Unpin>,
    pub child: Box<dyn WorkerChild>,
}

impl std::fmt::Debug for WorkerProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerProcess")
            .field("pid", &self.child.pid())
            .finish_non_exhaustive()
    }
}

/// Port for the external fetch binary.
#[async_trait]
pub trait FetchBackend: Send + Sync {
    /// Run a metadata-only pass for `selector`.
    ///
    /// Fails when the worker exits non-zero or cannot be started.
    async fn probe(&self, url: &str, selector: &str) -> Result<ProbeOutput, QueueError>;

    /// Spawn a transfer worker.
    async fn spawn_transfer(&self, request: &TransferRequest) -> Result<WorkerProcess, QueueError>;
}
