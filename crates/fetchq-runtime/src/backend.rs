//! `yt-dlp` implementation of [`FetchBackend`].

use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, warn};

use fetchq_core::{
    FetchBackend, ProbeOutput, QueueError, TransferRequest, TransferTarget, WorkerChild,
    WorkerExit, WorkerProcess,
};

use crate::command::{
    parse_probe_output, probe_args, resolve_worker_binary, stream_args, transfer_args,
};
use crate::config::WorkerConfig;
use crate::error::RuntimeError;
use crate::process::shutdown_child;

/// Runs the worker binary as a child process.
#[derive(Debug, Clone)]
pub struct YtDlpBackend {
    config: WorkerConfig,
}

impl YtDlpBackend {
    /// Use `config.binary` exactly as given.
    #[must_use]
    pub const fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    /// Resolve `config.binary` against `PATH` first, so a missing worker
    /// shows up at startup instead of on the first job.
    pub fn locate(mut config: WorkerConfig) -> Result<Self, RuntimeError> {
        config.binary = resolve_worker_binary(&config.binary)?;
        debug!(target: "fetchq.worker", binary = %config.binary.display(), "Worker binary located");
        Ok(Self { config })
    }

    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.config.binary
    }

    #[must_use]
    pub const fn config(&self) -> &WorkerConfig {
        &self.config
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.config.binary);
        cmd.stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, err: &io::Error) -> QueueError {
        QueueError::worker_spawn(format!("{}: {err}", self.config.binary.display()))
    }
}

#[async_trait]
impl FetchBackend for YtDlpBackend {
    async fn probe(&self, url: &str, selector: &str) -> Result<ProbeOutput, QueueError> {
        let mut cmd = self.command();
        cmd.args(probe_args(url, selector, &self.config.user_agent));

        let output = match timeout(self.config.probe_timeout, cmd.output()).await {
            Ok(result) => result.map_err(|e| self.spawn_error(&e))?,
            Err(_) => {
                // kill_on_drop reaps the abandoned probe
                warn!(target: "fetchq.probe", selector, "Probe timed out");
                return Err(QueueError::worker_exit(None, "probe timed out"));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr
                .lines()
                .rev()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .unwrap_or_default();
            return Err(QueueError::worker_exit(output.status.code(), detail));
        }

        Ok(parse_probe_output(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn spawn_transfer(&self, request: &TransferRequest) -> Result<WorkerProcess, QueueError> {
        let args = match &request.target {
            TransferTarget::File { template } => {
                transfer_args(&request.url, &request.selector, template)
            }
            TransferTarget::Stdout => stream_args(&request.url, &request.selector),
        };

        let mut child = self
            .command()
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(&e))?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(QueueError::worker_spawn("worker pipes unavailable"));
        };

        debug!(
            target: "fetchq.worker",
            pid = ?child.id(),
            selector = %request.selector,
            "Worker spawned"
        );

        Ok(WorkerProcess {
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            child: Box::new(ManagedChild::new(child, self.config.shutdown_grace)),
        })
    }
}

/// A spawned worker with graceful shutdown.
#[derive(Debug)]
pub struct ManagedChild {
    child: Child,
    grace: Duration,
}

impl ManagedChild {
    #[must_use]
    pub const fn new(child: Child, grace: Duration) -> Self {
        Self { child, grace }
    }
}

fn exit_of(status: ExitStatus) -> WorkerExit {
    WorkerExit {
        code: status.code(),
    }
}

#[async_trait]
impl WorkerChild for ManagedChild {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    async fn wait(&mut self) -> io::Result<WorkerExit> {
        self.child.wait().await.map(exit_of)
    }

    async fn shutdown(&mut self) -> io::Result<WorkerExit> {
        shutdown_child(&mut self.child, self.grace).await.map(exit_of)
    }
}
