//! Scripted [`FetchBackend`] for tests.
//!
//! Probes answer from a rule closure. Transfer workers are either fed by
//! the test through a [`WorkerControl`] or run to completion on their own
//! from canned output ([`AutoWorker`]).

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, DuplexStream};
use tokio::sync::{Notify, mpsc, oneshot};

use fetchq_core::{
    FetchBackend, ProbeOutput, QueueError, TransferRequest, WorkerChild, WorkerExit, WorkerProcess,
};

const PIPE_CAPACITY: usize = 64 * 1024;

type ProbeRule = dyn Fn(&str) -> Option<ProbeOutput> + Send + Sync;

/// Canned output for a worker that finishes without test involvement.
#[derive(Debug, Clone, Default)]
pub struct AutoWorker {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
}

impl AutoWorker {
    pub fn new(stdout: impl Into<Vec<u8>>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: Vec::new(),
            exit_code,
        }
    }

    #[must_use]
    pub fn with_stderr(mut self, stderr: impl Into<Vec<u8>>) -> Self {
        self.stderr = stderr.into();
        self
    }
}

/// Fake backend with call recording.
pub struct ScriptedBackend {
    probe_rule: Box<ProbeRule>,
    auto_worker: Option<AutoWorker>,
    spawn_failure: Option<String>,
    shutdown_gate: Option<Arc<Notify>>,
    probe_calls: Mutex<Vec<String>>,
    transfers: Mutex<Vec<TransferRequest>>,
    shutdowns: Arc<AtomicUsize>,
    workers_tx: mpsc::UnboundedSender<WorkerControl>,
    workers_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<WorkerControl>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    /// Every probe succeeds with `Sample Clip.mp4` and 1 MiB; every
    /// transfer worker waits for the test.
    pub fn new() -> Self {
        let (workers_tx, workers_rx) = mpsc::unbounded_channel();
        Self {
            probe_rule: Box::new(|_| {
                Some(ProbeOutput {
                    filename: "Sample Clip.mp4".to_string(),
                    size_bytes: Some(1_048_576),
                })
            }),
            auto_worker: None,
            spawn_failure: None,
            shutdown_gate: None,
            probe_calls: Mutex::new(Vec::new()),
            transfers: Mutex::new(Vec::new()),
            shutdowns: Arc::new(AtomicUsize::new(0)),
            workers_tx,
            workers_rx: tokio::sync::Mutex::new(workers_rx),
        }
    }

    /// Answer probes by selector; `None` means the probe fails.
    #[must_use]
    pub fn with_probe<F>(mut self, rule: F) -> Self
    where
        F: Fn(&str) -> Option<ProbeOutput> + Send + Sync + 'static,
    {
        self.probe_rule = Box::new(rule);
        self
    }

    #[must_use]
    pub fn with_auto_worker(mut self, worker: AutoWorker) -> Self {
        self.auto_worker = Some(worker);
        self
    }

    #[must_use]
    pub fn with_spawn_failure(mut self, message: impl Into<String>) -> Self {
        self.spawn_failure = Some(message.into());
        self
    }

    /// Worker shutdowns block until `gate` is notified, like a worker
    /// sitting out its grace period.
    #[must_use]
    pub fn with_shutdown_gate(mut self, gate: Arc<Notify>) -> Self {
        self.shutdown_gate = Some(gate);
        self
    }

    /// Selectors probed so far, in call order.
    pub fn probe_calls(&self) -> Vec<String> {
        lock(&self.probe_calls).clone()
    }

    pub fn transfer_requests(&self) -> Vec<TransferRequest> {
        lock(&self.transfers).clone()
    }

    /// How many times a worker was told to shut down.
    pub fn shutdown_count(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    /// Next spawned worker awaiting test input.
    ///
    /// # Panics
    ///
    /// If the backend is dropped while waiting.
    pub async fn next_worker(&self) -> WorkerControl {
        self.workers_rx
            .lock()
            .await
            .recv()
            .await
            .expect("backend dropped")
    }
}

#[async_trait]
impl FetchBackend for ScriptedBackend {
    async fn probe(&self, _url: &str, selector: &str) -> Result<ProbeOutput, QueueError> {
        lock(&self.probe_calls).push(selector.to_string());
        (self.probe_rule)(selector).ok_or_else(|| {
            QueueError::worker_exit(Some(1), "ERROR: Requested format is not available")
        })
    }

    async fn spawn_transfer(&self, request: &TransferRequest) -> Result<WorkerProcess, QueueError> {
        lock(&self.transfers).push(request.clone());
        if let Some(message) = &self.spawn_failure {
            return Err(QueueError::worker_spawn(message.clone()));
        }

        let (exit_tx, exit_rx) = oneshot::channel();
        let child = Box::new(FakeChild {
            exit_rx: Some(exit_rx),
            exited: None,
            shutdowns: Arc::clone(&self.shutdowns),
            gate: self.shutdown_gate.clone(),
        });

        if let Some(auto) = &self.auto_worker {
            let _ = exit_tx.send(auto.exit_code);
            return Ok(WorkerProcess {
                stdout: Box::new(io::Cursor::new(auto.stdout.clone())),
                stderr: Box::new(io::Cursor::new(auto.stderr.clone())),
                child,
            });
        }

        let (stdout_writer, stdout) = tokio::io::duplex(PIPE_CAPACITY);
        let (stderr_writer, stderr) = tokio::io::duplex(PIPE_CAPACITY);
        let control = WorkerControl {
            request: request.clone(),
            stdout: stdout_writer,
            stderr: stderr_writer,
            exit: exit_tx,
        };
        let _ = self.workers_tx.send(control);

        Ok(WorkerProcess {
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            child,
        })
    }
}

/// Test-side handle of a running fake worker.
#[derive(Debug)]
pub struct WorkerControl {
    pub request: TransferRequest,
    stdout: DuplexStream,
    stderr: DuplexStream,
    exit: oneshot::Sender<i32>,
}

impl WorkerControl {
    /// Write one stdout line. Ignored once the reader is gone.
    pub async fn emit(&mut self, line: &str) {
        let _ = self.stdout.write_all(format!("{line}\n").as_bytes()).await;
    }

    /// Write one stderr line; raw bytes need not be UTF-8.
    pub async fn emit_stderr(&mut self, line: impl AsRef<[u8]>) {
        let _ = self.stderr.write_all(line.as_ref()).await;
        let _ = self.stderr.write_all(b"\n").await;
    }

    /// Close both pipes and exit with `code`.
    pub fn exit(self, code: i32) {
        drop(self.stdout);
        drop(self.stderr);
        let _ = self.exit.send(code);
    }
}

struct FakeChild {
    exit_rx: Option<oneshot::Receiver<i32>>,
    exited: Option<WorkerExit>,
    shutdowns: Arc<AtomicUsize>,
    gate: Option<Arc<Notify>>,
}

#[async_trait]
impl WorkerChild for FakeChild {
    fn pid(&self) -> Option<u32> {
        None
    }

    async fn wait(&mut self) -> io::Result<WorkerExit> {
        if let Some(exit) = self.exited {
            return Ok(exit);
        }
        let code = match self.exit_rx.take() {
            Some(rx) => rx.await.ok(),
            None => None,
        };
        let exit = WorkerExit { code };
        self.exited = Some(exit);
        Ok(exit)
    }

    async fn shutdown(&mut self) -> io::Result<WorkerExit> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.exit_rx = None;
        let exit = *self.exited.get_or_insert(WorkerExit { code: None });
        Ok(exit)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
