//! Direct transfer: resolve a format, then hand the worker's stdout to the
//! caller as a byte stream instead of queueing a job.

use std::io;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::stream::{Stream, StreamExt};
use tokio_util::io::ReaderStream;

use fetchq_core::utils::attachment_filename;
use fetchq_core::{
    FetchBackend, QualityTier, QueueError, SourceId, TransferRequest, TransferTarget, WorkerProcess,
};

use crate::probe::ProbeRunner;
use crate::progress::stderr_tail;

/// Media bytes as they come off the worker.
pub type TransferBody = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// A started transfer, ready to be sent as a response.
pub struct PreparedTransfer {
    /// Sanitized, safe for a `Content-Disposition` header.
    pub filename: String,
    /// Exact size when the probe reported one.
    pub content_length: Option<u64>,
    pub selector: String,
    /// Ends with an error if the worker exits non-zero. Dropping it kills
    /// the worker.
    pub body: TransferBody,
}

impl std::fmt::Debug for PreparedTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedTransfer")
            .field("filename", &self.filename)
            .field("content_length", &self.content_length)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct DirectTransfer {
    backend: Arc<dyn FetchBackend>,
    probe: ProbeRunner,
}

impl DirectTransfer {
    pub fn new(backend: Arc<dyn FetchBackend>) -> Self {
        Self {
            probe: ProbeRunner::new(Arc::clone(&backend)),
            backend,
        }
    }

    /// Resolve a format for `tier` and start streaming it.
    ///
    /// # Errors
    ///
    /// Resolution and spawn failures are returned before any byte is
    /// produced, so the caller can still answer with an error status.
    pub async fn prepare(
        &self,
        source: &SourceId,
        tier: QualityTier,
    ) -> Result<PreparedTransfer, QueueError> {
        let url = source.url();
        let resolved = self.probe.resolve(&url, tier).await?;
        let selector = resolved.selector().to_string();

        let request = TransferRequest {
            url,
            selector: selector.clone(),
            target: TransferTarget::Stdout,
        };
        let process = self.backend.spawn_transfer(&request).await?;

        tracing::info!(
            target: "fetchq.worker",
            source = %source,
            tier = %tier,
            selector = %selector,
            size = ?resolved.size_bytes,
            "Direct transfer started"
        );

        Ok(PreparedTransfer {
            filename: attachment_filename(&resolved.filename),
            content_length: resolved.size_bytes,
            selector,
            body: body_stream(process, source.to_string()),
        })
    }
}

fn body_stream(process: WorkerProcess, source: String) -> TransferBody {
    let WorkerProcess {
        stdout,
        stderr,
        mut child,
    } = process;

    Box::pin(async_stream::try_stream! {
        let tail = tokio::spawn(stderr_tail(stderr, source.clone()));
        let mut chunks = ReaderStream::new(stdout);
        while let Some(chunk) = chunks.next().await {
            yield chunk?;
        }

        let exit = child.wait().await?;
        if !exit.success() {
            let detail = tail.await.unwrap_or_default();
            tracing::warn!(target: "fetchq.worker", %source, code = ?exit.code, "Direct transfer failed");
            Err::<(), _>(io::Error::other(QueueError::worker_exit(exit.code, detail)))?;
        }
    })
}
