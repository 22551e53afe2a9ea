use std::path::PathBuf;

use thiserror::Error;

use fetchq_core::QueueError;

/// Errors raised while locating or preparing the worker binary.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Neither an existing path nor found on `PATH`.
    #[error("Worker binary not found: {}", binary.display())]
    BinaryNotFound {
        binary: PathBuf,
        #[source]
        source: which::Error,
    },
}

impl From<RuntimeError> for QueueError {
    fn from(err: RuntimeError) -> Self {
        Self::worker_spawn(err.to_string())
    }
}
