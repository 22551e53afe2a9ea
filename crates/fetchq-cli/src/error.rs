//! CLI-specific error types and mappings.
//!
//! Maps queue errors to exit codes and user-facing messages.

use fetchq_core::QueueError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad input (missing source, unknown quality).
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// No format candidate could be resolved.
    #[error("{0}")]
    Resolution(String),

    /// The worker could not be started or located.
    #[error("{0}")]
    Worker(String),

    /// The job ran and failed.
    #[error("Download failed: {0}")]
    JobFailed(String),

    /// IO error (downloads directory, terminal).
    #[error("IO error: {0}")]
    Io(String),

    /// Interrupted by the user.
    #[error("Interrupted")]
    Interrupted,
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    /// - 130: Terminated by Ctrl+C
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::JobFailed(_) => 1,
            Self::Arguments(_) => 2,
            Self::Resolution(_) => 65, // EX_DATAERR
            Self::Worker(_) => 71,     // EX_OSERR
            Self::Io(_) => 74,         // EX_IOERR
            Self::Interrupted => 130,
        }
    }
}

impl From<QueueError> for CliError {
    fn from(err: QueueError) -> Self {
        let message = err.user_message();
        match err {
            QueueError::MissingParameter { .. } | QueueError::InvalidQuality { .. } => {
                Self::Arguments(message)
            }
            QueueError::NoViableFormat { .. } => Self::Resolution(message),
            QueueError::WorkerSpawn { message } => Self::Worker(message),
            QueueError::WorkerExit { .. } | QueueError::AlreadyActive { .. } => {
                Self::JobFailed(message)
            }
            QueueError::Io { .. } | QueueError::Internal { .. } => Self::Io(message),
        }
    }
}
