//! Queue error types.
//!
//! One enum covers every failure the orchestration core can surface. Errors
//! stay cloneable and serializable, so I/O errors are captured as strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::QualityTier;

/// Error type for queue, probe and worker operations.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum QueueError {
    /// A required request field was absent or blank.
    #[error("Missing required parameter: {name}")]
    MissingParameter {
        /// Wire name of the missing field.
        name: String,
    },

    /// Quality tier outside the supported set.
    #[error("Invalid quality: {value}")]
    InvalidQuality {
        /// The rejected input.
        value: String,
    },

    /// A live job already holds this id.
    #[error("Download already in progress: {id}")]
    AlreadyActive {
        /// The conflicting job id.
        id: String,
    },

    /// Every format candidate failed probing.
    #[error("No viable format for {tier} after trying {tried} candidates")]
    NoViableFormat {
        /// Requested tier.
        tier: QualityTier,
        /// Number of candidates probed.
        tried: usize,
    },

    /// The worker binary could not be started.
    #[error("Failed to start worker: {message}")]
    WorkerSpawn {
        /// Detailed error message.
        message: String,
    },

    /// The worker ran but exited unsuccessfully.
    #[error("{}", exit_message(*code, detail))]
    WorkerExit {
        /// Exit code, `None` when killed by a signal.
        code: Option<i32>,
        /// Trailing stderr output, if any.
        detail: String,
    },

    /// I/O error outside the worker itself.
    #[error("I/O error ({kind}): {message}")]
    Io {
        /// The kind of I/O error.
        kind: String,
        /// Detailed error message.
        message: String,
    },

    /// General/uncategorized error.
    #[error("{message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

fn exit_message(code: Option<i32>, detail: &str) -> String {
    let head = code.map_or_else(
        || "worker terminated by signal".to_string(),
        |c| format!("worker exited with code {c}"),
    );
    if detail.is_empty() {
        head
    } else {
        format!("{head}: {detail}")
    }
}

impl QueueError {
    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    pub fn invalid_quality(value: impl Into<String>) -> Self {
        Self::InvalidQuality {
            value: value.into(),
        }
    }

    pub fn already_active(id: impl Into<String>) -> Self {
        Self::AlreadyActive { id: id.into() }
    }

    #[must_use]
    pub const fn no_viable_format(tier: QualityTier, tried: usize) -> Self {
        Self::NoViableFormat { tier, tried }
    }

    pub fn worker_spawn(message: impl Into<String>) -> Self {
        Self::WorkerSpawn {
            message: message.into(),
        }
    }

    pub fn worker_exit(code: Option<i32>, detail: impl Into<String>) -> Self {
        Self::WorkerExit {
            code,
            detail: detail.into(),
        }
    }

    /// Create an I/O error from a `std::io::Error`.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        let kind = err.kind();
        Self::Io {
            kind: format!("{kind:?}"),
            message: err.to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Input validation failures: rejected before any side effect.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter { .. } | Self::InvalidQuality { .. }
        )
    }

    /// Get a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingParameter { .. } => "Missing required parameters".to_string(),
            Self::InvalidQuality { value } => {
                format!("Unsupported quality '{value}' (expected 1080, 720, 480 or 360)")
            }
            Self::AlreadyActive { .. } => "Download already in progress".to_string(),
            Self::NoViableFormat { tier, tried } => format!(
                "No downloadable format found for {tier} (tried {tried} format options)"
            ),
            Self::WorkerSpawn { .. } => "Could not start the downloader".to_string(),
            Self::WorkerExit { .. } | Self::Io { .. } | Self::Internal { .. } => self.to_string(),
        }
    }
}

impl From<std::io::Error> for QueueError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io_error(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_failure_names_tier_and_count() {
        let err = QueueError::no_viable_format(QualityTier::P720, 4);
        assert_eq!(
            err.to_string(),
            "No viable format for 720p after trying 4 candidates"
        );
        assert!(err.user_message().contains("720p"));
    }

    #[test]
    fn worker_exit_includes_stderr_tail() {
        let err = QueueError::worker_exit(Some(1), "ERROR: Video unavailable");
        assert_eq!(
            err.to_string(),
            "worker exited with code 1: ERROR: Video unavailable"
        );
        let killed = QueueError::worker_exit(None, "");
        assert_eq!(killed.to_string(), "worker terminated by signal");
    }

    #[test]
    fn validation_errors_are_client_errors() {
        assert!(QueueError::missing_parameter("id").is_client_error());
        assert!(QueueError::invalid_quality("4k").is_client_error());
        assert!(!QueueError::already_active("x").is_client_error());
        assert!(!QueueError::internal("boom").is_client_error());
    }

    #[test]
    fn io_errors_capture_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = QueueError::from(io);
        assert!(matches!(err, QueueError::Io { ref kind, .. } if kind == "NotFound"));
    }
}
