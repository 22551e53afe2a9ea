//! HTTP request handlers for the Axum web server.
//!
//! Handlers are thin: validate input, call the scheduler or the transfer
//! path, shape the JSON reply.

pub mod folder;
pub mod info;
pub mod queue;
pub mod transfer;

use fetchq_core::QueueError;

/// A present, non-blank parameter or [`QueueError::MissingParameter`].
pub(crate) fn required(value: Option<String>, name: &str) -> Result<String, QueueError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| QueueError::missing_parameter(name))
}
