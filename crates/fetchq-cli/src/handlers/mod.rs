//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Validate CLI input, call into the download crate, format terminal output
//!
//! Rendering is split into pure functions so it can be tested without a
//! worker binary.

pub mod formats;
pub mod get;
pub mod probe;
pub mod serve;
pub mod sizes;

use fetchq_core::SourceId;

use crate::error::CliError;

pub(crate) fn parse_source(source: &str) -> Result<SourceId, CliError> {
    SourceId::parse(source).map_err(|_| CliError::Arguments("source must not be empty".into()))
}
