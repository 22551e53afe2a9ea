//! Small formatting helpers shared by adapters.

mod bytes;
mod filename;

pub use bytes::format_bytes;
pub use filename::{FALLBACK_FILENAME, attachment_filename};
