//! Worker output to progress updates.
//!
//! The worker's stdout is free-form text, not a protocol. All pattern
//! matching lives in [`line`]; this module only re-assembles lines from
//! arbitrary read chunks.

mod line;
mod stderr;

pub use line::parse_line;
pub use stderr::{STDERR_TAIL_LINES, stderr_tail};

use fetchq_core::ProgressUpdate;

/// Carry-over buffers longer than this without a line break are discarded.
const MAX_CARRY: usize = 64 * 1024;

/// Streaming line transducer.
///
/// Chunks may split lines (and UTF-8 sequences) anywhere; the incomplete
/// tail is held until the next chunk. Both `\n` and `\r` end a line, since
/// the worker redraws progress with carriage returns when not told to use
/// newlines.
#[derive(Debug, Default)]
pub struct ProgressParser {
    carry: Vec<u8>,
}

impl ProgressParser {
    pub const fn new() -> Self {
        Self { carry: Vec::new() }
    }

    /// Consume one chunk and return updates for every complete line in it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ProgressUpdate> {
        let mut updates = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|b| matches!(b, b'\n' | b'\r')) {
            self.carry.extend_from_slice(&rest[..pos]);
            if let Some(update) = self.take_line() {
                updates.push(update);
            }
            rest = &rest[pos + 1..];
        }

        self.carry.extend_from_slice(rest);
        if self.carry.len() > MAX_CARRY {
            tracing::debug!(
                target: "fetchq.worker",
                len = self.carry.len(),
                "Discarding oversized partial line"
            );
            self.carry.clear();
        }
        updates
    }

    /// Flush a trailing line that never got a terminator.
    pub fn finish(&mut self) -> Option<ProgressUpdate> {
        self.take_line()
    }

    fn take_line(&mut self) -> Option<ProgressUpdate> {
        if self.carry.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.carry).into_owned();
        self.carry.clear();
        tracing::trace!(target: "fetchq.worker", %line, "worker output");
        parse_line(&line)
    }
}
