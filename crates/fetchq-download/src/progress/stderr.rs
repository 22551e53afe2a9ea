//! Worker stderr collection.

use std::collections::VecDeque;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Stderr lines kept for failure messages.
pub const STDERR_TAIL_LINES: usize = 5;

/// Drain a worker's stderr to EOF, logging each line and returning the
/// last few joined by newlines.
///
/// Stderr must be drained even when nobody needs it, or a chatty worker
/// blocks on a full pipe. Lines are decoded lossily: the worker echoes
/// titles and messages in whatever encoding the source used.
pub async fn stderr_tail<R>(stderr: R, job: String) -> String
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(target: "fetchq.worker", job_id = %job, error = %e, "Worker stderr read failed");
                break;
            }
        }
        let decoded = String::from_utf8_lossy(&buf);
        let line = decoded.trim();
        if line.is_empty() {
            continue;
        }
        tracing::debug!(target: "fetchq.worker", job_id = %job, %line, "worker stderr");
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line.to_string());
    }

    Vec::from(tail).join("\n")
}
