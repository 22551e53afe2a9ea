//! Process runtime for fetchq.
//!
//! Implements [`fetchq_core::FetchBackend`] on top of the `yt-dlp` binary:
//! command construction, binary lookup, subprocess spawning and graceful
//! child shutdown. Orchestration lives in `fetchq-download`; nothing here
//! knows about jobs or queues.

#![deny(unsafe_code)]

mod backend;
mod command;
mod config;
mod error;
pub mod process;

pub use backend::{ManagedChild, YtDlpBackend};
pub use command::{
    parse_probe_output, probe_args, resolve_worker_binary, stream_args, transfer_args,
};
pub use config::{
    DEFAULT_PROBE_TIMEOUT, DEFAULT_SHUTDOWN_GRACE, DEFAULT_USER_AGENT, DEFAULT_WORKER_BINARY,
    WorkerConfig,
};
pub use error::RuntimeError;
