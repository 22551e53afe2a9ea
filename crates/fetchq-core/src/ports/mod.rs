//! Port definitions (trait abstractions) for external collaborators.
//!
//! The orchestration core only ever talks to the worker binary and to
//! observers through these traits, so both can be swapped out in tests.

mod event_emitter;
mod fetch_backend;

pub use event_emitter::QueueEventEmitter;
pub use fetch_backend::{
    FetchBackend, ProbeOutput, TransferRequest, TransferTarget, WorkerChild, WorkerExit,
    WorkerProcess,
};
