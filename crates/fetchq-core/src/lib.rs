//! Core domain types and port definitions for fetchq.
//!
//! This crate holds everything the orchestration layers agree on:
//!
//! - `job` - job identity, status, quality tiers, the job record and its snapshots
//! - `format` - quality tier to format-selector policy
//! - `events` - stream events and the subscriber broadcast registry
//! - `ports` - traits implemented by process and transport adapters
//! - `utils` - byte and filename formatting helpers
//!
//! Nothing in here spawns processes or touches the network.

#![deny(unsafe_code)]

pub mod events;
pub mod format;
pub mod job;
pub mod ports;
pub mod utils;

pub use events::{BroadcastChannel, ControlEvent, QueueEvent, SubscriberId, Subscription};
pub use format::{CandidateKind, FormatCandidate, candidates_for};
pub use job::{
    Job, JobId, JobStatus, ProgressSnapshot, ProgressUpdate, QualityTier, QueueError, SourceId,
};
pub use ports::{
    FetchBackend, ProbeOutput, QueueEventEmitter, TransferRequest, TransferTarget, WorkerChild,
    WorkerExit, WorkerProcess,
};
