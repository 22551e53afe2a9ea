//! Axum web server adapter for fetchq.
//!
//! Exposes the queue scheduler, direct transfers and size probes over HTTP,
//! and the broadcast channel as a server-sent event stream. The worker
//! backend is injected by the caller, so this crate never spawns processes
//! itself.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Silence unused dev-dependency warnings; used by integration tests
#[cfg(test)]
use http_body_util as _;
#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tower as _;

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod sse;
pub mod state;

// Re-export primary types
pub use bootstrap::{
    AxumContext, CorsConfig, DEFAULT_KEEP_ALIVE, DEFAULT_PORT, ServerConfig, bootstrap,
    start_server,
};
pub use error::HttpError;
pub use routes::create_router;
pub use state::AppState;
