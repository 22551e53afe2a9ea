//! Queue event emitter port.
//!
//! Lets the scheduler publish snapshots and control events without knowing
//! how they reach observers (SSE, terminal output, tests).

use crate::events::QueueEvent;

/// Port for emitting queue events.
///
/// Implementations must not block: the scheduler calls this while holding
/// its queue lock so that events leave in the order state changed.
pub trait QueueEventEmitter: Send + Sync {
    fn emit(&self, event: QueueEvent);
}
