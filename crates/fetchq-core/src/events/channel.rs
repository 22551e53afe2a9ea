//! Fan-out register of subscriber sinks.
//!
//! Every published event is serialized once and offered to each sink with a
//! non-blocking send. A sink that cannot take the event (receiver gone or
//! buffer full) is dropped from the register on the spot, so a stalled or
//! disconnected subscriber never holds up the others and never needs a
//! heartbeat to be noticed.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::{ControlEvent, QueueEvent};
use crate::ports::QueueEventEmitter;

/// Events buffered per subscriber before it is considered stalled.
pub const DEFAULT_SINK_CAPACITY: usize = 256;

/// Handle identifying one registered sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Payload = Arc<str>;

/// Subscriber registry shared by the scheduler and the transport layer.
#[derive(Debug)]
pub struct BroadcastChannel {
    sinks: Mutex<HashMap<SubscriberId, mpsc::Sender<Payload>>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl BroadcastChannel {
    /// Create a channel whose sinks buffer up to `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            sinks: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
        })
    }

    #[must_use]
    pub fn with_defaults() -> Arc<Self> {
        Self::new(DEFAULT_SINK_CAPACITY)
    }

    /// Register a new subscriber.
    ///
    /// The returned stream yields the `connected` marker first. Dropping it
    /// unregisters the sink immediately.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let (tx, rx) = mpsc::channel(self.capacity);
        // Fresh channel with capacity >= 1: this send cannot fail.
        if let Some(ack) = encode(&ControlEvent::Connected.into()) {
            let _ = tx.try_send(ack);
        }
        let id = self.register_sink(tx);
        tracing::debug!(target: "fetchq.broadcast", subscriber = id.0, "Subscriber connected");

        Subscription {
            id,
            receiver: rx,
            channel: Arc::downgrade(self),
        }
    }

    /// Register a raw sink. Transports that own their receiving end use
    /// this directly; they are pruned on the first failed write.
    pub fn register_sink(&self, sink: mpsc::Sender<Payload>) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock_sinks().insert(id, sink);
        id
    }

    /// Remove a sink ahead of any failed write. Returns whether it was present.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.lock_sinks().remove(&id).is_some();
        if removed {
            tracing::debug!(target: "fetchq.broadcast", subscriber = id.0, "Subscriber disconnected");
        }
        removed
    }

    /// Serialize `event` once and offer it to every sink.
    ///
    /// Returns how many sinks accepted it.
    pub fn publish(&self, event: &QueueEvent) -> usize {
        let Some(payload) = encode(event) else {
            return 0;
        };

        let mut sinks = self.lock_sinks();
        let mut delivered = 0;
        sinks.retain(|id, sink| match sink.try_send(Arc::clone(&payload)) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::debug!(target: "fetchq.broadcast", subscriber = id.0, "Dropping stalled subscriber");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(target: "fetchq.broadcast", subscriber = id.0, "Pruning closed subscriber");
                false
            }
        });
        delivered
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock_sinks().len()
    }

    fn lock_sinks(&self) -> std::sync::MutexGuard<'_, HashMap<SubscriberId, mpsc::Sender<Payload>>> {
        self.sinks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl QueueEventEmitter for BroadcastChannel {
    fn emit(&self, event: QueueEvent) {
        self.publish(&event);
    }
}

fn encode(event: &QueueEvent) -> Option<Payload> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Arc::from(json)),
        Err(e) => {
            tracing::warn!(target: "fetchq.broadcast", error = %e, "Failed to serialize event");
            None
        }
    }
}

/// Receiving end of one subscriber, yielding JSON payloads.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<Payload>,
    channel: Weak<BroadcastChannel>,
}

impl Subscription {
    #[must_use]
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next payload, or `None` once the sink has been pruned.
    pub async fn recv(&mut self) -> Option<Payload> {
        self.receiver.recv().await
    }
}

impl Stream for Subscription {
    type Item = Payload;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.upgrade() {
            channel.unsubscribe(self.id);
        }
    }
}
