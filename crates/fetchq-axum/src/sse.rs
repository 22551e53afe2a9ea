//! Progress stream over server-sent events.
//!
//! Each subscriber gets its own sink in the [`BroadcastChannel`]; payloads
//! are already JSON, so frames are written as-is. The first frame carries a
//! `retry` hint so browsers reconnect after a fixed delay when the stream
//! drops.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::Stream;
use tokio_stream::StreamExt;

use fetchq_core::BroadcastChannel;

/// Reconnect delay advertised to clients.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Open a new progress stream.
///
/// Dropping the response (client disconnect) drops the subscription, which
/// removes the sink from the channel.
pub fn progress_stream(
    channel: &Arc<BroadcastChannel>,
    keep_alive: Duration,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + use<>> {
    let subscription = channel.subscribe();
    tracing::debug!(
        target: "fetchq.broadcast",
        subscribers = channel.subscriber_count(),
        "SSE client connected"
    );

    let mut retry = Some(RECONNECT_DELAY);
    let stream = subscription.map(move |payload| {
        let event = Event::default().data(&*payload);
        Ok(match retry.take() {
            Some(delay) => event.retry(delay),
            None => event,
        })
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(keep_alive).text("ping"))
}
