//! Events pushed to progress-stream subscribers.
//!
//! A stream carries two kinds of payload: per-job [`ProgressSnapshot`]s and
//! queue-wide [`ControlEvent`]s. Both serialize to a single JSON object;
//! control events are told apart by their `type` field.

mod channel;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::job::ProgressSnapshot;

pub use channel::{BroadcastChannel, DEFAULT_SINK_CAPACITY, SubscriberId, Subscription};

/// Queue-wide notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ControlEvent {
    /// First event on every new subscription.
    Connected,
    PauseAll {
        timestamp: i64,
    },
    ResumeAll {
        timestamp: i64,
    },
    Cleanup {
        cleared: usize,
        timestamp: i64,
    },
}

impl ControlEvent {
    #[must_use]
    pub fn pause_all() -> Self {
        Self::PauseAll {
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    #[must_use]
    pub fn resume_all() -> Self {
        Self::ResumeAll {
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    #[must_use]
    pub fn cleanup(cleared: usize) -> Self {
        Self::Cleanup {
            cleared,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// Everything the broadcast channel can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueueEvent {
    Progress(ProgressSnapshot),
    Control(ControlEvent),
}

impl From<ProgressSnapshot> for QueueEvent {
    fn from(snapshot: ProgressSnapshot) -> Self {
        Self::Progress(snapshot)
    }
}

impl From<ControlEvent> for QueueEvent {
    fn from(event: ControlEvent) -> Self {
        Self::Control(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobId, JobStatus};

    #[test]
    fn connected_marker_is_a_bare_type() {
        let json = serde_json::to_string(&QueueEvent::from(ControlEvent::Connected)).unwrap();
        assert_eq!(json, r#"{"type":"connected"}"#);
    }

    #[test]
    fn bulk_events_carry_timestamp() {
        let value = serde_json::to_value(ControlEvent::PauseAll { timestamp: 42 }).unwrap();
        assert_eq!(value["type"], "pause-all");
        assert_eq!(value["timestamp"], 42);

        let value = serde_json::to_value(ControlEvent::Cleanup {
            cleared: 3,
            timestamp: 1,
        })
        .unwrap();
        assert_eq!(value["type"], "cleanup");
        assert_eq!(value["cleared"], 3);
    }

    #[test]
    fn snapshots_serialize_without_type_tag() {
        let snapshot = ProgressSnapshot {
            id: JobId::new("a"),
            status: JobStatus::Completed,
            progress: 100.0,
            downloaded_size: "1MiB".into(),
            total_size: "1MiB".into(),
            speed: "0 MB/s".into(),
            eta: "00:00".into(),
            timestamp: 5,
            error: None,
        };
        let value = serde_json::to_value(QueueEvent::from(snapshot)).unwrap();
        assert!(value.get("type").is_none());
        assert_eq!(value["status"], "completed");
    }

    #[test]
    fn control_events_round_trip_through_untagged_enum() {
        let parsed: QueueEvent = serde_json::from_str(r#"{"type":"resume-all","timestamp":9}"#)
            .unwrap();
        assert_eq!(
            parsed,
            QueueEvent::Control(ControlEvent::ResumeAll { timestamp: 9 })
        );
    }
}
