//! Identity and classification types for jobs.
//!
//! Pure data types with no I/O dependencies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::QueueError;

/// Base URL used when a source is given as a bare video identifier.
const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Opaque identifier for a job, unique for the job's lifetime.
///
/// Callers may supply their own id, or derive one from the source, tier and
/// submission time so repeated submissions of the same pair never collide.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wrap a caller-supplied id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive an id as `{source}_{tier}_{timestamp_ms}`.
    #[must_use]
    pub fn derive(source: &SourceId, tier: QualityTier, timestamp_ms: i64) -> Self {
        Self(format!("{}_{}_{timestamp_ms}", source.as_str(), tier.height()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A form of the id safe to embed in a file name.
    #[must_use]
    pub fn file_safe(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifier of the media source: either a bare video id or a full URL.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    /// Create a source id, rejecting blank input.
    pub fn parse(value: impl Into<String>) -> Result<Self, QueueError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(QueueError::missing_parameter("videoId"));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The URL handed to the worker.
    ///
    /// Sources that already look like URLs are passed through unchanged.
    #[must_use]
    pub fn url(&self) -> String {
        if self.0.starts_with("http://") || self.0.starts_with("https://") {
            self.0.clone()
        } else {
            format!("{WATCH_URL_PREFIX}{}", self.0)
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Discrete target resolution bucket, ordered from highest to lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QualityTier {
    #[serde(rename = "1080")]
    P1080,
    #[serde(rename = "720")]
    P720,
    #[serde(rename = "480")]
    P480,
    #[serde(rename = "360")]
    P360,
}

impl QualityTier {
    /// All tiers, highest first.
    pub const ALL: [Self; 4] = [Self::P1080, Self::P720, Self::P480, Self::P360];

    /// Maximum frame height for this tier.
    #[must_use]
    pub const fn height(self) -> u32 {
        match self {
            Self::P1080 => 1080,
            Self::P720 => 720,
            Self::P480 => 480,
            Self::P360 => 360,
        }
    }

    /// The next tier down, if any.
    #[must_use]
    pub const fn lower(self) -> Option<Self> {
        match self {
            Self::P1080 => Some(Self::P720),
            Self::P720 => Some(Self::P480),
            Self::P480 => Some(Self::P360),
            Self::P360 => None,
        }
    }

    /// The next tier up, if any.
    #[must_use]
    pub const fn higher(self) -> Option<Self> {
        match self {
            Self::P1080 => None,
            Self::P720 => Some(Self::P1080),
            Self::P480 => Some(Self::P720),
            Self::P360 => Some(Self::P480),
        }
    }

    #[must_use]
    pub const fn is_lowest(self) -> bool {
        matches!(self, Self::P360)
    }

    /// Wire label (`"720"`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::P1080 => "1080",
            Self::P720 => "720",
            Self::P480 => "480",
            Self::P360 => "360",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p", self.height())
    }
}

impl FromStr for QualityTier {
    type Err = QueueError;

    /// Accepts `"720"` and `"720p"` (case-insensitive suffix).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_suffix('p')
            .or_else(|| trimmed.strip_suffix('P'))
            .unwrap_or(trimmed);
        Self::ALL
            .into_iter()
            .find(|tier| tier.label() == digits)
            .ok_or_else(|| QueueError::invalid_quality(s))
    }
}

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting for a free slot.
    Pending,
    /// Worker running and reporting progress.
    Downloading,
    /// Marked paused; the worker is not suspended.
    Paused,
    /// Worker exited with code 0.
    Completed,
    /// Worker exited non-zero, failed to spawn, or no format was viable.
    Failed,
    /// Only ever seen on the final snapshot broadcast before removal.
    Cancelled,
}

impl JobStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether a job in this status holds a concurrency slot.
    #[must_use]
    pub const fn occupies_slot(self) -> bool {
        matches!(self, Self::Downloading | Self::Paused)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Downloading => "downloading",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
