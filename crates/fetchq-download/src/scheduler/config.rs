use std::path::PathBuf;
use std::time::Duration;

/// Jobs allowed in a slot at once unless configured otherwise.
pub const DEFAULT_MAX_CONCURRENT: usize = 1;

/// How long a completed record stays listed.
pub const DEFAULT_SUCCESS_RETENTION: Duration = Duration::from_secs(30);

/// How long a failed record stays listed.
pub const DEFAULT_FAILURE_RETENTION: Duration = Duration::from_secs(5);

/// Shared working directory for queued transfers.
pub const DEFAULT_DOWNLOADS_DIR: &str = "/tmp/downloads";

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Slot count; never below 1.
    pub max_concurrent: usize,
    pub success_retention: Duration,
    pub failure_retention: Duration,
    /// Created on first use, shared by every job.
    pub downloads_dir: PathBuf,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            success_retention: DEFAULT_SUCCESS_RETENTION,
            failure_retention: DEFAULT_FAILURE_RETENTION,
            downloads_dir: PathBuf::from(DEFAULT_DOWNLOADS_DIR),
        }
    }
}

impl SchedulerConfig {
    #[must_use]
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    /// Set retention for completed and failed records.
    #[must_use]
    pub const fn with_retention(mut self, success: Duration, failure: Duration) -> Self {
        self.success_retention = success;
        self.failure_retention = failure;
        self
    }

    #[must_use]
    pub fn with_downloads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.downloads_dir = dir.into();
        self
    }
}
