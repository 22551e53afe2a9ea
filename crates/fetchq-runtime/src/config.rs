//! Worker process configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Looked up on `PATH` unless configured as a path.
pub const DEFAULT_WORKER_BINARY: &str = "yt-dlp";

/// Sent with every probe; some extractors reject the default one.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Time between SIGTERM and SIGKILL.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Upper bound for a single metadata probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub binary: PathBuf,
    pub user_agent: String,
    pub shutdown_grace: Duration,
    pub probe_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_WORKER_BINARY),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl WorkerConfig {
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub const fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    #[must_use]
    pub const fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}
