//! CLI bootstrap - the composition root.
//!
//! The only place a concrete [`FetchBackend`] is chosen: the `yt-dlp`
//! backend from `fetchq-runtime`. Handlers receive it as a trait object.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use fetchq_core::FetchBackend;
use fetchq_download::SchedulerConfig;
use fetchq_runtime::{WorkerConfig, YtDlpBackend};

use crate::error::CliError;
use crate::parser::Cli;

/// Worker and scheduler settings resolved from flags and environment.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub worker: WorkerConfig,
    pub scheduler: SchedulerConfig,
}

impl CliConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        let mut worker = WorkerConfig::default()
            .with_binary(&cli.worker_binary)
            .with_probe_timeout(Duration::from_secs(cli.probe_timeout))
            .with_shutdown_grace(Duration::from_secs(cli.shutdown_grace));
        if let Some(user_agent) = &cli.user_agent {
            worker = worker.with_user_agent(user_agent);
        }

        Self {
            worker,
            scheduler: SchedulerConfig::default().with_downloads_dir(&cli.downloads_dir),
        }
    }
}

/// Fully composed context for commands that talk to the worker.
pub struct CliContext {
    pub backend: Arc<dyn FetchBackend>,
    pub config: CliConfig,
}

/// Locate the worker binary and build the backend.
pub fn bootstrap(config: CliConfig) -> Result<CliContext> {
    let backend = YtDlpBackend::locate(config.worker.clone())
        .map_err(|e| CliError::Worker(format!("{e}. Install yt-dlp or pass --yt-dlp <path>")))?;

    tracing::debug!(binary = %backend.binary().display(), "CLI bootstrap complete");

    Ok(CliContext {
        backend: Arc::new(backend),
        config,
    })
}
