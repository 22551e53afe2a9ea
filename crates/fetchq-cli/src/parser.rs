//! Main CLI parser and top-level argument handling.
//!
//! Global options configure the worker process and the downloads
//! directory; every one of them can also come from a `FETCHQ_*`
//! environment variable (or a `.env` file).

use std::path::PathBuf;

use clap::Parser;

use fetchq_core::QualityTier;
use fetchq_download::DEFAULT_DOWNLOADS_DIR;
use fetchq_runtime::DEFAULT_WORKER_BINARY;

use crate::commands::Commands;

/// Command-line interface for the media fetch queue.
#[derive(Parser)]
#[command(name = "fetchq")]
#[command(about = "Queue and stream media downloads through yt-dlp")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Worker binary; looked up on PATH unless given as a path
    #[arg(
        long = "yt-dlp",
        env = "FETCHQ_YTDLP",
        default_value = DEFAULT_WORKER_BINARY,
        global = true
    )]
    pub worker_binary: PathBuf,

    /// User agent sent with format probes
    #[arg(long, env = "FETCHQ_USER_AGENT", global = true)]
    pub user_agent: Option<String>,

    /// Shared working directory for queued downloads
    #[arg(
        long,
        env = "FETCHQ_DOWNLOADS_DIR",
        default_value = DEFAULT_DOWNLOADS_DIR,
        global = true
    )]
    pub downloads_dir: PathBuf,

    /// Seconds before a single format probe is abandoned
    #[arg(long, env = "FETCHQ_PROBE_TIMEOUT", default_value_t = 60, global = true)]
    pub probe_timeout: u64,

    /// Seconds between SIGTERM and SIGKILL when stopping a worker
    #[arg(long, env = "FETCHQ_SHUTDOWN_GRACE", default_value_t = 5, global = true)]
    pub shutdown_grace: u64,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Value parser for quality arguments (`720`, `720p`).
pub fn parse_quality(value: &str) -> Result<QualityTier, String> {
    value.parse().map_err(|e: fetchq_core::QueueError| e.user_message())
}
