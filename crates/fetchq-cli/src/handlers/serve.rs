//! `serve` - run the HTTP API until Ctrl+C.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use fetchq_axum::{ServerConfig, start_server};

use crate::bootstrap::CliContext;

/// Arguments of the `serve` subcommand.
#[derive(Debug, Clone)]
pub struct ServeArgs {
    pub port: u16,
    pub max_concurrent: usize,
    pub allowed_origins: Vec<String>,
    pub keep_alive: u64,
}

pub async fn execute(ctx: &CliContext, args: ServeArgs) -> Result<()> {
    let config = server_config(ctx, args);
    let cancel = CancellationToken::new();

    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
        }
        on_signal.cancel();
    });

    println!("Serving on http://0.0.0.0:{} (Ctrl+C to stop)", config.port);
    let port = config.port;
    start_server(config, ctx.backend.clone(), cancel)
        .await
        .with_context(|| format!("HTTP server on port {port} failed"))
}

fn server_config(ctx: &CliContext, args: ServeArgs) -> ServerConfig {
    let scheduler = ctx
        .config
        .scheduler
        .clone()
        .with_max_concurrent(args.max_concurrent);

    let config = ServerConfig::default()
        .with_port(args.port)
        .with_keep_alive(Duration::from_secs(args.keep_alive))
        .with_scheduler(scheduler);

    if args.allowed_origins.is_empty() {
        config
    } else {
        config.with_allowed_origins(args.allowed_origins)
    }
}
