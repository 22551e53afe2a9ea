//! Axum server bootstrap.
//!
//! Wires the scheduler, the direct transfer path and the broadcast channel
//! around an injected [`FetchBackend`]. The binary decides which backend
//! that is; tests pass a scripted one.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use fetchq_core::{BroadcastChannel, FetchBackend, QueueEventEmitter};
use fetchq_download::{DirectTransfer, ProbeRunner, QueueScheduler, SchedulerConfig};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Interval between SSE keep-alive comments.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port for the HTTP server.
    pub port: u16,
    /// CORS configuration.
    pub cors: CorsConfig,
    /// SSE keep-alive interval.
    pub keep_alive: Duration,
    /// Queue scheduler settings.
    pub scheduler: SchedulerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            cors: CorsConfig::default(),
            keep_alive: DEFAULT_KEEP_ALIVE,
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set CORS to allow specific origins.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors = CorsConfig::AllowOrigins(origins);
        self
    }

    #[must_use]
    pub const fn with_keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = interval;
        self
    }

    #[must_use]
    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }
}

/// Services shared by every handler.
pub struct AxumContext {
    /// Queued jobs.
    pub scheduler: Arc<QueueScheduler>,
    /// Progress stream subscribers.
    pub broadcast: Arc<BroadcastChannel>,
    /// Unqueued streaming transfers.
    pub transfer: DirectTransfer,
    /// Per-tier size probes.
    pub probe: ProbeRunner,
    /// SSE keep-alive interval.
    pub keep_alive: Duration,
}

/// Build the handler context around `backend`.
pub fn bootstrap(config: &ServerConfig, backend: Arc<dyn FetchBackend>) -> AxumContext {
    let broadcast = BroadcastChannel::with_defaults();
    let emitter: Arc<dyn QueueEventEmitter> = broadcast.clone();
    let scheduler = QueueScheduler::new(Arc::clone(&backend), emitter, config.scheduler.clone());

    info!(
        max_concurrent = config.scheduler.max_concurrent,
        downloads_dir = %config.scheduler.downloads_dir.display(),
        "Queue scheduler ready"
    );

    AxumContext {
        scheduler,
        broadcast,
        transfer: DirectTransfer::new(Arc::clone(&backend)),
        probe: ProbeRunner::new(backend),
        keep_alive: config.keep_alive,
    }
}

/// Serve the API until `cancel` fires, then stop every live worker.
pub async fn start_server(
    config: ServerConfig,
    backend: Arc<dyn FetchBackend>,
    cancel: CancellationToken,
) -> Result<()> {
    let ctx = bootstrap(&config, backend);
    let scheduler = Arc::clone(&ctx.scheduler);
    let app = crate::routes::create_router(ctx, &config.cors);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("fetchq server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;

    let stopped = scheduler.cleanup().await;
    info!(stopped, "fetchq server shut down");
    Ok(())
}
