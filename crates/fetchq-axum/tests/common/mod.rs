//! Shared harness for fetchq-axum integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use fetchq_axum::bootstrap::{CorsConfig, ServerConfig, bootstrap};
use fetchq_axum::routes::create_router;
use fetchq_core::{BroadcastChannel, JobStatus, ProgressSnapshot, QueueEvent, Subscription};
use fetchq_download::testing::ScriptedBackend;
use fetchq_download::{QueueScheduler, SchedulerConfig};

/// Upper bound for any single wait in these tests.
pub const WAIT: Duration = Duration::from_secs(5);

pub struct TestApp {
    pub router: Router,
    pub backend: Arc<ScriptedBackend>,
    pub scheduler: Arc<QueueScheduler>,
    pub broadcast: Arc<BroadcastChannel>,
    pub downloads_dir: std::path::PathBuf,
    _dir: TempDir,
}

impl TestApp {
    pub fn new(backend: ScriptedBackend) -> Self {
        Self::with_cors(backend, &CorsConfig::AllowAll)
    }

    pub fn with_cors(backend: ScriptedBackend, cors: &CorsConfig) -> Self {
        let dir = TempDir::new().unwrap();
        let downloads_dir = dir.path().join("downloads");
        let backend = Arc::new(backend);
        let config = ServerConfig::default()
            .with_scheduler(SchedulerConfig::default().with_downloads_dir(&downloads_dir));

        let ctx = bootstrap(&config, backend.clone());
        let scheduler = Arc::clone(&ctx.scheduler);
        let broadcast = Arc::clone(&ctx.broadcast);

        Self {
            router: create_router(ctx, cors),
            backend,
            scheduler,
            broadcast,
            downloads_dir,
            _dir: dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Subscribe and consume the connected marker.
    pub async fn subscribe(&self) -> Subscription {
        let mut sub = self.broadcast.subscribe();
        let ack = sub.recv().await.unwrap();
        assert!(ack.contains("connected"));
        sub
    }
}

pub async fn json_body(response: Response<Body>) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("invalid JSON ({e}): {}", String::from_utf8_lossy(&bytes)));
    (status, value)
}

/// Wait for a snapshot of `id` with `status`.
pub async fn wait_for(sub: &mut Subscription, id: &str, status: JobStatus) -> ProgressSnapshot {
    loop {
        let payload = tokio::time::timeout(WAIT, sub.recv())
            .await
            .expect("timed out waiting for event")
            .expect("subscription closed");
        if let QueueEvent::Progress(snapshot) = serde_json::from_str(&payload).unwrap() {
            if snapshot.id.as_str() == id && snapshot.status == status {
                return snapshot;
            }
        }
    }
}
