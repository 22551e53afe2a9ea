//! Route definitions and router construction.

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::bootstrap::{AxumContext, CorsConfig};
use crate::handlers;
use crate::state::AppState;

/// Build CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

/// All API routes, without the `/api` prefix.
pub(crate) fn api_routes() -> Router<AppState> {
    Router::new()
        // Queue API
        .route("/queue", get(handlers::queue::list))
        .route("/queue/start", post(handlers::queue::start))
        .route("/queue/pause/{id}", post(handlers::queue::pause))
        .route("/queue/resume/{id}", post(handlers::queue::resume))
        .route("/queue/cancel/{id}", post(handlers::queue::cancel))
        .route("/queue/pause-all", post(handlers::queue::pause_all))
        .route("/queue/resume-all", post(handlers::queue::resume_all))
        .route("/queue/cleanup", post(handlers::queue::cleanup))
        // Progress stream (SSE)
        .route("/queue/progress", get(handlers::queue::progress))
        // Direct transfer and probing
        .route("/download", get(handlers::transfer::download))
        .route("/video-info", get(handlers::info::video_info))
        .route("/downloads/folder", get(handlers::folder::folder))
}

/// Create the main Axum router.
///
/// # Path Parameter Syntax
/// Axum 0.8 uses brace syntax for path parameters: `{id}`
pub fn create_router(ctx: AxumContext, cors_config: &CorsConfig) -> Router {
    let state: AppState = Arc::new(ctx);
    let cors = build_cors_layer(cors_config);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes().with_state(state).layer(cors))
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint.
pub(crate) async fn health_check() -> &'static str {
    "OK"
}
