//! Axum router construction.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS and request tracing.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete router.
///
/// CORS allows any origin so a browser client served from elsewhere can
/// reach the API during development.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws/summaries", get(ws::ws_summaries))
        .route("/api/state", get(handlers::get_state))
        .route("/api/summary", get(handlers::get_summary))
        .route("/api/actions", post(handlers::post_action))
        .route("/api/tutorial", get(handlers::get_tutorial))
        .route("/api/flavor", get(handlers::get_flavor))
        .route(
            "/api/buildings/{id}/description",
            post(handlers::post_description),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
