//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{rate_limit_api, track_metrics};
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/live-stream", api_routes(state.clone()))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(track_metrics))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// Viewing-session routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/{event_id}/check-access",
            get(handlers::access::check_access),
        )
        .route("/session", post(handlers::session::session_action))
        .route("/invite", post(handlers::invite::create_invite))
        .route("/invite/{code}", get(handlers::invite::validate_invite))
        .route_layer(middleware::from_fn_with_state(state, rate_limit_api))
        // The sync socket sits outside the limiter; its traffic is paced
        // by the heartbeat interval, not per-request
        .route("/{event_id}/ws", get(ws_handler))
}
