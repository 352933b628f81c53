mod handlers;
pub(crate) mod responses;

use crate::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the status API router.
pub(crate) fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Probes
        .route("/healthz", get(handlers::healthz))
        // Status
        .route("/api/status", get(handlers::get_status))
        // Settings (read-only; edit the config file and restart to change)
        .route("/api/settings", get(handlers::get_settings))
        // SSE events
        .route("/api/events", get(handlers::sse_events))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
