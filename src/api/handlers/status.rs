use crate::api::responses::{ApiResponse, StatusResponse};
use crate::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

pub(crate) async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.status.read().await;
    Json(ApiResponse::ok(StatusResponse {
        state: status.state,
        node_name: state.config.node_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        last_tick: status.last_tick.clone(),
    }))
}

pub(crate) async fn healthz() -> &'static str {
    "ok"
}
