//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::ui::state::AppState;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Current hub occupancy, for operational visibility.
pub async fn hub_stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let connections = state.hub.connection_count().await;
    Json(serde_json::json!({"connections": connections}))
}
