//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{infrastructure::dto::http::RelayStateDto, ui::state::AppState};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Debug endpoint exposing the current relay state
pub async fn debug_relay_state(State(state): State<Arc<AppState>>) -> Json<RelayStateDto> {
    let snapshot = state.get_relay_state_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(RelayStateDto::from(snapshot))
}
