//! Health and readiness endpoints.

use super::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Value, json};

/// Liveness probe; answers as long as the process is up.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness probe; checks that the store answers.
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable", "error": e.to_string() })),
        ),
    }
}
