//! Health check routes.

use axum::{Json, Router, http::StatusCode, routing::get};
use serde_json::json;

use crate::AppState;

/// Creates the health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// GET `/health` - Liveness probe.
async fn health_check() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "twungurane",
        })),
    )
}
