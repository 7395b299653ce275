use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Liveness check: always returns 200 while the process is serving.
pub async fn live() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "healthy"})))
}
