use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::api_state::ApiState;

/// Most recently cached search keys, newest first.
pub async fn recent_queries(State(state): State<ApiState>) -> impl IntoResponse {
    let recent = state.search.recent_queries().await;
    Json(json!({ "recent_queries": recent }))
}
