use axum::{
    extract::{Path, State},
    Json,
};
use common::storage::types::document::Document;

use crate::{api_state::ApiState, error::ApiError};

pub async fn get_document(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    let document = state.search.get_document(&id).await?;
    Ok(Json(document))
}
