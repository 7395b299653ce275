use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use retrieval_pipeline::{SearchRequest, SearchResponse, SearchType};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

/// Cache route tag of the JSON endpoint.
pub const API_ROUTE: &str = "api";
/// Cache route tag of the query-string endpoint.
pub const WEB_ROUTE: &str = "web";

pub async fn search_api(
    State(state): State<ApiState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    info!(query = %request.query, page = request.page, "Received search request");
    let page = state.search.search(API_ROUTE, &request).await?;
    Ok(Json(SearchResponse::from(page)))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
    page: Option<usize>,
    page_size: Option<usize>,
    #[serde(default)]
    search_type: SearchType,
    doc_id: Option<String>,
}

/// `GET /search?q=..&page=..`: a page of results, or a single hit when
/// `doc_id` names one of the results behind that page.
pub async fn search_page(
    State(state): State<ApiState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    let mut request = SearchRequest::new(params.q)
        .with_page(params.page.unwrap_or(1))
        .with_page_size(params.page_size.unwrap_or(state.default_page_size));
    request.search_type = params.search_type;

    if let Some(doc_id) = params.doc_id.as_deref() {
        let (page, hit) = state
            .search
            .find_document(WEB_ROUTE, &request, doc_id)
            .await?;
        return Ok(Json(json!({
            "document": hit,
            "query": request.query,
            "page": page.page,
        }))
        .into_response());
    }

    let page = state.search.search(WEB_ROUTE, &request).await?;
    Ok(Json(SearchResponse::from(page)).into_response())
}
