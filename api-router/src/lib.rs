use api_state::ApiState;
use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use routes::{
    cache::recent_queries,
    document::get_document,
    liveness::live,
    search::{search_api, search_page},
};
use tower_http::trace::TraceLayer;

pub mod api_state;
pub mod error;
mod routes;

/// Search, document and cache-inspection endpoints plus the health check.
pub fn api_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    Router::new()
        .route("/health", get(live))
        .route("/api/search", post(search_api))
        .route("/search", get(search_page))
        .route("/document/{id}", get(get_document))
        .route("/cache/recent", get(recent_queries))
        .layer(TraceLayer::new_for_http())
}
