use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppError;

use super::types::{
    bulk::{BulkReport, IndexCreation},
    document::Document,
    search_hit::StoreHit,
};

/// Raw contract of the external document store. Implementations perform a single
/// request per call; retries live in [`super::adapter::DocumentStoreAdapter`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Engine name reported as the `source` of search hits.
    fn source_name(&self) -> &'static str;

    /// Creates `index` with `schema`. An existing index is reported, never overwritten.
    async fn create_index(&self, index: &str, schema: &Value) -> Result<IndexCreation, AppError>;

    async fn bulk_write(&self, index: &str, documents: &[Document])
        -> Result<BulkReport, AppError>;

    async fn get_by_id(&self, index: &str, id: &str) -> Result<Option<Document>, AppError>;

    /// Ranked search; `query` is a store query DSL object.
    async fn search(
        &self,
        index: &str,
        query: &Value,
        size: usize,
        offset: usize,
    ) -> Result<Vec<StoreHit>, AppError>;

    /// Returns whether the store acknowledged the update.
    async fn update_index_settings(&self, index: &str, settings: &Value)
        -> Result<bool, AppError>;
}
