use std::sync::Arc;

use async_trait::async_trait;
use common::{
    error::AppError,
    storage::{adapter::DocumentStoreAdapter, types::search_hit::SearchHit},
};
use serde_json::{json, Value};
use tracing::debug;

use crate::query_parser::QueryParser;

use super::{config::RetrievalTuning, PipelineStage, SearchContext, StageKind};

/// Fills `parsed_query` from the original query text.
#[derive(Debug, Clone)]
pub struct QueryParserStage {
    parser: Arc<QueryParser>,
}

impl QueryParserStage {
    pub fn new(parser: Arc<QueryParser>) -> Self {
        Self { parser }
    }
}

#[async_trait]
impl PipelineStage for QueryParserStage {
    fn kind(&self) -> StageKind {
        StageKind::Parse
    }

    async fn process(&self, mut ctx: SearchContext) -> Result<SearchContext, AppError> {
        ctx.parsed_query = Some(self.parser.parse(&ctx.original_query));
        Ok(ctx)
    }
}

/// Lexical retrieval against the document store.
#[derive(Clone)]
pub struct TextSearchStage {
    store: DocumentStoreAdapter,
    tuning: RetrievalTuning,
}

impl TextSearchStage {
    pub fn new(store: DocumentStoreAdapter, tuning: RetrievalTuning) -> Self {
        Self { store, tuning }
    }
}

/// `multi_match` query over title and body, title weighted higher.
pub fn build_text_query(query_text: &str, tuning: &RetrievalTuning) -> Value {
    json!({
        "multi_match": {
            "query": query_text,
            "fields": [format!("title^{}", tuning.title_boost), "body"],
            "type": "best_fields",
            "boost": tuning.query_boost
        }
    })
}

#[async_trait]
impl PipelineStage for TextSearchStage {
    fn kind(&self) -> StageKind {
        StageKind::TextSearch
    }

    async fn process(&self, mut ctx: SearchContext) -> Result<SearchContext, AppError> {
        let query_text = ctx.query_text();
        let hits: Vec<SearchHit> = if query_text.is_empty() {
            debug!("Empty query text, skipping store search");
            Vec::new()
        } else {
            let query = build_text_query(query_text, &self.tuning);
            let source = self.store.source_name();
            self.store
                .search(&self.tuning.index_name, &query, self.tuning.result_limit, 0)
                .await?
                .into_iter()
                .map(|hit| SearchHit::from_store_hit(hit, source))
                .collect()
        };

        debug!(hits = hits.len(), "Text search finished");
        ctx.text_results = Some(hits.clone());
        ctx.final_results = Some(hits);
        Ok(ctx)
    }
}
