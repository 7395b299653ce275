use std::sync::Arc;

use common::storage::adapter::DocumentStoreAdapter;

use super::{
    config::{RetrievalTuning, SearchType},
    stages::{QueryParserStage, TextSearchStage},
    BoxedStage, SearchPipeline,
};
use crate::query_parser::QueryParser;

/// Builds the ordered stage list for each search type from shared handles.
#[derive(Clone)]
pub struct SearchStrategyDriver {
    parser: Arc<QueryParser>,
    store: DocumentStoreAdapter,
    tuning: RetrievalTuning,
}

impl SearchStrategyDriver {
    pub fn new(parser: Arc<QueryParser>, store: DocumentStoreAdapter, tuning: RetrievalTuning) -> Self {
        Self {
            parser,
            store,
            tuning,
        }
    }

    pub fn stages(&self, search_type: SearchType) -> Vec<BoxedStage> {
        match search_type {
            // There is no vector backend, so semantic and hybrid requests fall
            // back to lexical retrieval.
            SearchType::Text | SearchType::Hybrid | SearchType::Semantic => vec![
                Box::new(QueryParserStage::new(Arc::clone(&self.parser))),
                Box::new(TextSearchStage::new(self.store.clone(), self.tuning.clone())),
            ],
        }
    }

    pub fn pipeline(&self, search_type: SearchType) -> SearchPipeline {
        SearchPipeline::new(self.stages(search_type))
    }
}
