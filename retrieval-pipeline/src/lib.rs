pub mod models;
pub mod pipeline;
pub mod query_parser;
pub mod service;

pub use models::{SearchPage, SearchRequest, SearchResponse};
pub use pipeline::{
    PipelineStageTimings, RetrievalTuning, SearchContext, SearchPipeline, SearchStrategyDriver,
    SearchType,
};
pub use query_parser::{ParsedQuery, QueryParser};
pub use service::SearchService;
