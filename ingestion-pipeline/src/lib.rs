#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

pub mod batch_source;
pub mod pipeline;

pub use batch_source::{open_corpus, BatchSource, JsonLinesCorpus, ParquetCorpus};
pub use pipeline::{
    BulkIngestionOrchestrator, IngestionConfig, IngestionReport, IngestionTally, IngestionTuning,
};
