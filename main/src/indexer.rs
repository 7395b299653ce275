use std::sync::Arc;

use common::{
    storage::{
        adapter::DocumentStoreAdapter, document_store::DocumentStore,
        elasticsearch::ElasticsearchClient, indexes::corpus_index_schema,
    },
    utils::config::get_config,
};
use ingestion_pipeline::{open_corpus, BulkIngestionOrchestrator, IngestionConfig};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let config = get_config()?;
    let ingestion_config = IngestionConfig::from_config(&config);

    let store = DocumentStoreAdapter::new(
        Arc::new(ElasticsearchClient::from_config(&config)?) as Arc<dyn DocumentStore>,
        config.store_retry_policy(),
    );
    let corpus = open_corpus(&config.corpus_path, ingestion_config.tuning.batch_size)?;
    info!(corpus = %config.corpus_path, index = %ingestion_config.index_name, "Starting indexer");

    let orchestrator = BulkIngestionOrchestrator::new(store, ingestion_config);
    let report = orchestrator.run(&corpus_index_schema(), corpus.as_ref()).await?;

    info!(
        job_id = %report.job_id,
        processed = report.tally.processed,
        success = report.tally.success,
        errors = report.tally.errors,
        elapsed_secs = report.elapsed.as_secs_f64(),
        "Indexer finished"
    );

    Ok(())
}
