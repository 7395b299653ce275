mod config;
mod tally;

#[cfg(test)]
mod tests;

pub use config::{IngestionConfig, IngestionTuning};
pub use tally::IngestionTally;

use std::time::{Duration, Instant};

use common::{
    error::AppError,
    storage::{
        adapter::DocumentStoreAdapter,
        types::{bulk::IndexCreation, document::Document},
    },
    utils::retry::RetryOutcome,
};
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::batch_source::{Batch, BatchSource};

/// Summary of one ingestion job.
#[derive(Debug, Clone)]
pub struct IngestionReport {
    pub job_id: Uuid,
    pub index_creation: IndexCreation,
    pub tally: IngestionTally,
    pub elapsed: Duration,
}

/// Drains a batch source into the document store with at most
/// `max_concurrent_batches` bulk writes in flight.
pub struct BulkIngestionOrchestrator {
    store: DocumentStoreAdapter,
    config: IngestionConfig,
}

impl BulkIngestionOrchestrator {
    pub fn new(store: DocumentStoreAdapter, config: IngestionConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    /// Runs one job: prepares the index, loads every batch and finally restores
    /// serving settings, whether or not the load succeeded.
    pub async fn run(
        &self,
        schema: &Value,
        source: &dyn BatchSource,
    ) -> Result<IngestionReport, AppError> {
        self.run_job(Uuid::new_v4(), schema, source).await
    }

    #[tracing::instrument(
        skip_all,
        fields(
            job_id = %job_id,
            index = %self.config.index_name,
            max_concurrent_batches = self.config.tuning.max_concurrent_batches
        )
    )]
    async fn run_job(
        &self,
        job_id: Uuid,
        schema: &Value,
        source: &dyn BatchSource,
    ) -> Result<IngestionReport, AppError> {
        let started = Instant::now();
        let mut tally = IngestionTally::default();

        let outcome = self.load(schema, source, &mut tally).await;
        self.finalize().await;

        info!(
            processed = tally.processed,
            success = tally.success,
            errors = tally.errors,
            elapsed_ms = started.elapsed().as_millis(),
            "Indexing completed"
        );

        let index_creation = outcome.inspect_err(|err| {
            error!(error = %err, "Ingestion job aborted");
        })?;

        Ok(IngestionReport {
            job_id,
            index_creation,
            tally,
            elapsed: started.elapsed(),
        })
    }

    async fn load(
        &self,
        schema: &Value,
        source: &dyn BatchSource,
        tally: &mut IngestionTally,
    ) -> Result<IndexCreation, AppError> {
        let index_creation = self
            .store
            .create_index(&self.config.index_name, schema)
            .await?;

        let window_size = self.config.tuning.max_concurrent_batches.max(1);
        let mut window: JoinSet<IngestionTally> = JoinSet::new();
        let mut batches = source.batches();
        let mut read_error = None;

        while let Some(next) = batches.next().await {
            let batch = match next {
                Ok(batch) => batch,
                Err(err) => {
                    read_error = Some(err);
                    break;
                }
            };

            let (documents, invalid) = validate_batch(batch);
            if documents.is_empty() {
                tally.absorb(IngestionTally {
                    processed: invalid,
                    success: 0,
                    errors: invalid,
                });
                continue;
            }

            let store = self.store.clone();
            let index = self.config.index_name.clone();
            window.spawn(async move { write_unit(store, index, documents, invalid).await });

            if window.len() >= window_size {
                drain_window(&mut window, tally).await;
            }
        }

        drain_window(&mut window, tally).await;

        match read_error {
            Some(err) => Err(err),
            None => Ok(index_creation),
        }
    }

    async fn finalize(&self) {
        if let Err(err) = self
            .store
            .restore_serving_settings(&self.config.index_name)
            .await
        {
            error!(error = %err, "Error resetting index settings");
        }
    }
}

/// Splits a raw batch into valid documents and a count of rejected records.
fn validate_batch(batch: Batch) -> (Vec<Document>, usize) {
    let mut invalid = 0usize;
    let documents = batch
        .iter()
        .filter_map(|record| match Document::from_record(record) {
            Ok(document) => Some(document),
            Err(err) => {
                warn!(error = %err, "Skipping invalid record");
                invalid = invalid.saturating_add(1);
                None
            }
        })
        .collect();
    (documents, invalid)
}

async fn write_unit(
    store: DocumentStoreAdapter,
    index: String,
    documents: Vec<Document>,
    invalid: usize,
) -> IngestionTally {
    let processed = documents.len().saturating_add(invalid);

    match store.bulk_write_with_retry(&index, &documents).await {
        RetryOutcome::Succeeded { value: report, .. } => {
            for failure in report.failures() {
                error!(
                    doc_id = %failure.id,
                    error = failure.error.as_deref().unwrap_or_default(),
                    "Error indexing document"
                );
            }
            IngestionTally {
                processed,
                success: report.success_count(),
                errors: report.error_count().saturating_add(invalid),
            }
        }
        RetryOutcome::Exhausted { error, attempts } | RetryOutcome::Rejected { error, attempts } => {
            error!(
                documents = documents.len(),
                attempts,
                error = %error,
                "Bulk write failed, counting batch as errors"
            );
            IngestionTally::failed(processed)
        }
    }
}

async fn drain_window(window: &mut JoinSet<IngestionTally>, tally: &mut IngestionTally) {
    while let Some(joined) = window.join_next().await {
        match joined {
            Ok(unit) => tally.absorb(unit),
            Err(err) => {
                let err = AppError::from(err);
                error!(error = %err, "Error processing batch");
            }
        }
    }
}
