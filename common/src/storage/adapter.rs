use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::{
    error::AppError,
    utils::retry::{retry_with_policy, RetryOutcome, RetryPolicy},
};

use super::{
    document_store::DocumentStore,
    indexes::serving_settings,
    types::{
        bulk::{BulkReport, IndexCreation},
        document::Document,
        search_hit::StoreHit,
    },
};

/// Retrying front for a [`DocumentStore`]. Transport failures are retried under
/// the configured policy; store-side rejections surface immediately.
#[derive(Clone)]
pub struct DocumentStoreAdapter {
    store: Arc<dyn DocumentStore>,
    policy: RetryPolicy,
}

impl DocumentStoreAdapter {
    pub fn new(store: Arc<dyn DocumentStore>, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn source_name(&self) -> &'static str {
        self.store.source_name()
    }

    /// Creates the index unless it exists. An unacknowledged creation is fatal.
    pub async fn create_index(&self, index: &str, schema: &Value) -> Result<IndexCreation, AppError> {
        let creation = retry_with_policy(
            &self.policy,
            "create_index",
            AppError::is_transient,
            || self.store.create_index(index, schema),
        )
        .await
        .into_result()?;

        match creation {
            IndexCreation::Created => info!(index, "Created index"),
            IndexCreation::AlreadyExists => info!(index, "Index already exists, leaving it untouched"),
            IndexCreation::NotAcknowledged => {
                return Err(AppError::Configuration(format!(
                    "creation of index '{index}' was not acknowledged"
                )));
            }
        }

        Ok(creation)
    }

    /// Bulk write with retries. The caller decides what an exhausted outcome means
    /// for the documents in the batch.
    pub async fn bulk_write_with_retry(
        &self,
        index: &str,
        documents: &[Document],
    ) -> RetryOutcome<BulkReport, AppError> {
        retry_with_policy(
            &self.policy,
            "bulk_write",
            AppError::is_transient,
            || self.store.bulk_write(index, documents),
        )
        .await
    }

    pub async fn get_document(&self, index: &str, id: &str) -> Result<Option<Document>, AppError> {
        retry_with_policy(
            &self.policy,
            "get_document",
            AppError::is_transient,
            || self.store.get_by_id(index, id),
        )
        .await
        .into_result()
    }

    pub async fn search(
        &self,
        index: &str,
        query: &Value,
        size: usize,
        offset: usize,
    ) -> Result<Vec<StoreHit>, AppError> {
        retry_with_policy(
            &self.policy,
            "search",
            AppError::is_transient,
            || self.store.search(index, query, size, offset),
        )
        .await
        .into_result()
    }

    /// Puts the index back to steady-state refresh and replica settings.
    pub async fn restore_serving_settings(&self, index: &str) -> Result<(), AppError> {
        let settings = serving_settings();
        let acknowledged = retry_with_policy(
            &self.policy,
            "update_index_settings",
            AppError::is_transient,
            || self.store.update_index_settings(index, &settings),
        )
        .await
        .into_result()?;

        if acknowledged {
            info!(index, "Restored serving settings");
        } else {
            warn!(index, "Serving settings update was not acknowledged");
        }
        Ok(())
    }
}
