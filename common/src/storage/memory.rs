use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppError;

use super::{
    document_store::DocumentStore,
    types::{
        bulk::{BulkItemResult, BulkReport, IndexCreation},
        document::Document,
        search_hit::StoreHit,
    },
};

/// Start or end of one bulk write, keyed by the first document id of the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkEvent {
    Started(String),
    Finished(String),
}

/// In-process document store with knobs for exercising the retry and
/// concurrency paths of callers.
#[derive(Default)]
pub struct MemoryDocumentStore {
    indexes: Mutex<HashMap<String, BTreeMap<String, Document>>>,
    settings_updates: Mutex<Vec<(String, Value)>>,
    rejected_ids: Mutex<HashSet<String>>,
    bulk_delay: Mutex<Duration>,
    slow_ids: Mutex<HashMap<String, Duration>>,
    bulk_events: Mutex<Vec<BulkEvent>>,
    withhold_ack: AtomicBool,
    failing_bulk_writes: AtomicUsize,
    index_creations: AtomicUsize,
    bulk_write_calls: AtomicUsize,
    search_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` bulk writes fail with a transport error.
    pub fn fail_next_bulk_writes(&self, count: usize) {
        self.failing_bulk_writes.store(count, Ordering::SeqCst);
    }

    /// Documents with these ids are reported as per-item failures.
    pub fn reject_ids<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        lock(&self.rejected_ids).extend(ids.into_iter().map(Into::into));
    }

    pub fn set_acknowledge(&self, acknowledge: bool) {
        self.withhold_ack.store(!acknowledge, Ordering::SeqCst);
    }

    pub fn set_bulk_delay(&self, delay: Duration) {
        *lock(&self.bulk_delay) = delay;
    }

    /// Bulk writes containing `id` sleep for `delay` instead of the shared delay.
    pub fn set_bulk_delay_for(&self, id: impl Into<String>, delay: Duration) {
        lock(&self.slow_ids).insert(id.into(), delay);
    }

    pub fn insert(&self, index: &str, document: Document) {
        lock(&self.indexes)
            .entry(index.to_string())
            .or_default()
            .insert(document.id.clone(), document);
    }

    pub fn index_creations(&self) -> usize {
        self.index_creations.load(Ordering::SeqCst)
    }

    pub fn bulk_write_calls(&self) -> usize {
        self.bulk_write_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Highest number of bulk writes observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn document_count(&self, index: &str) -> usize {
        lock(&self.indexes).get(index).map_or(0, BTreeMap::len)
    }

    pub fn settings_updates(&self) -> Vec<(String, Value)> {
        lock(&self.settings_updates).clone()
    }

    pub fn bulk_events(&self) -> Vec<BulkEvent> {
        lock(&self.bulk_events).clone()
    }

    fn delay_for(&self, documents: &[Document]) -> Duration {
        let slow_ids = lock(&self.slow_ids);
        documents
            .iter()
            .find_map(|document| slow_ids.get(&document.id).copied())
            .unwrap_or_else(|| *lock(&self.bulk_delay))
    }

    fn take_failure(&self) -> bool {
        self.failing_bulk_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
    }

    fn write_documents(&self, index: &str, documents: &[Document]) -> BulkReport {
        let rejected = lock(&self.rejected_ids).clone();
        let mut indexes = lock(&self.indexes);
        let target = indexes.entry(index.to_string()).or_default();

        let items = documents
            .iter()
            .map(|document| {
                if rejected.contains(&document.id) {
                    return BulkItemResult {
                        id: document.id.clone(),
                        error: Some(format!("document {} rejected", document.id)),
                    };
                }
                target.insert(document.id.clone(), document.clone());
                BulkItemResult {
                    id: document.id.clone(),
                    error: None,
                }
            })
            .collect();

        BulkReport { items }
    }
}

/// Counts how many query terms occur in `text`.
fn term_matches(terms: &[String], text: &str) -> usize {
    let text = text.to_lowercase();
    terms.iter().filter(|term| text.contains(term.as_str())).count()
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn source_name(&self) -> &'static str {
        "memory"
    }

    async fn create_index(&self, index: &str, _schema: &Value) -> Result<IndexCreation, AppError> {
        if self.withhold_ack.load(Ordering::SeqCst) {
            return Ok(IndexCreation::NotAcknowledged);
        }

        let mut indexes = lock(&self.indexes);
        if indexes.contains_key(index) {
            return Ok(IndexCreation::AlreadyExists);
        }
        indexes.insert(index.to_string(), BTreeMap::new());
        self.index_creations.fetch_add(1, Ordering::SeqCst);
        Ok(IndexCreation::Created)
    }

    async fn bulk_write(
        &self,
        index: &str,
        documents: &[Document],
    ) -> Result<BulkReport, AppError> {
        self.bulk_write_calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let label = documents
            .first()
            .map(|document| document.id.clone())
            .unwrap_or_default();
        lock(&self.bulk_events).push(BulkEvent::Started(label.clone()));

        let delay = self.delay_for(documents);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = if self.take_failure() {
            Err(AppError::Transport("connection reset by peer".to_string()))
        } else {
            Ok(self.write_documents(index, documents))
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        lock(&self.bulk_events).push(BulkEvent::Finished(label));
        result
    }

    async fn get_by_id(&self, index: &str, id: &str) -> Result<Option<Document>, AppError> {
        Ok(lock(&self.indexes)
            .get(index)
            .and_then(|documents| documents.get(id))
            .cloned())
    }

    async fn search(
        &self,
        index: &str,
        query: &Value,
        size: usize,
        offset: usize,
    ) -> Result<Vec<StoreHit>, AppError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let text = query
            .pointer("/multi_match/query")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let terms: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let indexes = lock(&self.indexes);
        let Some(documents) = indexes.get(index) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<StoreHit> = documents
            .values()
            .filter_map(|document| {
                let title = term_matches(&terms, &document.title);
                let body = term_matches(&terms, &document.body);
                let matches = title.saturating_mul(2).saturating_add(body);
                #[allow(clippy::cast_precision_loss)]
                let score = matches as f32;
                (matches > 0).then(|| StoreHit {
                    score,
                    document: document.clone(),
                })
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.document.id.cmp(&b.document.id)));

        Ok(hits.into_iter().skip(offset).take(size).collect())
    }

    async fn update_index_settings(
        &self,
        index: &str,
        settings: &Value,
    ) -> Result<bool, AppError> {
        lock(&self.settings_updates).push((index.to_string(), settings.clone()));
        Ok(!self.withhold_ack.load(Ordering::SeqCst))
    }
}
