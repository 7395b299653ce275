use std::{sync::Arc, time::Duration};

use common::{
    error::AppError,
    storage::{
        adapter::DocumentStoreAdapter,
        document_store::DocumentStore,
        indexes::corpus_index_schema,
        memory::{BulkEvent, MemoryDocumentStore},
        types::{bulk::IndexCreation, document::RawRecord},
    },
    utils::retry::RetryPolicy,
};
use futures::stream::{self, StreamExt};
use serde_json::json;

use super::{BulkIngestionOrchestrator, IngestionConfig, IngestionTally, IngestionTuning};
use crate::batch_source::{Batch, BatchSource, BatchStream};

const INDEX: &str = "msmarco-docs";

struct VecBatchSource {
    batches: Vec<Batch>,
    fail_after: Option<usize>,
}

impl VecBatchSource {
    fn new(batches: Vec<Batch>) -> Self {
        Self {
            batches,
            fail_after: None,
        }
    }

    fn of_sizes(sizes: &[usize]) -> Self {
        let mut next_id = 0usize;
        let batches = sizes
            .iter()
            .map(|size| {
                (0..*size)
                    .map(|_| {
                        next_id += 1;
                        record(&format!("D{next_id}"))
                    })
                    .collect()
            })
            .collect();
        Self::new(batches)
    }
}

impl BatchSource for VecBatchSource {
    fn batches(&self) -> BatchStream<'_> {
        let batches: Vec<Result<Batch, AppError>> = self
            .batches
            .iter()
            .cloned()
            .map(Ok)
            .take(self.fail_after.unwrap_or(usize::MAX))
            .chain(
                self.fail_after
                    .map(|_| Err(AppError::Io(std::io::Error::other("corpus truncated")))),
            )
            .collect();
        stream::iter(batches).boxed()
    }
}

fn record(id: &str) -> RawRecord {
    json!({"docid": id, "url": "https://example.org", "title": format!("title {id}"), "body": "body"})
}

fn orchestrator(
    store: &Arc<MemoryDocumentStore>,
    max_attempts: usize,
    max_concurrent_batches: usize,
) -> BulkIngestionOrchestrator {
    let adapter = DocumentStoreAdapter::new(
        Arc::clone(store) as Arc<dyn DocumentStore>,
        RetryPolicy::new(max_attempts, Duration::from_millis(1)),
    );
    BulkIngestionOrchestrator::new(
        adapter,
        IngestionConfig {
            tuning: IngestionTuning {
                batch_size: 10,
                max_concurrent_batches,
            },
            index_name: INDEX.to_string(),
        },
    )
}

#[tokio::test]
async fn tally_counts_invalid_records_as_errors() {
    let store = Arc::new(MemoryDocumentStore::new());
    let mut source = VecBatchSource::of_sizes(&[3, 2, 4]);
    source.batches[1][1] = json!({"title": "no identifier", "body": "orphan"});

    let report = orchestrator(&store, 3, 2)
        .run(&corpus_index_schema(), &source)
        .await
        .expect("ingestion");

    assert_eq!(
        report.tally,
        IngestionTally {
            processed: 9,
            success: 8,
            errors: 1
        }
    );
    assert_eq!(report.index_creation, IndexCreation::Created);
    assert_eq!(store.document_count(INDEX), 8);
}

#[tokio::test]
async fn never_exceeds_window_of_outstanding_writes() {
    let store = Arc::new(MemoryDocumentStore::new());
    store.set_bulk_delay(Duration::from_millis(10));
    let source = VecBatchSource::of_sizes(&[1; 11]);

    let report = orchestrator(&store, 1, 3)
        .run(&corpus_index_schema(), &source)
        .await
        .expect("ingestion");

    assert_eq!(report.tally.success, 11);
    assert_eq!(store.bulk_write_calls(), 11);
    assert!(store.max_in_flight() <= 3, "saw {}", store.max_in_flight());
    assert!(store.max_in_flight() >= 1);
}

#[tokio::test]
async fn window_drains_fully_before_next_batch() {
    let store = Arc::new(MemoryDocumentStore::new());
    store.set_bulk_delay_for("D1", Duration::from_millis(50));
    let source = VecBatchSource::of_sizes(&[1, 1, 1]);

    let report = orchestrator(&store, 1, 2)
        .run(&corpus_index_schema(), &source)
        .await
        .expect("ingestion");
    assert_eq!(report.tally.success, 3);

    let events = store.bulk_events();
    let position = |event: BulkEvent| {
        events
            .iter()
            .position(|seen| *seen == event)
            .unwrap_or_else(|| panic!("missing {event:?} in {events:?}"))
    };
    // D2 finishes early, yet D3 waits for the slow D1.
    assert!(position(BulkEvent::Finished("D2".into())) < position(BulkEvent::Finished("D1".into())));
    assert!(position(BulkEvent::Finished("D1".into())) < position(BulkEvent::Started("D3".into())));
}

#[tokio::test]
async fn finalizes_once_when_a_unit_exhausts_retries() {
    let store = Arc::new(MemoryDocumentStore::new());
    store.fail_next_bulk_writes(2);
    let source = VecBatchSource::of_sizes(&[2]);

    let report = orchestrator(&store, 2, 1)
        .run(&corpus_index_schema(), &source)
        .await
        .expect("job completes even when a unit fails");

    assert_eq!(report.tally, IngestionTally::failed(2));
    assert_eq!(store.bulk_write_calls(), 2);
    let updates = store.settings_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, INDEX);
    assert_eq!(updates[0].1["index"]["number_of_replicas"], 1);
}

#[tokio::test]
async fn failed_unit_does_not_abort_siblings() {
    let store = Arc::new(MemoryDocumentStore::new());
    store.fail_next_bulk_writes(1);
    let source = VecBatchSource::of_sizes(&[2, 2, 2]);

    let report = orchestrator(&store, 1, 1)
        .run(&corpus_index_schema(), &source)
        .await
        .expect("ingestion");

    assert_eq!(
        report.tally,
        IngestionTally {
            processed: 6,
            success: 4,
            errors: 2
        }
    );
    assert!(report.tally.is_consistent());
}

#[tokio::test]
async fn per_item_store_errors_are_counted() {
    let store = Arc::new(MemoryDocumentStore::new());
    store.reject_ids(["D2"]);
    let source = VecBatchSource::of_sizes(&[3]);

    let report = orchestrator(&store, 1, 2)
        .run(&corpus_index_schema(), &source)
        .await
        .expect("ingestion");

    assert_eq!(report.tally.success, 2);
    assert_eq!(report.tally.errors, 1);
}

#[tokio::test]
async fn second_run_reuses_existing_index() {
    let store = Arc::new(MemoryDocumentStore::new());
    let orchestrator = orchestrator(&store, 1, 2);

    let first = orchestrator
        .run(&corpus_index_schema(), &VecBatchSource::new(Vec::new()))
        .await
        .expect("first run");
    let second = orchestrator
        .run(&corpus_index_schema(), &VecBatchSource::new(Vec::new()))
        .await
        .expect("second run");

    assert_eq!(first.index_creation, IndexCreation::Created);
    assert_eq!(second.index_creation, IndexCreation::AlreadyExists);
    assert_eq!(store.index_creations(), 1);
    assert_eq!(store.bulk_write_calls(), 0);
    assert_ne!(first.job_id, second.job_id);
}

#[tokio::test]
async fn unacknowledged_index_aborts_but_still_finalizes() {
    let store = Arc::new(MemoryDocumentStore::new());
    store.set_acknowledge(false);
    let source = VecBatchSource::of_sizes(&[2]);

    let err = orchestrator(&store, 1, 2)
        .run(&corpus_index_schema(), &source)
        .await
        .expect_err("not acknowledged");

    assert!(matches!(err, AppError::Configuration(_)));
    assert_eq!(store.bulk_write_calls(), 0);
    assert_eq!(store.settings_updates().len(), 1);
}

#[tokio::test]
async fn source_error_waits_for_window_then_fails() {
    let store = Arc::new(MemoryDocumentStore::new());
    let mut source = VecBatchSource::of_sizes(&[2, 2, 2]);
    source.fail_after = Some(2);

    let err = orchestrator(&store, 1, 5)
        .run(&corpus_index_schema(), &source)
        .await
        .expect_err("source failure");

    assert!(matches!(err, AppError::Io(_)));
    assert_eq!(store.document_count(INDEX), 4);
    assert_eq!(store.settings_updates().len(), 1);
}

#[tokio::test]
async fn batch_of_only_invalid_records_skips_the_store() {
    let store = Arc::new(MemoryDocumentStore::new());
    let source = VecBatchSource::new(vec![vec![json!("garbage"), json!({"docid": ""})]]);

    let report = orchestrator(&store, 1, 2)
        .run(&corpus_index_schema(), &source)
        .await
        .expect("ingestion");

    assert_eq!(report.tally, IngestionTally::failed(2));
    assert_eq!(store.bulk_write_calls(), 0);
}
