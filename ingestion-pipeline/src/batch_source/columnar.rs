use std::{
    fs::File,
    path::{Path, PathBuf},
};

use arrow_array::{Array, ArrayRef, Int64Array, LargeStringArray, RecordBatch, StringArray};
use common::{error::AppError, storage::types::document::RawRecord};
use futures::{stream, StreamExt};
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use serde_json::{Map, Value};
use tracing::debug;

use super::{ensure_file, Batch, BatchSource, BatchStream};

const ID_COLUMN: &str = "docid";
const TEXT_COLUMNS: [&str; 2] = ["title", "body"];

/// Reads a Parquet corpus with `docid`, `title` and `body` columns in slices of
/// `batch_size` rows. Other columns are ignored.
#[derive(Debug, Clone)]
pub struct ParquetCorpus {
    path: PathBuf,
    batch_size: usize,
}

impl ParquetCorpus {
    pub fn new(path: impl AsRef<Path>, batch_size: usize) -> Result<Self, AppError> {
        Ok(Self {
            path: ensure_file(path.as_ref())?,
            batch_size: batch_size.max(1),
        })
    }
}

fn open_reader(path: &Path, batch_size: usize) -> Result<ParquetRecordBatchReader, AppError> {
    let file = File::open(path)?;
    ParquetRecordBatchReaderBuilder::try_new(file)
        .and_then(|builder| builder.with_batch_size(batch_size).build())
        .map_err(|err| AppError::Corpus(format!("cannot open {}: {err}", path.display())))
}

/// Reads a cell as JSON. Nulls and unsupported column types become `Null`,
/// which record validation rejects for the id and treats as empty for text.
fn cell(column: Option<&ArrayRef>, row: usize) -> Value {
    let Some(column) = column else {
        return Value::Null;
    };
    if column.is_null(row) {
        return Value::Null;
    }

    let values = column.as_any();
    if let Some(values) = values.downcast_ref::<StringArray>() {
        Value::String(values.value(row).to_string())
    } else if let Some(values) = values.downcast_ref::<LargeStringArray>() {
        Value::String(values.value(row).to_string())
    } else if let Some(values) = values.downcast_ref::<Int64Array>() {
        Value::String(values.value(row).to_string())
    } else {
        Value::Null
    }
}

fn to_records(batch: &RecordBatch) -> Result<Batch, AppError> {
    let ids = batch
        .column_by_name(ID_COLUMN)
        .ok_or_else(|| AppError::Validation(format!("corpus has no '{ID_COLUMN}' column")))?;
    let texts = TEXT_COLUMNS.map(|name| batch.column_by_name(name));

    Ok((0..batch.num_rows())
        .map(|row| {
            let mut record = Map::new();
            record.insert(ID_COLUMN.to_string(), cell(Some(ids), row));
            for (name, column) in TEXT_COLUMNS.iter().zip(texts) {
                record.insert((*name).to_string(), cell(column, row));
            }
            RawRecord::Object(record)
        })
        .collect())
}

impl BatchSource for ParquetCorpus {
    fn batches(&self) -> BatchStream<'_> {
        let path = self.path.clone();
        let batch_size = self.batch_size;

        stream::try_unfold(None::<ParquetRecordBatchReader>, move |reader| {
            let path = path.clone();
            async move {
                // Decoding is blocking work.
                let (reader, next) = tokio::task::spawn_blocking(move || {
                    let mut reader = match reader {
                        Some(reader) => reader,
                        None => open_reader(&path, batch_size)?,
                    };
                    let next = reader
                        .next()
                        .transpose()
                        .map_err(|err| AppError::Corpus(err.to_string()))?;
                    Ok::<_, AppError>((reader, next))
                })
                .await??;

                let Some(batch) = next else {
                    return Ok(None);
                };
                let records = to_records(&batch)?;
                debug!(records = records.len(), "Read corpus batch");
                Ok(Some((records, Some(reader))))
            }
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow_schema::{DataType, Field, Schema};
    use futures::TryStreamExt;
    use parquet::arrow::ArrowWriter;

    use super::*;

    type Row<'a> = (Option<&'a str>, &'a str, &'a str);

    fn write_parquet(schema: Schema, columns: Vec<ArrayRef>) -> tempfile::NamedTempFile {
        let file = tempfile::Builder::new()
            .suffix(".parquet")
            .tempfile()
            .expect("temp file");
        let schema = Arc::new(schema);
        let batch = RecordBatch::try_new(Arc::clone(&schema), columns).expect("record batch");

        let sink = file.as_file().try_clone().expect("file handle");
        let mut writer = ArrowWriter::try_new(sink, schema, None).expect("writer");
        writer.write(&batch).expect("write batch");
        writer.close().expect("close writer");
        file
    }

    fn corpus(rows: &[Row<'_>]) -> tempfile::NamedTempFile {
        let schema = Schema::new(vec![
            Field::new("docid", DataType::Utf8, true),
            Field::new("url", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, false),
            Field::new("body", DataType::Utf8, false),
        ]);
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(rows.iter().map(|row| row.0).collect::<Vec<_>>())),
            Arc::new(StringArray::from(vec!["https://example.org"; rows.len()])),
            Arc::new(StringArray::from(rows.iter().map(|row| row.1).collect::<Vec<_>>())),
            Arc::new(StringArray::from(rows.iter().map(|row| row.2).collect::<Vec<_>>())),
        ];
        write_parquet(schema, columns)
    }

    #[tokio::test]
    async fn yields_row_slices_of_batch_size() {
        let file = corpus(&[
            (Some("D1"), "t1", "b1"),
            (Some("D2"), "t2", "b2"),
            (Some("D3"), "t3", "b3"),
            (Some("D4"), "t4", "b4"),
            (Some("D5"), "t5", "b5"),
        ]);
        let reader = ParquetCorpus::new(file.path(), 2).expect("reader");

        let batches: Vec<Batch> = reader.batches().try_collect().await.expect("batches");
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(
            batches[2][0],
            serde_json::json!({"docid": "D5", "title": "t5", "body": "b5"})
        );
    }

    #[tokio::test]
    async fn null_ids_reach_validation_as_null() {
        let file = corpus(&[(Some("D1"), "t1", "b1"), (None, "t2", "b2")]);
        let reader = ParquetCorpus::new(file.path(), 10).expect("reader");

        let batches: Vec<Batch> = reader.batches().try_collect().await.expect("batches");
        assert_eq!(batches[0][1]["docid"], Value::Null);
        assert_eq!(batches[0][1]["title"], "t2");
    }

    #[tokio::test]
    async fn each_pass_restarts_from_the_beginning() {
        let file = corpus(&[(Some("D1"), "t1", "b1"), (Some("D2"), "t2", "b2")]);
        let reader = ParquetCorpus::new(file.path(), 1).expect("reader");

        let first: Vec<Batch> = reader.batches().try_collect().await.expect("first pass");
        let second: Vec<Batch> = reader.batches().try_collect().await.expect("second pass");
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn missing_id_column_fails_the_stream() {
        let schema = Schema::new(vec![Field::new("title", DataType::Utf8, false)]);
        let columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from(vec!["orphan"]))];
        let file = write_parquet(schema, columns);
        let reader = ParquetCorpus::new(file.path(), 10).expect("reader");

        let result: Result<Vec<Batch>, AppError> = reader.batches().try_collect().await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn missing_file_is_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = ParquetCorpus::new(dir.path().join("dataset.parquet"), 10).expect_err("missing");
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
