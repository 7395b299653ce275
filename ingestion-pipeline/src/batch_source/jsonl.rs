use std::path::{Path, PathBuf};

use common::{error::AppError, storage::types::document::RawRecord};
use futures::{stream, StreamExt};
use serde_json::Value;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader, Lines},
};
use tracing::debug;

use super::{ensure_file, BatchSource, BatchStream};

/// Reads a JSON Lines corpus (`{docid, url, title, body}` per line) in fixed-size batches.
#[derive(Debug, Clone)]
pub struct JsonLinesCorpus {
    path: PathBuf,
    batch_size: usize,
}

impl JsonLinesCorpus {
    pub fn new(path: impl AsRef<Path>, batch_size: usize) -> Result<Self, AppError> {
        Ok(Self {
            path: ensure_file(path.as_ref())?,
            batch_size: batch_size.max(1),
        })
    }
}

/// Lines that are not JSON are kept as strings so validation rejects them.
fn parse_line(line: &str) -> RawRecord {
    serde_json::from_str(line).unwrap_or_else(|_| Value::String(line.to_string()))
}

impl BatchSource for JsonLinesCorpus {
    fn batches(&self) -> BatchStream<'_> {
        let path = self.path.clone();
        let batch_size = self.batch_size;

        stream::try_unfold(None::<Lines<BufReader<File>>>, move |lines| {
            let path = path.clone();
            async move {
                let mut lines = match lines {
                    Some(lines) => lines,
                    None => BufReader::new(File::open(&path).await?).lines(),
                };

                let mut batch = Vec::with_capacity(batch_size);
                while batch.len() < batch_size {
                    match lines.next_line().await? {
                        Some(line) if line.trim().is_empty() => continue,
                        Some(line) => batch.push(parse_line(&line)),
                        None => break,
                    }
                }

                if batch.is_empty() {
                    return Ok::<_, AppError>(None);
                }
                debug!(records = batch.len(), "Read corpus batch");
                Ok(Some((batch, Some(lines))))
            }
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use futures::TryStreamExt;

    use super::*;
    use crate::batch_source::Batch;

    fn corpus(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        for line in lines {
            writeln!(file, "{line}").expect("write line");
        }
        file
    }

    #[tokio::test]
    async fn yields_fixed_size_batches() {
        let file = corpus(&[
            r#"{"docid": "D1", "url": "u", "title": "t1", "body": "b1"}"#,
            r#"{"docid": "D2", "url": "u", "title": "t2", "body": "b2"}"#,
            "",
            r#"{"docid": "D3", "url": "u", "title": "t3", "body": "b3"}"#,
        ]);
        let reader = JsonLinesCorpus::new(file.path(), 2).expect("reader");

        let batches: Vec<Batch> = reader.batches().try_collect().await.expect("batches");
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 1]);
        assert_eq!(batches[1][0]["docid"], "D3");
    }

    #[tokio::test]
    async fn each_pass_restarts_from_the_beginning() {
        let file = corpus(&[r#"{"docid": "D1"}"#, r#"{"docid": "D2"}"#]);
        let reader = JsonLinesCorpus::new(file.path(), 10).expect("reader");

        let first: Vec<Batch> = reader.batches().try_collect().await.expect("first pass");
        let second: Vec<Batch> = reader.batches().try_collect().await.expect("second pass");
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }

    #[tokio::test]
    async fn malformed_lines_become_non_object_records() {
        let file = corpus(&["not json", r#"{"docid": "D1"}"#]);
        let reader = JsonLinesCorpus::new(file.path(), 10).expect("reader");

        let batches: Vec<Batch> = reader.batches().try_collect().await.expect("batches");
        assert_eq!(batches[0][0], Value::String("not json".into()));
        assert!(batches[0][1].is_object());
    }

    #[test]
    fn missing_file_is_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = JsonLinesCorpus::new(dir.path().join("absent.jsonl"), 10).expect_err("missing");
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
