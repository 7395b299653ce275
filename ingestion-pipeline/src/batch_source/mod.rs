mod columnar;
mod jsonl;

pub use columnar::ParquetCorpus;
pub use jsonl::JsonLinesCorpus;

use std::path::{Path, PathBuf};

use common::{error::AppError, storage::types::document::RawRecord};
use futures::stream::BoxStream;

pub type Batch = Vec<RawRecord>;

pub type BatchStream<'a> = BoxStream<'a, Result<Batch, AppError>>;

/// Lazy producer of record batches. Each call to `batches` starts a fresh pass.
pub trait BatchSource: Send + Sync {
    fn batches(&self) -> BatchStream<'_>;
}

/// Opens the corpus at `path`, picking the reader from the file extension:
/// `.parquet` files are read column-wise, anything else as JSON Lines.
pub fn open_corpus(
    path: impl AsRef<Path>,
    batch_size: usize,
) -> Result<Box<dyn BatchSource>, AppError> {
    let path = path.as_ref();
    let is_parquet = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("parquet"));

    if is_parquet {
        Ok(Box::new(ParquetCorpus::new(path, batch_size)?))
    } else {
        Ok(Box::new(JsonLinesCorpus::new(path, batch_size)?))
    }
}

fn ensure_file(path: &Path) -> Result<PathBuf, AppError> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(AppError::NotFound(format!(
            "corpus file {} does not exist",
            path.display()
        )))
    }
}
