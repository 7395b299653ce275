use common::utils::config::AppConfig;

#[derive(Debug, Clone)]
pub struct IngestionTuning {
    /// Records per batch read from the corpus.
    pub batch_size: usize,
    /// Bulk-write units allowed in flight before the window is drained.
    pub max_concurrent_batches: usize,
}

impl Default for IngestionTuning {
    fn default() -> Self {
        Self {
            batch_size: 1_000,
            max_concurrent_batches: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestionConfig {
    pub tuning: IngestionTuning,
    pub index_name: String,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            tuning: IngestionTuning::default(),
            index_name: "msmarco-docs".to_string(),
        }
    }
}

impl IngestionConfig {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            tuning: IngestionTuning {
                batch_size: config.batch_size.max(1),
                max_concurrent_batches: config.max_concurrent_batches.max(1),
            },
            index_name: config.index_name.clone(),
        }
    }
}
