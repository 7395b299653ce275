use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use super::retry::RetryPolicy;

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default = "default_elasticsearch_url")]
    pub elasticsearch_url: String,
    #[serde(default)]
    pub es_username: Option<String>,
    #[serde(default)]
    pub es_password: Option<String>,
    #[serde(default = "default_elasticsearch_timeout_secs")]
    pub elasticsearch_timeout_secs: u64,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_index_name")]
    pub index_name: String,
    #[serde(default = "default_corpus_path")]
    pub corpus_path: String,
    #[serde(default = "default_key_phrases_path")]
    pub key_phrases_path: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,
    #[serde(default = "default_max_concurrent_batches")]
    pub max_concurrent_batches: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_max_cache_queries")]
    pub max_cache_queries: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_search_result_limit")]
    pub search_result_limit: usize,
}

fn default_elasticsearch_url() -> String {
    "http://elasticsearch:9200".to_string()
}

fn default_elasticsearch_timeout_secs() -> u64 {
    30
}

fn default_redis_url() -> String {
    "redis://redis:6379".to_string()
}

fn default_http_port() -> u16 {
    2345
}

fn default_index_name() -> String {
    "msmarco-docs".to_string()
}

fn default_corpus_path() -> String {
    "data/corpus/dataset.parquet".to_string()
}

fn default_key_phrases_path() -> String {
    "data/processed/key_phrases.json".to_string()
}

fn default_batch_size() -> usize {
    1000
}

fn default_max_retries() -> usize {
    3
}

fn default_retry_interval_secs() -> u64 {
    5
}

fn default_max_concurrent_batches() -> usize {
    5
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_max_cache_queries() -> usize {
    5
}

fn default_page_size() -> usize {
    10
}

fn default_search_result_limit() -> usize {
    100
}

impl AppConfig {
    /// Retry policy shared by every call into the document store.
    pub fn store_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_secs(self.retry_interval_secs),
        )
    }
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
