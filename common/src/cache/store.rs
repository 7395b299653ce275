use async_trait::async_trait;

use crate::error::AppError;

/// Key/value store backing the result cache.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Writes `value` only when `key` holds nothing live. Returns whether it wrote.
    async fn set_if_absent(&self, key: &str, value: &str, ttl_secs: u64)
        -> Result<bool, AppError>;

    /// Pushes `key` to the front of `list_key` and truncates the list to `max_len`.
    async fn push_recent(&self, list_key: &str, key: &str, max_len: usize)
        -> Result<(), AppError>;

    async fn list_recent(&self, list_key: &str, max_len: usize) -> Result<Vec<String>, AppError>;
}
