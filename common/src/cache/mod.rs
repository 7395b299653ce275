pub mod redis;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, warn};

use crate::utils::config::AppConfig;

use self::store::CacheStore;

/// Namespace whose keys are tracked in the recency index.
pub const SEARCH_NAMESPACE: &str = "search:";
pub const RECENT_QUERIES_KEY: &str = "recent_queries";

/// Fingerprint-keyed cache of response payloads with a bounded recency index.
///
/// Store failures never reach the caller: reads degrade to a miss and writes to a no-op.
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    default_ttl_secs: u64,
    max_recent: usize,
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStore>, default_ttl_secs: u64, max_recent: usize) -> Self {
        Self {
            store,
            default_ttl_secs,
            max_recent,
        }
    }

    pub fn from_config(store: Arc<dyn CacheStore>, config: &AppConfig) -> Self {
        Self::new(store, config.cache_ttl_secs, config.max_cache_queries)
    }

    /// Cache key for a page of results. Queries differing only in case or
    /// surrounding/inner whitespace share a key.
    pub fn fingerprint(route: &str, query: &str, page: usize) -> String {
        let normalized = query
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        format!("{SEARCH_NAMESPACE}{route}:{page}:{normalized}")
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "Cache miss");
                return None;
            }
            Err(err) => {
                error!(key, error = %err, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key, "Cache hit");
                Some(value)
            }
            Err(err) => {
                warn!(key, error = %err, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Stores `value` unless a live entry already exists. Returns whether it was written.
    pub async fn set<T: Serialize + Sync>(&self, key: &str, value: &T, ttl_secs: Option<u64>) -> bool {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                error!(key, error = %err, "Failed to encode cache entry");
                return false;
            }
        };

        let ttl = ttl_secs.unwrap_or(self.default_ttl_secs);
        let written = match self.store.set_if_absent(key, &payload, ttl).await {
            Ok(written) => written,
            Err(err) => {
                error!(key, error = %err, "Cache write failed");
                return false;
            }
        };

        if key.starts_with(SEARCH_NAMESPACE) {
            if let Err(err) = self
                .store
                .push_recent(RECENT_QUERIES_KEY, key, self.max_recent)
                .await
            {
                error!(key, error = %err, "Failed to record recent query");
            }
        }

        written
    }

    /// Most recently written search keys, newest first.
    pub async fn recent_keys(&self) -> Vec<String> {
        self.store
            .list_recent(RECENT_QUERIES_KEY, self.max_recent)
            .await
            .unwrap_or_else(|err| {
                error!(error = %err, "Failed to read recent queries");
                Vec::new()
            })
    }
}
