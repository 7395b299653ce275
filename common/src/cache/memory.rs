use std::{
    collections::{HashMap, VecDeque},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::AppError;

use super::store::CacheStore;

#[derive(Default)]
struct MemoryCacheState {
    values: HashMap<String, (String, Instant)>,
    lists: HashMap<String, VecDeque<String>>,
}

/// Process-local cache store with TTL expiry.
#[derive(Default)]
pub struct MemoryCacheStore {
    state: Mutex<MemoryCacheState>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut state = self.state.lock().await;
        match state.values.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                state.values.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<bool, AppError> {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        if state
            .values
            .get(key)
            .is_some_and(|(_, expires_at)| *expires_at > now)
        {
            return Ok(false);
        }

        let expires_at = now
            .checked_add(Duration::from_secs(ttl_secs))
            .ok_or_else(|| AppError::Cache(format!("ttl of {ttl_secs}s is out of range")))?;
        state
            .values
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(true)
    }

    async fn push_recent(&self, list_key: &str, key: &str, max_len: usize) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        let list = state.lists.entry(list_key.to_string()).or_default();
        list.push_front(key.to_string());
        list.truncate(max_len);
        Ok(())
    }

    async fn list_recent(&self, list_key: &str, max_len: usize) -> Result<Vec<String>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .lists
            .get(list_key)
            .map(|list| list.iter().take(max_len).cloned().collect())
            .unwrap_or_default())
    }
}
