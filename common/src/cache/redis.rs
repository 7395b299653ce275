use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands};
use tracing::info;

use crate::error::AppError;

use super::store::CacheStore;

/// Cache store on a shared multiplexed Redis connection.
#[derive(Clone)]
pub struct RedisCacheStore {
    connection: MultiplexedConnection,
}

impl RedisCacheStore {
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(redis_url)?;
        let connection = client.get_multiplexed_async_connection().await?;
        info!(url = redis_url, "Connected to Redis");
        Ok(Self { connection })
    }
}

fn last_position(max_len: usize) -> isize {
    isize::try_from(max_len)
        .unwrap_or(isize::MAX)
        .saturating_sub(1)
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<bool, AppError> {
        let mut conn = self.connection.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs.max(1))
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn push_recent(&self, list_key: &str, key: &str, max_len: usize) -> Result<(), AppError> {
        if max_len == 0 {
            return Ok(());
        }

        let mut conn = self.connection.clone();
        let (): () = redis::pipe()
            .atomic()
            .lpush(list_key, key)
            .ignore()
            .ltrim(list_key, 0, last_position(max_len))
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn list_recent(&self, list_key: &str, max_len: usize) -> Result<Vec<String>, AppError> {
        if max_len == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.connection.clone();
        let keys: Vec<String> = conn.lrange(list_key, 0, last_position(max_len)).await?;
        Ok(keys)
    }
}
