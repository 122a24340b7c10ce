use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use redis::Client;

use crate::store::{ListBackend, WatchlistError, WatchlistResult};

impl From<redis::RedisError> for WatchlistError {
    fn from(err: redis::RedisError) -> Self {
        WatchlistError::Storage(err.to_string())
    }
}

/// Creates a Redis client for watchlist storage
///
/// Opening the client does not connect; connections are made per operation.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Redis list backend for the remote watchlist
///
/// `LPUSH` prepends, `LRANGE 0 -1` reads, and rewrites run as a
/// `MULTI`/`EXEC` pipeline of `DEL` + `RPUSH`.
#[derive(Clone)]
pub struct RedisListBackend {
    redis_client: Client,
}

impl RedisListBackend {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }

    async fn connection(&self) -> WatchlistResult<MultiplexedConnection> {
        Ok(self.redis_client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait]
impl ListBackend for RedisListBackend {
    async fn range(&self, key: &str) -> WatchlistResult<Vec<String>> {
        let mut conn = self.connection().await?;
        let elements: Vec<String> = conn.lrange(key, 0, -1).await?;
        Ok(elements)
    }

    async fn push_front(&self, key: &str, value: String) -> WatchlistResult<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.lpush(key, value).await?;
        Ok(())
    }

    async fn replace(&self, key: &str, values: Vec<String>) -> WatchlistResult<()> {
        let mut conn = self.connection().await?;
        let mut pipe = redis::pipe();
        pipe.atomic().del(key).ignore();
        if !values.is_empty() {
            pipe.rpush(key, values).ignore();
        }
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> WatchlistResult<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }
}

// These tests need a running Redis: `REDIS_URL=... cargo test -- --ignored`
