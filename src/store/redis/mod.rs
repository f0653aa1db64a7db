//! Redis implementation of [`KvStore`].
//!
//! Redis' own `INCR`/`DECR` create missing keys and happily go negative, so
//! the two counter primitives run as small Lua scripts that keep the
//! memcached contract the queues rely on: absent keys stay absent, and
//! decrement stops at zero. Everything else maps onto plain commands:
//!
//! | Primitive | Command |
//! |---|---|
//! | `increment` | script: `EXISTS` + `INCR` |
//! | `decrement` | script: `GET` + `DECR` floored at 0 |
//! | `add_if_absent` | `SET key value NX EX ttl` |
//! | `get` / `set` / `delete` | `GET` / `SET .. EX ttl` / `DEL` |
//! | `get_multi` / `delete_multi` | `MGET` / `DEL` in chunks |
//!
//! # Usage
//!
//! ```rust,ignore
//! use slotq::store::RedisStore;
//! use slotq::queue::FifoQueue;
//! use std::sync::Arc;
//!
//! let store = RedisStore::builder()
//!     .redis_url("redis://localhost:6379")
//!     .build()
//!     .await?;
//!
//! let queue: FifoQueue<String> = FifoQueue::new(Arc::new(store), "jobs");
//! ```
//!
//! # Valkey Compatibility
//!
//! Valkey speaks the same protocol and runs the same scripts, so pointing the
//! URL at a Valkey instance works unchanged.

mod pool;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::bb8::{Pool, PooledConnection};
use bb8_redis::RedisConnectionManager;
use redis::{AsyncCommands, ErrorKind, RedisError, Script};

pub use pool::RedisConfig;

use super::error::StoreError;
use super::traits::KvStore;

/// Keys per `MGET`/`DEL` round trip.
const MULTI_CHUNK: usize = 1000;

const INCREMENT_IF_EXISTS: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
    return redis.call('INCR', KEYS[1])
end
return false
"#;

const DECREMENT_FLOORED: &str = r#"
local current = redis.call('GET', KEYS[1])
if not current then
    return false
end
local n = tonumber(current)
if n == nil then
    return redis.error_reply('ERR value is not an integer or out of range')
end
if n > 0 then
    return redis.call('DECR', KEYS[1])
end
return 0
"#;

/// Redis-backed key-value store.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool<RedisConnectionManager>,
    increment_script: Script,
    decrement_script: Script,
}

impl RedisStore {
    /// Create a store on top of an existing connection pool.
    pub fn new(pool: Pool<RedisConnectionManager>) -> Self {
        Self {
            pool,
            increment_script: Script::new(INCREMENT_IF_EXISTS),
            decrement_script: Script::new(DECREMENT_FLOORED),
        }
    }

    /// Create a builder for configuring the Redis store.
    pub fn builder() -> RedisStoreBuilder {
        RedisStoreBuilder::new()
    }

    /// Get the Redis connection pool.
    pub fn pool(&self) -> &Pool<RedisConnectionManager> {
        &self.pool
    }

    async fn conn(&self) -> Result<PooledConnection<'_, RedisConnectionManager>, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to get Redis connection: {}", e)))
    }

    async fn run_counter_script(
        &self,
        script: &Script,
        key: &str,
    ) -> Result<Option<u64>, StoreError> {
        let mut conn = self.conn().await?;
        let value: Option<i64> = match script.key(key).invoke_async(&mut *conn).await {
            Ok(value) => value,
            Err(err) if rejects_counter_value(&err) => {
                // Only for the error message; the counter is already known bad.
                let raw: redis::RedisResult<Option<String>> = conn.get(key).await;
                return Err(invalid_counter(key, raw.ok().flatten(), &err));
            }
            Err(err) => return Err(err.into()),
        };
        value
            .map(|v| {
                u64::try_from(v).map_err(|_| StoreError::InvalidCounter {
                    key: key.to_string(),
                    value: v.to_string(),
                })
            })
            .transpose()
    }
}

/// Whether Redis refused to treat the stored value as an integer.
///
/// `INCR` and the decrement script both reply with an `ERR ... not an
/// integer` response error, and a reply that does not convert to an integer
/// surfaces as a type error.
fn rejects_counter_value(err: &RedisError) -> bool {
    matches!(err.kind(), ErrorKind::ResponseError | ErrorKind::TypeError)
}

fn invalid_counter(key: &str, raw: Option<String>, err: &RedisError) -> StoreError {
    StoreError::InvalidCounter {
        key: key.to_string(),
        value: raw.unwrap_or_else(|| err.to_string()),
    }
}

/// Redis `EX` takes whole seconds and rejects zero.
fn expiry_seconds(ttl: Duration) -> Option<u64> {
    if ttl.is_zero() {
        None
    } else {
        Some(ttl.as_secs().max(1))
    }
}

fn set_command(key: &str, value: &str, ttl: Duration, only_if_absent: bool) -> redis::Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(key).arg(value);
    if only_if_absent {
        cmd.arg("NX");
    }
    if let Some(secs) = expiry_seconds(ttl) {
        cmd.arg("EX").arg(secs);
    }
    cmd
}

#[async_trait]
impl KvStore for RedisStore {
    async fn increment(&self, key: &str) -> Result<Option<u64>, StoreError> {
        self.run_counter_script(&self.increment_script, key).await
    }

    async fn decrement(&self, key: &str) -> Result<Option<u64>, StoreError> {
        self.run_counter_script(&self.decrement_script, key).await
    }

    async fn add_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        let reply: Option<String> = set_command(key, value, ttl, true)
            .query_async(&mut *conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        let _: () = set_command(key, value, ttl, false)
            .query_async(&mut *conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, String>, StoreError> {
        let mut found = HashMap::with_capacity(keys.len());
        if keys.is_empty() {
            return Ok(found);
        }

        let mut conn = self.conn().await?;
        for chunk in keys.chunks(MULTI_CHUNK) {
            let values: Vec<Option<String>> = redis::cmd("MGET")
                .arg(chunk)
                .query_async(&mut *conn)
                .await?;
            for (key, value) in chunk.iter().zip(values) {
                if let Some(value) = value {
                    found.insert(key.clone(), value);
                }
            }
        }
        Ok(found)
    }

    async fn delete_multi(&self, keys: &[String]) -> Result<(), StoreError> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn().await?;
        for chunk in keys.chunks(MULTI_CHUNK) {
            let _: () = redis::cmd("DEL").arg(chunk).query_async(&mut *conn).await?;
        }
        Ok(())
    }
}

/// Builder for creating a Redis store with custom configuration.
pub struct RedisStoreBuilder {
    redis_url: Option<String>,
    config: Option<RedisConfig>,
}

impl RedisStoreBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            redis_url: None,
            config: None,
        }
    }

    /// Set the Redis URL.
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    /// Set the Redis pool configuration.
    pub fn config(mut self, config: RedisConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the pool, verify connectivity and return the store.
    pub async fn build(self) -> Result<RedisStore, StoreError> {
        let redis_url = self
            .redis_url
            .unwrap_or_else(|| "redis://127.0.0.1:6379".to_string());
        let config = self.config.unwrap_or_default();

        let pool = pool::connect(&redis_url, &config).await?;
        Ok(RedisStore::new(pool))
    }
}

impl Default for RedisStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
