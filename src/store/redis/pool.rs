//! Pool setup for [`RedisStore`](super::RedisStore).
//!
//! The pool opens connections lazily. A store is only handed out once a
//! pooled connection has answered `PING`; refused or dropped connections are
//! retried a few times with a doubling pause.

use std::time::Duration;

use bb8_redis::bb8::Pool;
use bb8_redis::RedisConnectionManager;
use tracing::{debug, info, warn};

use crate::store::StoreError;

/// Connection pool and startup settings for the Redis store.
#[derive(Debug, Clone, Copy)]
pub struct RedisConfig {
    /// Upper bound on open connections
    pub max_size: u32,
    /// Connections kept open while idle, capped at `max_size`
    pub min_idle: u32,
    /// How long a checkout may wait for a connection
    pub conn_timeout: Duration,
    /// Idle connections older than this are closed
    pub idle_timeout: Duration,
    /// Connections are recycled after this long
    pub max_lifetime: Duration,
    /// `PING` attempts before the store gives up at startup
    pub connect_attempts: u32,
    /// Pause after the first failed `PING`; doubled after each further one
    pub retry_backoff: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            max_size: 16,
            min_idle: 1,
            conn_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(300),
            max_lifetime: Duration::from_secs(1800),
            connect_attempts: 4,
            retry_backoff: Duration::from_millis(400),
        }
    }
}

impl RedisConfig {
    fn validate(&self) -> Result<(), StoreError> {
        if self.max_size == 0 {
            return Err(StoreError::Configuration(
                "redis pool max_size must be at least 1".into(),
            ));
        }
        if self.connect_attempts == 0 {
            return Err(StoreError::Configuration(
                "redis connect_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Pause before attempt `failed + 1`, given `failed` failed attempts so far.
    fn backoff(&self, failed: u32) -> Duration {
        self.retry_backoff
            .saturating_mul(1u32 << failed.saturating_sub(1).min(16))
    }
}

/// Open a pool against `redis_url` and wait until it answers `PING`.
pub(crate) async fn connect(
    redis_url: &str,
    config: &RedisConfig,
) -> Result<Pool<RedisConnectionManager>, StoreError> {
    config.validate()?;
    let shown = hide_credentials(redis_url);

    let manager = RedisConnectionManager::new(redis_url)
        .map_err(|e| StoreError::Configuration(format!("bad redis url {}: {}", shown, e)))?;

    let pool = Pool::builder()
        .max_size(config.max_size)
        .min_idle(Some(config.min_idle.min(config.max_size)))
        .connection_timeout(config.conn_timeout)
        .idle_timeout(Some(config.idle_timeout))
        .max_lifetime(Some(config.max_lifetime))
        .build_unchecked(manager);

    let mut failed = 0;
    loop {
        match ping(&pool).await {
            Ok(()) => break,
            Err(err) if err.is_retryable() && failed + 1 < config.connect_attempts => {
                failed += 1;
                let pause = config.backoff(failed);
                warn!(
                    url = %shown,
                    attempt = failed,
                    of = config.connect_attempts,
                    ?pause,
                    error = %err,
                    "redis store not reachable yet"
                );
                tokio::time::sleep(pause).await;
            }
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => {
                return Err(StoreError::Unavailable(format!(
                    "redis at {} did not answer PING after {} attempt(s): {}",
                    shown,
                    failed + 1,
                    err
                )))
            }
        }
    }

    info!(url = %shown, max_size = config.max_size, "redis store ready");
    Ok(pool)
}

async fn ping(pool: &Pool<RedisConnectionManager>) -> Result<(), StoreError> {
    let mut conn = pool
        .get()
        .await
        .map_err(|e| StoreError::Unavailable(format!("no pooled connection: {}", e)))?;
    let reply: String = redis::cmd("PING").query_async(&mut *conn).await?;
    debug!(%reply, "redis PING");
    Ok(())
}

/// Replace the userinfo part of a URL so it can be logged.
fn hide_credentials(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.rsplit_once('@') {
        Some((_, host)) => format!("{}://<credentials>@{}", scheme, host),
        None => url.to_string(),
    }
}
