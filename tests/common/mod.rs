#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use slotq::store::{KvStore, MemoryStore, StoreError};
use slotq::Queue;

/// Dequeue until the queue reports empty.
pub async fn drain_all<Q, T>(queue: &Q) -> anyhow::Result<Vec<T>>
where
    Q: Queue<T>,
    T: Serialize + DeserializeOwned + Send + Sync,
{
    let mut values = Vec::new();
    while let Some(value) = queue.dequeue().await? {
        values.push(value);
    }
    Ok(values)
}

/// Memory store that can be switched into an "unreachable" state.
#[derive(Default)]
pub struct SwitchableStore {
    inner: MemoryStore,
    down: AtomicBool,
}

impl SwitchableStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KvStore for SwitchableStore {
    async fn increment(&self, key: &str) -> Result<Option<u64>, StoreError> {
        self.check()?;
        self.inner.increment(key).await
    }

    async fn decrement(&self, key: &str) -> Result<Option<u64>, StoreError> {
        self.check()?;
        self.inner.decrement(key).await
    }

    async fn add_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.check()?;
        self.inner.add_if_absent(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.check()?;
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.inner.delete(key).await
    }

    async fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, String>, StoreError> {
        self.check()?;
        self.inner.get_multi(keys).await
    }

    async fn delete_multi(&self, keys: &[String]) -> Result<(), StoreError> {
        self.check()?;
        self.inner.delete_multi(keys).await
    }
}
