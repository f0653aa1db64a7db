//! In-process [`KvStore`] implementation.
//!
//! `MemoryStore` keeps every key in a single map behind a mutex, which makes
//! each primitive trivially atomic. Expiry is lazy: an expired entry is
//! dropped the next time any operation touches it. Counters are kept as
//! decimal text just like memcached and Redis do, so a queue behaves the same
//! against this store as against a networked one.
//!
//! Useful for tests and for single-process deployments that want the queue
//! API without running a server.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::error::StoreError;
use super::traits::{parse_counter, KvStore};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: String, ttl: Duration) -> Self {
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Some(Instant::now() + ttl)
        };
        Self { value, expires_at }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Mutex-guarded in-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) keys.
    ///
    /// A poisoned mutex is recovered here; counting only reads the map.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.values().filter(|e| !e.is_expired(now)).count()
    }

    /// Whether the store holds no live keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Internal("memory store mutex poisoned".into()))
    }

    /// Look up a live entry, evicting it first if it has expired.
    fn live<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
        let now = Instant::now();
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
            return None;
        }
        entries.get_mut(key)
    }

    fn adjust(&self, key: &str, delta: i8) -> Result<Option<u64>, StoreError> {
        let mut entries = self.lock()?;
        let Some(entry) = Self::live(&mut entries, key) else {
            return Ok(None);
        };

        let current = parse_counter(key, Some(entry.value.clone()))?;
        let next = if delta >= 0 {
            current
                .checked_add(delta as u64)
                .ok_or_else(|| StoreError::Internal(format!("counter overflow at {}", key)))?
        } else {
            current.saturating_sub(delta.unsigned_abs() as u64)
        };

        // TTL is left untouched, as memcached incr/decr do.
        entry.value = next.to_string();
        Ok(Some(next))
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn increment(&self, key: &str) -> Result<Option<u64>, StoreError> {
        self.adjust(key, 1)
    }

    async fn decrement(&self, key: &str) -> Result<Option<u64>, StoreError> {
        self.adjust(key, -1)
    }

    async fn add_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let mut entries = self.lock()?;
        if Self::live(&mut entries, key).is_some() {
            return Ok(false);
        }
        entries.insert(key.to_string(), Entry::new(value.to_string(), ttl));
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.lock()?;
        Ok(Self::live(&mut entries, key).map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut entries = self.lock()?;
        entries.insert(key.to_string(), Entry::new(value.to_string(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.lock()?;
        entries.remove(key);
        Ok(())
    }

    async fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, String>, StoreError> {
        let mut entries = self.lock()?;
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(entry) = Self::live(&mut entries, key) {
                found.insert(key.clone(), entry.value.clone());
            }
        }
        Ok(found)
    }

    async fn delete_multi(&self, keys: &[String]) -> Result<(), StoreError> {
        let mut entries = self.lock()?;
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }
}
