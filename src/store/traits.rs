//! The key-value capability the queues are built on.
//!
//! The queues never lock, never open transactions and never cache counter
//! values. Everything they need from the shared store is captured by
//! [`KvStore`]: three primitives that are atomic per key (`increment`,
//! `decrement`, `add_if_absent`) plus plain keyed access.
//!
//! # Example: Implementing a Custom Store
//!
//! ```rust,ignore
//! use slotq::store::{KvStore, StoreError};
//! use async_trait::async_trait;
//!
//! pub struct MemcachedStore { /* ... */ }
//!
//! #[async_trait]
//! impl KvStore for MemcachedStore {
//!     // Map incr/decr/add/get/set/delete/get_multi/delete_multi...
//! }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use super::error::StoreError;

/// Core trait for a shared key-value store.
///
/// # Implementation Notes
///
/// - `increment` and `decrement` must be atomic per key and must NOT create a
///   missing key; they report absence with `Ok(None)`.
/// - `decrement` never goes below zero.
/// - `add_if_absent` creates the key only when it is missing and reports
///   whether it did.
/// - A `ttl` of [`Duration::ZERO`] means the key never expires.
/// - Counters are stored as decimal text, so `get` on a counter key returns
///   its current value as a string.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Atomically add one to an existing counter and return the new value.
    async fn increment(&self, key: &str) -> Result<Option<u64>, StoreError>;

    /// Atomically subtract one from an existing counter, floored at zero.
    async fn decrement(&self, key: &str) -> Result<Option<u64>, StoreError>;

    /// Create `key` with `value` only if it does not exist yet.
    async fn add_if_absent(&self, key: &str, value: &str, ttl: Duration)
        -> Result<bool, StoreError>;

    /// Fetch a single key.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Unconditionally write a key.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Remove a key. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Fetch many keys at once. Missing keys have no entry in the result.
    async fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, String>, StoreError>;

    /// Remove many keys at once.
    async fn delete_multi(&self, keys: &[String]) -> Result<(), StoreError>;
}

/// Parse a counter value read back from the store.
pub(crate) fn parse_counter(key: &str, raw: Option<String>) -> Result<u64, StoreError> {
    match raw {
        None => Ok(0),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|_| StoreError::InvalidCounter {
                key: key.to_string(),
                value,
            }),
    }
}
