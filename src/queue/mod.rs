//! FIFO and LIFO queues built on a shared key-value store.
//!
//! Both disciplines follow the same layout: one or two high-water-mark
//! counters delimit a window of slot keys, and the store's atomic
//! increment/decrement hands every caller a distinct slot id. No locks, no
//! transactions and no cached counter values are involved, so any number of
//! processes may produce and consume on the same queue name.
//!
//! | Discipline | Counters | Live ids |
//! |---|---|---|
//! | [`FifoQueue`] | `max-enqueued`, `max-dequeued` | `(max-dequeued, max-enqueued]` |
//! | [`LifoQueue`] | `max-enqueued` | `[2, max-enqueued]` |
//!
//! # Race safety
//!
//! `enqueue` and `dequeue` are race-safe: each slot is claimed by exactly one
//! caller. `count`, `clear` and `iter` read counters and slots in separate
//! round trips and may observe an inconsistent snapshot while other callers
//! are mutating the queue.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use slotq::queue::{FifoQueue, Queue};
//! use slotq::store::MemoryStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), slotq::queue::QueueError> {
//! let queue: FifoQueue<String> = FifoQueue::new(Arc::new(MemoryStore::new()), "emails");
//!
//! queue
//!     .enqueue(&"first".to_string())
//!     .await?
//!     .enqueue(&"second".to_string())
//!     .await?;
//!
//! assert_eq!(queue.count().await?, 2);
//! assert_eq!(queue.dequeue().await?.as_deref(), Some("first"));
//! # Ok(())
//! # }
//! ```

mod config;
mod counter;
mod error;
mod fifo;
mod keys;
mod lifo;

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use config::{QueueBuilder, QueueConfig, DEFAULT_TTL_SECS};
pub use error::QueueError;
pub use fifo::FifoQueue;
pub use lifo::LifoQueue;

/// Operations shared by both queue disciplines.
///
/// `enqueue` and `clear` return the queue itself so calls can be chained.
#[async_trait]
pub trait Queue<T>: Send + Sync
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    /// Name used as the key prefix.
    fn name(&self) -> &str;

    /// Append a value. Store failures propagate; nothing is retried.
    async fn enqueue(&self, value: &T) -> Result<&Self, QueueError>;

    /// Take the next value, or `None` if the queue is empty.
    async fn dequeue(&self) -> Result<Option<T>, QueueError>;

    /// Number of live values. Not race-safe.
    async fn count(&self) -> Result<u64, QueueError>;

    /// Remove every live value and reset the counters. Not race-safe.
    async fn clear(&self) -> Result<&Self, QueueError>;

    /// Fetch every live value in ascending slot order. Not race-safe.
    async fn iter(&self) -> Result<Drain<T>, QueueError>;
}

/// One-shot iterator over the values a queue held when
/// [`Queue::iter`] ran.
///
/// Values are owned; consuming the iterator does not touch the store, and it
/// cannot be restarted. Call [`Queue::iter`] again for a fresh snapshot.
pub struct Drain<T> {
    values: std::vec::IntoIter<T>,
}

impl<T> Drain<T> {
    fn empty() -> Self {
        Self {
            values: Vec::new().into_iter(),
        }
    }
}

impl<T> Iterator for Drain<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.values.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}

impl<T> ExactSizeIterator for Drain<T> {}

impl<T: fmt::Debug> fmt::Debug for Drain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drain")
            .field("remaining", &self.values.as_slice())
            .finish()
    }
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<String, QueueError> {
    Ok(serde_json::to_string(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, QueueError> {
    Ok(serde_json::from_str(raw)?)
}

/// Decode the slots in `keys` order, skipping ids the store no longer has.
pub(crate) fn collect_slots<T: DeserializeOwned>(
    keys: &[String],
    mut found: HashMap<String, String>,
) -> Result<Drain<T>, QueueError> {
    let mut values = Vec::with_capacity(found.len());
    for key in keys {
        if let Some(raw) = found.remove(key) {
            values.push(decode(&raw)?);
        }
    }
    Ok(Drain {
        values: values.into_iter(),
    })
}
