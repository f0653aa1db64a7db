//! # slotq
//!
//! FIFO and LIFO queues that live entirely in a shared key-value store such as
//! Redis, Valkey or memcached.
//!
//! The store only has to offer atomic increment, atomic decrement floored at
//! zero, and add-if-absent. From those three primitives the queues get
//! lock-free, race-safe pairing of producers and consumers across any number
//! of processes: every enqueued value is dequeued by exactly one consumer.
//!
//! ```rust
//! use std::sync::Arc;
//! use slotq::{LifoQueue, MemoryStore, Queue};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), slotq::QueueError> {
//! let store = Arc::new(MemoryStore::new());
//! let stack = LifoQueue::builder(store)
//!     .name("undo")
//!     .elements([1, 2, 3])
//!     .build()
//!     .await?;
//!
//! assert_eq!(stack.dequeue().await?, Some(3));
//! assert_eq!(stack.count().await?, 2);
//! # Ok(())
//! # }
//! ```
//!
//! See [`queue`] for the race-safety guarantees of each operation and
//! [`store`] for the store contract.

pub mod queue;
pub mod store;

pub use queue::{Drain, FifoQueue, LifoQueue, Queue, QueueBuilder, QueueConfig, QueueError};
pub use store::{KvStore, MemoryStore, StoreError};

#[cfg(feature = "redis")]
pub use store::{RedisConfig, RedisStore};
