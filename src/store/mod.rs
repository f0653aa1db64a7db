//! Key-value store abstraction for slotq.
//!
//! The queues only ever talk to a [`KvStore`]: a handful of keyed operations,
//! three of which must be atomic per key. Two implementations ship with the
//! crate:
//!
//! - [`MemoryStore`]: in-process map, for tests and single-process use
//! - [`RedisStore`]: pooled Redis/Valkey client (feature `redis`, on by default)
//!
//! Memcached-style stores fit the same contract directly; implement
//! [`KvStore`] for your client of choice.

mod error;
mod memory;
mod traits;

#[cfg(feature = "redis")]
pub mod redis;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use traits::KvStore;

pub(crate) use traits::parse_counter;

#[cfg(feature = "redis")]
pub use self::redis::{RedisConfig, RedisStore, RedisStoreBuilder};
