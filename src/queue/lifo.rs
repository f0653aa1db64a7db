//! Last-in-first-out queue (a stack).
//!
//! A single counter is both the write cursor and the read cursor: `enqueue`
//! increments it and writes the slot at the new value, `dequeue` decrements
//! it and takes the slot just above the new value.
//!
//! The store's decrement cannot go below zero, so a decrement returning 0
//! could mean "empty" or "one value left at id 0". To keep those apart the
//! counter starts at 2 and id 1 is never used: a decrement that lands on 0
//! always means the queue was already empty.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::config::{QueueBuilder, QueueConfig};
use super::counter::allocate;
use super::error::QueueError;
use super::keys::QueueKeys;
use super::{collect_slots, decode, encode, Drain, Queue};
use crate::store::{parse_counter, KvStore};

/// Id of the first real slot; id 1 is the sentinel.
const FIRST_ID: u64 = 2;

/// LIFO queue over a shared [`KvStore`].
pub struct LifoQueue<T> {
    store: Arc<dyn KvStore>,
    keys: QueueKeys,
    config: QueueConfig,
    _values: PhantomData<fn() -> T>,
}

impl<T> LifoQueue<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    /// Open the queue `name` with the default configuration.
    pub fn new(store: Arc<dyn KvStore>, name: impl Into<String>) -> Self {
        Self::with_config(store, name, QueueConfig::default())
    }

    /// Open the queue `name` with a custom configuration.
    pub fn with_config(store: Arc<dyn KvStore>, name: impl Into<String>, config: QueueConfig) -> Self {
        Self {
            store,
            keys: QueueKeys::new(name),
            config,
            _values: PhantomData,
        }
    }

    /// Create a builder that can also seed the queue with initial values.
    pub fn builder(store: Arc<dyn KvStore>) -> QueueBuilder<Self, T> {
        QueueBuilder::new(store)
    }

    /// The configuration this handle writes with.
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    async fn max_enqueued(&self) -> Result<u64, QueueError> {
        Ok(parse_counter(
            self.keys.max_enqueued(),
            self.store.get(self.keys.max_enqueued()).await?,
        )?)
    }
}

impl<T> QueueBuilder<LifoQueue<T>, T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    /// Open the queue and enqueue the initial elements in order, so the
    /// last element is the first one dequeued.
    pub async fn build(self) -> Result<LifoQueue<T>, QueueError> {
        let (store, name, config, elements) = self.into_parts()?;
        let queue = LifoQueue::with_config(store, name, config);
        for element in &elements {
            queue.enqueue(element).await?;
        }
        Ok(queue)
    }
}

#[async_trait]
impl<T> Queue<T> for LifoQueue<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn name(&self) -> &str {
        self.keys.name()
    }

    async fn enqueue(&self, value: &T) -> Result<&Self, QueueError> {
        let payload = encode(value)?;
        let ttl = self.config.ttl();

        let allocation =
            allocate(self.store.as_ref(), self.keys.max_enqueued(), FIRST_ID, ttl).await?;

        self.store
            .set(&self.keys.slot(allocation.id), &payload, ttl)
            .await?;
        debug!(queue = %self.keys.name(), id = allocation.id, "lifo enqueue");
        Ok(self)
    }

    async fn dequeue(&self) -> Result<Option<T>, QueueError> {
        let Some(cursor) = self.store.decrement(self.keys.max_enqueued()).await? else {
            return Ok(None);
        };

        if cursor == 0 {
            // Was already empty (0 or sentinel); undo our decrement.
            self.store.increment(self.keys.max_enqueued()).await?;
            debug!(queue = %self.keys.name(), "lifo dequeue on empty, restored");
            return Ok(None);
        }

        let id = cursor + 1;
        let slot = self.keys.slot(id);
        let raw = self.store.get(&slot).await?;
        self.store.delete(&slot).await?;

        match raw {
            Some(raw) => {
                debug!(queue = %self.keys.name(), id, "lifo dequeue");
                Ok(Some(decode(&raw)?))
            }
            None => {
                warn!(queue = %self.keys.name(), id, "claimed slot has no value");
                Ok(None)
            }
        }
    }

    async fn count(&self) -> Result<u64, QueueError> {
        Ok(self.max_enqueued().await?.saturating_sub(1))
    }

    async fn clear(&self) -> Result<&Self, QueueError> {
        let max_enqueued = self.max_enqueued().await?;
        if max_enqueued > 0 {
            if max_enqueued >= FIRST_ID {
                let slots = self.keys.slots(FIRST_ID..=max_enqueued);
                self.store.delete_multi(&slots).await?;
            }
            self.store.delete(self.keys.max_enqueued()).await?;
            debug!(queue = %self.keys.name(), max_enqueued, "lifo cleared");
        }
        Ok(self)
    }

    async fn iter(&self) -> Result<Drain<T>, QueueError> {
        let max_enqueued = self.max_enqueued().await?;
        if max_enqueued < FIRST_ID {
            return Ok(Drain::empty());
        }

        let slots = self.keys.slots(FIRST_ID..=max_enqueued);
        let found = self.store.get_multi(&slots).await?;
        collect_slots(&slots, found)
    }
}

impl<T> Clone for LifoQueue<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            keys: self.keys.clone(),
            config: self.config,
            _values: PhantomData,
        }
    }
}

impl<T> fmt::Debug for LifoQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifoQueue")
            .field("name", &self.keys.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
