//! First-in-first-out queue.
//!
//! Two counters move upward forever: `max-enqueued` hands out slot ids to
//! producers and `max-dequeued` hands them out to consumers. Because each
//! counter is a single atomic key, concurrent callers always receive
//! distinct ids, which is all the exclusivity the queue needs.

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

/// FIFO queue over a shared [`KvStore`].
///
/// Cloning is cheap and every clone operates on the same store keys.
pub struct FifoQueue<T> {
    store: Arc<dyn KvStore>,
    keys: QueueKeys,
    config: QueueConfig,
    _values: PhantomData<fn() -> T>,
}

impl<T> FifoQueue<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    /// Open the queue `name` with the default configuration.
    ///
    /// Nothing is written until the first `enqueue`; a name that has never
    /// been used simply behaves as an empty queue.
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

    /// Read both counters. Two round trips, so not a consistent snapshot.
    async fn window(&self) -> Result<(u64, u64), QueueError> {
        let max_dequeued = parse_counter(
            self.keys.max_dequeued(),
            self.store.get(self.keys.max_dequeued()).await?,
        )?;
        let max_enqueued = parse_counter(
            self.keys.max_enqueued(),
            self.store.get(self.keys.max_enqueued()).await?,
        )?;
        Ok((max_dequeued, max_enqueued))
    }
}

impl<T> QueueBuilder<FifoQueue<T>, T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    /// Open the queue and enqueue the initial elements in order.
    pub async fn build(self) -> Result<FifoQueue<T>, QueueError> {
        let (store, name, config, elements) = self.into_parts()?;
        let queue = FifoQueue::with_config(store, name, config);
        for element in &elements {
            queue.enqueue(element).await?;
        }
        Ok(queue)
    }
}

#[async_trait]
impl<T> Queue<T> for FifoQueue<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn name(&self) -> &str {
        self.keys.name()
    }

    async fn enqueue(&self, value: &T) -> Result<&Self, QueueError> {
        let payload = encode(value)?;
        let ttl = self.config.ttl();

        let allocation = allocate(self.store.as_ref(), self.keys.max_enqueued(), 1, ttl).await?;
        if allocation.initialized {
            // Winner of the init race seeds the consumer side too.
            self.store
                .add_if_absent(self.keys.max_dequeued(), "0", ttl)
                .await?;
        }

        self.store
            .set(&self.keys.slot(allocation.id), &payload, ttl)
            .await?;
        debug!(queue = %self.keys.name(), id = allocation.id, "fifo enqueue");
        Ok(self)
    }

    async fn dequeue(&self) -> Result<Option<T>, QueueError> {
        // Must be read before claiming; see the overrun branch below.
        let max_enqueued = parse_counter(
            self.keys.max_enqueued(),
            self.store.get(self.keys.max_enqueued()).await?,
        )?;

        let Some(id) = self.store.increment(self.keys.max_dequeued()).await? else {
            return Ok(None);
        };

        if id > max_enqueued {
            // Claimed past the last produced id: hand the claim back.
            self.store.decrement(self.keys.max_dequeued()).await?;
            debug!(queue = %self.keys.name(), id, max_enqueued, "fifo dequeue overrun, restored");
            return Ok(None);
        }

        let slot = self.keys.slot(id);
        let raw = self.store.get(&slot).await?;
        self.store.delete(&slot).await?;

        match raw {
            Some(raw) => {
                debug!(queue = %self.keys.name(), id, "fifo dequeue");
                Ok(Some(decode(&raw)?))
            }
            None => {
                warn!(queue = %self.keys.name(), id, "claimed slot has no value");
                Ok(None)
            }
        }
    }

    async fn count(&self) -> Result<u64, QueueError> {
        let (max_dequeued, max_enqueued) = self.window().await?;
        Ok(max_enqueued.saturating_sub(max_dequeued))
    }

    async fn clear(&self) -> Result<&Self, QueueError> {
        let (max_dequeued, max_enqueued) = self.window().await?;
        if max_dequeued != max_enqueued {
            if max_dequeued < max_enqueued {
                let slots = self.keys.slots(max_dequeued + 1..=max_enqueued);
                self.store.delete_multi(&slots).await?;
            }
            self.store.delete(self.keys.max_dequeued()).await?;
            self.store.delete(self.keys.max_enqueued()).await?;
            debug!(queue = %self.keys.name(), max_dequeued, max_enqueued, "fifo cleared");
        }
        Ok(self)
    }

    async fn iter(&self) -> Result<Drain<T>, QueueError> {
        let (max_dequeued, max_enqueued) = self.window().await?;
        if max_dequeued >= max_enqueued {
            return Ok(Drain::empty());
        }

        let slots = self.keys.slots(max_dequeued + 1..=max_enqueued);
        let found = self.store.get_multi(&slots).await?;
        collect_slots(&slots, found)
    }
}

impl<T> Clone for FifoQueue<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            keys: self.keys.clone(),
            config: self.config,
            _values: PhantomData,
        }
    }
}

impl<T> fmt::Debug for FifoQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FifoQueue")
            .field("name", &self.keys.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
