//! Queue configuration and construction.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::QueueError;
use crate::store::KvStore;

/// Default lifetime of every counter and slot key: 24 hours.
pub const DEFAULT_TTL_SECS: u64 = 86_400;

/// Per-queue settings.
///
/// Deserializes from e.g. `{ "ttl_secs": 3600 }`; missing fields take their
/// defaults. A TTL of zero means keys never expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Expiry applied independently to every counter and slot key, in seconds
    pub ttl_secs: u64,
}

impl QueueConfig {
    /// Key lifetime as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Override the key lifetime.
    ///
    /// Whole seconds are kept. A non-zero TTL shorter than a second becomes
    /// one second, since zero would mean the keys never expire.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = match ttl.as_secs() {
            0 if !ttl.is_zero() => 1,
            secs => secs,
        };
        self
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

/// Builder shared by [`FifoQueue`](super::FifoQueue) and
/// [`LifoQueue`](super::LifoQueue).
///
/// ```rust,ignore
/// let queue = FifoQueue::builder(store)
///     .name("emails")
///     .ttl(Duration::from_secs(3600))
///     .elements(vec!["a".to_string(), "b".to_string()])
///     .build()
///     .await?;
/// ```
pub struct QueueBuilder<Q, T> {
    pub(crate) store: Arc<dyn KvStore>,
    pub(crate) name: Option<String>,
    pub(crate) config: QueueConfig,
    pub(crate) elements: Vec<T>,
    _queue: PhantomData<fn() -> Q>,
}

impl<Q, T> QueueBuilder<Q, T> {
    pub(crate) fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            name: None,
            config: QueueConfig::default(),
            elements: Vec::new(),
            _queue: PhantomData,
        }
    }

    /// Set the queue name (used as key prefix).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: QueueConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the key lifetime.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config = self.config.with_ttl(ttl);
        self
    }

    /// Values enqueued, in order, when the queue is built.
    pub fn elements(mut self, elements: impl IntoIterator<Item = T>) -> Self {
        self.elements.extend(elements);
        self
    }

    /// Validate the builder and split it into its parts.
    pub(crate) fn into_parts(
        self,
    ) -> Result<(Arc<dyn KvStore>, String, QueueConfig, Vec<T>), QueueError> {
        let name = self
            .name
            .ok_or_else(|| QueueError::Configuration("queue name is required".into()))?;
        if name.is_empty() {
            return Err(QueueError::Configuration(
                "queue name must not be empty".into(),
            ));
        }
        Ok((self.store, name, self.config, self.elements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_default_ttl_is_one_day() {
        let config = QueueConfig::default();
        assert_eq!(config.ttl(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_sub_second_ttl_rounds_up() {
        let config = QueueConfig::default().with_ttl(Duration::from_millis(500));
        assert_eq!(config.ttl_secs, 1);

        let config = QueueConfig::default().with_ttl(Duration::from_nanos(1));
        assert_eq!(config.ttl_secs, 1);

        let config = QueueConfig::default().with_ttl(Duration::from_millis(2500));
        assert_eq!(config.ttl_secs, 2);

        let config = QueueConfig::default().with_ttl(Duration::ZERO);
        assert_eq!(config.ttl_secs, 0);
    }

    #[test]
    fn test_config_deserialize() {
        let config: QueueConfig = serde_json::from_str(r#"{"ttl_secs": 60}"#).unwrap();
        assert_eq!(config.ttl(), Duration::from_secs(60));

        let config: QueueConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, QueueConfig::default());
    }

    #[test]
    fn test_builder_requires_name() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());

        let missing = QueueBuilder::<(), u32>::new(store.clone()).into_parts();
        assert!(matches!(missing, Err(QueueError::Configuration(_))));

        let empty = QueueBuilder::<(), u32>::new(store.clone()).name("").into_parts();
        assert!(matches!(empty, Err(QueueError::Configuration(_))));

        let (_, name, config, elements) = QueueBuilder::<(), u32>::new(store)
            .name("q")
            .ttl(Duration::from_secs(5))
            .elements([1, 2])
            .into_parts()
            .unwrap();
        assert_eq!(name, "q");
        assert_eq!(config.ttl_secs, 5);
        assert_eq!(elements, vec![1, 2]);
    }
}
