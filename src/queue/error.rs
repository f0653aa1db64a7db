//! Error types for queue operations.

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by [`FifoQueue`](super::FifoQueue) and
/// [`LifoQueue`](super::LifoQueue).
///
/// An empty queue is never an error: `dequeue` reports it with `Ok(None)`.
#[derive(Error, Debug)]
pub enum QueueError {
    /// The underlying store failed; nothing is retried at the queue layer
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A value could not be encoded to or decoded from its slot
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid queue construction parameters
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl QueueError {
    /// Returns true if this error is potentially recoverable with a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            QueueError::Store(err) => err.is_retryable(),
            QueueError::Serialization(_) | QueueError::Configuration(_) => false,
        }
    }
}

impl From<serde_json::Error> for QueueError {
    fn from(err: serde_json::Error) -> Self {
        QueueError::Serialization(err.to_string())
    }
}
