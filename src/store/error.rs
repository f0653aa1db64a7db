//! Store-agnostic error types for slotq key-value stores.
//!
//! Every [`KvStore`](super::KvStore) implementation maps its internal failures
//! onto these variants so the queue layer can propagate them uniformly.

use thiserror::Error;

/// Errors that can occur during store operations.
///
/// # Examples
///
/// ```rust
/// use slotq::store::StoreError;
///
/// fn handle_error(err: StoreError) {
///     match err {
///         StoreError::Unavailable(msg) => {
///             // Connection lost, retry later
///             eprintln!("store unavailable: {}", msg);
///         }
///         StoreError::InvalidCounter { key, .. } => {
///             eprintln!("corrupt counter at {}", key);
///         }
///         _ => {
///             eprintln!("Error: {}", err);
///         }
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum StoreError {
    /// Store is unavailable (connection lost, service down, etc.)
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Conflict during operation
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal store error
    #[error("internal error: {0}")]
    Internal(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Timeout during operation
    #[error("operation timeout: {0}")]
    Timeout(String),

    /// A counter key holds something that is not a non-negative integer
    #[error("invalid counter value at {key}: {value:?}")]
    InvalidCounter { key: String, value: String },
}

impl StoreError {
    /// Returns true if this error is potentially recoverable with a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable(_) | StoreError::Timeout(_) | StoreError::Conflict(_)
        )
    }
}

// Conversion from Redis errors. Only transport failures are worth a retry;
// anything the server answered with is reported as internal.
#[cfg(feature = "redis")]
impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout() {
            StoreError::Timeout(err.to_string())
        } else if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
            StoreError::Unavailable(err.to_string())
        } else {
            StoreError::Internal(err.to_string())
        }
    }
}

#[cfg(all(test, feature = "redis"))]
mod tests {
    use super::*;
    use redis::{ErrorKind, RedisError};
    use std::io;

    #[test]
    fn test_redis_transport_errors_are_retryable() {
        let refused = RedisError::from(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        assert!(matches!(StoreError::from(refused), StoreError::Unavailable(_)));

        let reset = RedisError::from(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert!(StoreError::from(reset).is_retryable());

        let slow = RedisError::from(io::Error::new(io::ErrorKind::TimedOut, "slow"));
        assert!(matches!(StoreError::from(slow), StoreError::Timeout(_)));
    }

    #[test]
    fn test_redis_server_replies_are_not_retryable() {
        let reply = RedisError::from((ErrorKind::ResponseError, "ERR value is not an integer"));
        let err = StoreError::from(reply);
        assert!(matches!(err, StoreError::Internal(_)));
        assert!(!err.is_retryable());

        let auth = RedisError::from((ErrorKind::AuthenticationFailed, "WRONGPASS"));
        assert!(!StoreError::from(auth).is_retryable());
    }
}
