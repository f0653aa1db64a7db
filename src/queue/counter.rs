//! Lazy, race-safe bootstrap of a shared high-water-mark counter.
//!
//! There is no separate "create queue" step. The first enqueuer finds the
//! counter missing, tries to create it with `add_if_absent`, and either wins
//! (it owns the seed id) or loses to a concurrent enqueuer and falls back to
//! `increment` like everyone else. Exactly one caller ever receives the seed.

use std::time::Duration;

use tracing::debug;

use crate::store::{KvStore, StoreError};

/// Bounds the init loop when the counter keeps vanishing underneath us
/// (concurrent `clear`, or the key expiring between round trips).
const MAX_INIT_ATTEMPTS: u32 = 8;

/// Outcome of claiming the next id on a high-water-mark counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Allocation {
    pub id: u64,
    /// This call created the counter.
    pub initialized: bool,
}

/// Advance `key` by one and return the new id, creating the counter at
/// `seed` if it does not exist.
pub(crate) async fn allocate(
    store: &dyn KvStore,
    key: &str,
    seed: u64,
    ttl: Duration,
) -> Result<Allocation, StoreError> {
    for _ in 0..MAX_INIT_ATTEMPTS {
        if let Some(id) = store.increment(key).await? {
            return Ok(Allocation {
                id,
                initialized: false,
            });
        }

        if store.add_if_absent(key, &seed.to_string(), ttl).await? {
            debug!(key, seed, "initialized counter");
            return Ok(Allocation {
                id: seed,
                initialized: true,
            });
        }

        // Lost the init race; the winner's counter is there now.
        if let Some(id) = store.increment(key).await? {
            return Ok(Allocation {
                id,
                initialized: false,
            });
        }
    }

    Err(StoreError::Conflict(format!(
        "counter {} disappeared during {} initialization attempts",
        key, MAX_INIT_ATTEMPTS
    )))
}
