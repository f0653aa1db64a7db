//! Key naming for a queue's counters and slots.
//!
//! Every key a queue touches is `<name>--<suffix>`. Existing deployments read
//! and write exactly these strings, so they must not change.

use std::ops::RangeInclusive;

const MAX_ENQUEUED: &str = "max-enqueued";
const MAX_DEQUEUED: &str = "max-dequeued";
const SEPARATOR: &str = "--";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueueKeys {
    name: String,
    max_enqueued: String,
    max_dequeued: String,
}

impl QueueKeys {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            max_enqueued: format!("{}{}{}", name, SEPARATOR, MAX_ENQUEUED),
            max_dequeued: format!("{}{}{}", name, SEPARATOR, MAX_DEQUEUED),
            name,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// High-water mark of assigned ids.
    pub(crate) fn max_enqueued(&self) -> &str {
        &self.max_enqueued
    }

    /// High-water mark of consumed ids (FIFO only).
    pub(crate) fn max_dequeued(&self) -> &str {
        &self.max_dequeued
    }

    pub(crate) fn slot(&self, id: u64) -> String {
        format!("{}{}{}", self.name, SEPARATOR, id)
    }

    /// Slot keys for every id in `ids`, ascending.
    pub(crate) fn slots(&self, ids: RangeInclusive<u64>) -> Vec<String> {
        ids.map(|id| self.slot(id)).collect()
    }
}
