//! Cooldown stores gating how often a requester may trigger a reading.
//!
//! A cooldown record is a presence marker with a time-to-live. While it
//! exists the requester is blocked; once it expires the next request creates
//! a fresh one. There is no release: blocking is strictly time-based.

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

/// Result of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// No live record existed; one has been created.
    Allowed,
    /// A live record exists.
    Blocked {
        /// Seconds until the record expires, rounded up.
        remaining_secs: u64,
    },
}

/// The store could not answer. Distinct from [`Admission::Blocked`].
#[derive(Error, Debug)]
#[error("{message}")]
pub struct StoreError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    /// Create a new store error
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new store error with source
    pub fn with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Key-value store of cooldown records.
#[async_trait]
pub trait CooldownStore: Send + Sync {
    /// Atomically creates a record for `key` unless a live one exists.
    ///
    /// Concurrent calls for the same key admit at most one caller per TTL.
    async fn try_acquire(&self, key: &str) -> Result<Admission, StoreError>;

    /// Removes expired records and returns how many were removed.
    async fn purge_expired(&self) -> Result<usize, StoreError>;
}

/// Whole seconds in `duration`, rounding any remainder up.
pub(crate) fn whole_seconds(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

/// Process-local cooldown store.
///
/// Uses the tokio clock, so tests can pause and advance time.
#[derive(Debug)]
pub struct MemoryCooldownStore {
    /// Expiry instant per key
    records: DashMap<String, Instant>,
    ttl: Duration,
}

impl MemoryCooldownStore {
    /// Create a store whose records live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            records: DashMap::new(),
            ttl,
        }
    }

    /// Number of stored records, expired ones included until purged
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl CooldownStore for MemoryCooldownStore {
    async fn try_acquire(&self, key: &str) -> Result<Admission, StoreError> {
        let now = Instant::now();

        // The entry guard locks the key's shard for the whole check-and-set.
        let admission = match self.records.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                let expires_at = *entry.get();
                if expires_at > now {
                    Admission::Blocked {
                        remaining_secs: whole_seconds(expires_at - now),
                    }
                } else {
                    entry.insert(now + self.ttl);
                    Admission::Allowed
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now + self.ttl);
                Admission::Allowed
            }
        };

        debug!(key, ?admission, "Cooldown admission checked");
        Ok(admission)
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = Instant::now();
        let before = self.records.len();
        self.records.retain(|_, expires_at| *expires_at > now);
        let removed = before.saturating_sub(self.records.len());

        if removed > 0 {
            debug!("Purged {} expired cooldown records", removed);
        }
        Ok(removed)
    }
}
