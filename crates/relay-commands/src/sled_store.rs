//! Persistent cooldown store on an embedded sled database.
//!
//! Each record maps the key to its expiry as big-endian unix milliseconds.
//! Check-and-set runs as a compare-and-swap loop, so two processes sharing
//! the tree (or two tasks in one) never both admit the same key.

use crate::cooldown::{whole_seconds, Admission, CooldownStore, StoreError};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Name of the sled tree holding cooldown records.
pub const COOLDOWN_TREE: &str = "cooldowns";

/// Source of the current time in unix milliseconds.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

impl From<sled::Error> for StoreError {
    fn from(error: sled::Error) -> Self {
        Self::with_source("sled operation failed", error)
    }
}

/// Cooldown store persisted with sled.
#[derive(Clone)]
pub struct SledCooldownStore {
    tree: sled::Tree,
    ttl: Duration,
    clock: Clock,
}

impl std::fmt::Debug for SledCooldownStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledCooldownStore")
            .field("tree", &COOLDOWN_TREE)
            .field("records", &self.tree.len())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SledCooldownStore {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: impl AsRef<Path>, ttl: Duration) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let db = sled::open(path).map_err(|e| {
            StoreError::with_source(format!("failed to open {}", path.display()), e)
        })?;
        info!("Opened cooldown database at {}", path.display());
        Self::from_db(&db, ttl)
    }

    /// Uses the cooldown tree of an already open database.
    pub fn from_db(db: &sled::Db, ttl: Duration) -> Result<Self, StoreError> {
        Ok(Self {
            tree: db.open_tree(COOLDOWN_TREE)?,
            ttl,
            clock: Arc::new(|| chrono::Utc::now().timestamp_millis()),
        })
    }

    /// Replaces the wall clock, for tests.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Flushes pending writes to disk.
    pub async fn flush(&self) -> Result<usize, StoreError> {
        Ok(self.tree.flush_async().await?)
    }

    fn ttl_millis(&self) -> i64 {
        i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX)
    }

    async fn run_blocking<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&sled::Tree) -> Result<T, StoreError> + Send + 'static,
    {
        let tree = self.tree.clone();
        tokio::task::spawn_blocking(move || op(&tree))
            .await
            .map_err(|e| StoreError::with_source("cooldown store task failed", e))?
    }
}

fn decode_expiry(bytes: &[u8]) -> Result<i64, StoreError> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::new(format!("corrupt cooldown record of {} bytes", bytes.len())))?;
    Ok(i64::from_be_bytes(raw))
}

fn acquire(tree: &sled::Tree, key: &str, now: i64, ttl_ms: i64) -> Result<Admission, StoreError> {
    let new_expiry = now.saturating_add(ttl_ms).to_be_bytes();

    loop {
        let current = tree.get(key)?;
        if let Some(bytes) = &current {
            let expires_at = decode_expiry(bytes)?;
            if expires_at > now {
                let remaining = Duration::from_millis(u64::try_from(expires_at - now).unwrap_or(0));
                return Ok(Admission::Blocked {
                    remaining_secs: whole_seconds(remaining),
                });
            }
        }

        match tree.compare_and_swap(key, current, Some(&new_expiry[..]))? {
            Ok(()) => return Ok(Admission::Allowed),
            // Another writer got there first; re-read its record.
            Err(_) => debug!(key, "Cooldown record changed during acquire, retrying"),
        }
    }
}

fn purge(tree: &sled::Tree, now: i64) -> Result<usize, StoreError> {
    let mut removed = 0;
    for item in tree.iter() {
        let (key, value) = item?;
        let expired = match decode_expiry(&value) {
            Ok(expires_at) => expires_at <= now,
            Err(e) => {
                warn!("Dropping unreadable cooldown record: {}", e);
                true
            }
        };
        // Only delete the exact record we inspected; a fresh acquire wins.
        if expired && tree.compare_and_swap(&key, Some(&value), None as Option<&[u8]>)?.is_ok() {
            removed += 1;
        }
    }
    Ok(removed)
}

#[async_trait]
impl CooldownStore for SledCooldownStore {
    async fn try_acquire(&self, key: &str) -> Result<Admission, StoreError> {
        let now = (self.clock)();
        let ttl_ms = self.ttl_millis();
        let owned_key = key.to_string();

        let admission = self
            .run_blocking(move |tree| acquire(tree, &owned_key, now, ttl_ms))
            .await?;

        debug!(key, ?admission, "Cooldown admission checked");
        Ok(admission)
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = (self.clock)();
        let removed = self.run_blocking(move |tree| purge(tree, now)).await?;

        if removed > 0 {
            debug!("Purged {} expired cooldown records", removed);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    fn manual_clock(start: i64) -> (Arc<AtomicI64>, Clock) {
        let now = Arc::new(AtomicI64::new(start));
        let handle = now.clone();
        (now, Arc::new(move || handle.load(Ordering::SeqCst)))
    }

    fn temp_store(ttl: Duration) -> (tempfile::TempDir, SledCooldownStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SledCooldownStore::open(dir.path().join("db"), ttl).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_acquire_then_blocked() {
        let (_dir, store) = temp_store(Duration::from_secs(43_200));
        let (now, clock) = manual_clock(1_700_000_000_000);
        let store = store.with_clock(clock);

        assert_eq!(store.try_acquire("telegram_user:1").await.unwrap(), Admission::Allowed);

        now.fetch_add(1_500, Ordering::SeqCst);
        assert_eq!(
            store.try_acquire("telegram_user:1").await.unwrap(),
            Admission::Blocked {
                remaining_secs: 43_199
            }
        );
    }

    #[tokio::test]
    async fn test_expiry_and_purge() {
        let (_dir, store) = temp_store(Duration::from_secs(60));
        let (now, clock) = manual_clock(1_000_000);
        let store = store.with_clock(clock);

        store.try_acquire("a").await.unwrap();
        now.fetch_add(30_000, Ordering::SeqCst);
        store.try_acquire("b").await.unwrap();
        now.fetch_add(30_000, Ordering::SeqCst);

        // "a" expired exactly now; "b" has 30s left.
        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.try_acquire("a").await.unwrap(), Admission::Allowed);
        assert_eq!(
            store.try_acquire("b").await.unwrap(),
            Admission::Blocked { remaining_secs: 30 }
        );
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = sled::open(dir.path()).unwrap();
        let tree = db.open_tree(COOLDOWN_TREE).unwrap();
        tree.insert("bad", &b"xyz"[..]).unwrap();

        assert!(acquire(&tree, "bad", 0, 1_000).is_err());
        assert_eq!(purge(&tree, 0).unwrap(), 1);
    }
}
