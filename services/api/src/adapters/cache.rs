//! services/api/src/adapters/cache.rs
//!
//! An in-process implementation of the `CacheStore` port.
//!
//! Entries live in a `DashMap` alongside their expiry instant. Expired
//! entries are dropped lazily when read and swept when the map reaches its
//! capacity, so no background task is needed.

use async_trait::async_trait;
use dashmap::DashMap;
use priority_stream_core::ports::{CacheStore, PortError, PortResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// A TTL cache bounded to `max_entries` keys.
///
/// `occupied` counts stored keys. A new key must reserve a slot in it
/// before it is inserted, which keeps the bound exact under concurrent writers.
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
    occupied: AtomicUsize,
    max_entries: usize,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            occupied: AtomicUsize::new(0),
            max_entries,
        }
    }

    /// The number of stored keys, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn try_reserve(&self) -> bool {
        self.occupied
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.max_entries).then_some(n + 1)
            })
            .is_ok()
    }

    fn release(&self, slots: usize) {
        if slots > 0 {
            self.occupied.fetch_sub(slots, Ordering::SeqCst);
        }
    }

    fn purge_expired(&self, now: Instant) {
        let mut purged = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(now);
            if !keep {
                purged += 1;
            }
            keep
        });
        self.release(purged);
        debug!(purged, "Swept expired cache entries");
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                return Ok(Some(entry.value.clone()));
            }
        }
        // The read guard is released above; remove only if still expired.
        if self
            .entries
            .remove_if(key, |_, entry| entry.is_expired(now))
            .is_some()
        {
            self.release(1);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> PortResult<()> {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).ok_or_else(|| {
            PortError::Unexpected(format!("ttl of {}s is out of range", ttl.as_secs()))
        })?;
        let entry = Entry { value, expires_at };

        if let Some(mut existing) = self.entries.get_mut(key) {
            *existing = entry;
            return Ok(());
        }

        if !self.try_reserve() {
            self.purge_expired(now);
            if !self.try_reserve() {
                return Err(PortError::Unavailable(format!(
                    "cache is full ({} entries)",
                    self.max_entries
                )));
            }
        }
        if self.entries.insert(key.to_string(), entry).is_some() {
            // Another writer stored the same key first and holds its own slot.
            self.release(1);
        }
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> PortResult<()> {
        for key in keys {
            if self.entries.remove(key).is_some() {
                self.release(1);
            }
        }
        Ok(())
    }

    async fn ping(&self) -> PortResult<()> {
        Ok(())
    }
}
