//! In-process replay store.

use std::any::Any;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::error::CacheResult;
use crate::store::ReplayStore;

/// In-memory replay store for single-instance deployments.
///
/// Entries expire `key_expiration` after they were saved. Expired entries are
/// invisible immediately and are physically removed by a sweep that runs at
/// most once per expiration period, piggybacking on [`ReplayStore::save`].
///
/// For deployments with multiple instances, use a distributed store.
#[derive(Debug)]
pub struct InMemoryReplayStore {
    entries: DashMap<String, StoredKey>,
    key_expiration: Duration,
    last_sweep: Mutex<Instant>,
}

#[derive(Debug)]
struct StoredKey {
    value: String,
    created_at: Instant,
}

impl StoredKey {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) >= ttl
    }
}

impl InMemoryReplayStore {
    /// Creates an empty store whose keys live for `key_expiration`.
    #[must_use]
    pub fn new(key_expiration: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            key_expiration,
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// Returns the configured key lifetime.
    #[must_use]
    pub const fn key_expiration(&self) -> Duration {
        self.key_expiration
    }

    /// Returns the number of stored entries, including expired ones not yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every expired entry and returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        *self.last_sweep.lock() = now;
        self.evict_at(now)
    }

    fn evict_at(&self, now: Instant) -> usize {
        let ttl = self.key_expiration;
        let mut evicted = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(now, ttl);
            if !keep {
                evicted += 1;
            }
            keep
        });
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted expired request IDs");
        }
        evicted
    }

    fn sweep_if_due(&self, now: Instant) {
        {
            let mut last = self.last_sweep.lock();
            if now.saturating_duration_since(*last) < self.key_expiration {
                return;
            }
            *last = now;
        }
        self.evict_at(now);
    }
}

#[async_trait]
impl ReplayStore for InMemoryReplayStore {
    async fn save(&self, key: &str, value: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        self.sweep_if_due(now);

        let stored = StoredKey {
            value: value.to_string(),
            created_at: now,
        };

        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now, self.key_expiration) {
                    occupied.insert(stored);
                    Ok(Some(value.to_string()))
                } else {
                    Ok(None)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(stored);
                Ok(Some(value.to_string()))
            }
        }
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        Ok(self
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now, self.key_expiration))
            .map(|entry| entry.value.clone()))
    }

    async fn remove(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .filter(|(_, entry)| !entry.is_expired(now, self.key_expiration))
            .map(|(key, _)| key))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
