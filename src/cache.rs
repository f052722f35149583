//! Keyed TTL cache.
//!
//! Each entry remembers when it was fetched; freshness is decided at read
//! time against a caller-supplied TTL and the injected [`Clock`]. Stale
//! entries are kept so a failed refresh can still fall back to them.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::clock::Clock;

/// A cached value and the instant it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    /// The cached value.
    pub value: V,
    /// When the value was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    /// Returns true once the entry is at least `ttl` old.
    pub fn is_stale(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return false;
        };
        now.signed_duration_since(self.fetched_at) >= ttl
    }

    /// Age of the entry at `now`, zero if the clock went backwards.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.fetched_at)
            .to_std()
            .unwrap_or_default()
    }
}

/// A thread-safe keyed cache with per-read TTL checks.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Creates an empty store reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the value for `key` if it is younger than `ttl`.
    pub fn get_fresh(&self, key: &K, ttl: Duration) -> Option<V> {
        let now = self.clock.now();
        self.read()
            .get(key)
            .filter(|entry| !entry.is_stale(ttl, now))
            .map(|entry| entry.value.clone())
    }

    /// Returns the entry for `key` whatever its age.
    pub fn get_any(&self, key: &K) -> Option<CacheEntry<V>> {
        self.read().get(key).cloned()
    }

    /// Stores `value` under `key`, stamped with the current time.
    pub fn insert(&self, key: K, value: V) {
        let entry = CacheEntry {
            value,
            fetched_at: self.clock.now(),
        };
        self.write().insert(key, entry);
    }

    /// Removes the entry for `key`.
    pub fn invalidate(&self, key: &K) -> bool {
        self.write().remove(key).is_some()
    }

    /// Removes every entry matching `predicate`.
    pub fn invalidate_where(&self, mut predicate: impl FnMut(&K) -> bool) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|key, _| !predicate(key));
        before - entries.len()
    }

    /// Removes every entry.
    pub fn invalidate_all(&self) {
        self.write().clear();
    }

    /// Number of entries, fresh or stale.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true when the store holds nothing.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
