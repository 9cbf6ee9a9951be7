//! Bounded time-to-live cache.
//!
//! Backs the socket's group metadata and recent message caches. Entries expire
//! a fixed time after insertion; when the cache is full the least recently
//! accessed entry makes room for the new one.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Cache sizing and expiry settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries (0 means unbounded)
    pub max_entries: usize,
    /// Time-to-live for entries (None = no expiration)
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            ttl: Some(Duration::from_secs(300)), // 5 minutes
        }
    }
}

/// Hit/miss counters of a [`TtlCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found a live entry
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Entries dropped because they outlived the TTL
    pub ttl_evictions: u64,
    /// Entries dropped to make room for a new one
    pub lru_evictions: u64,
}

impl CacheStats {
    /// Hit ratio as a percentage.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    /// Access tick for LRU ordering
    last_access: u64,
}

struct CacheState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    tick: u64,
    stats: CacheStats,
}

impl<K, V> CacheState<K, V> {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

/// Thread-safe TTL cache with LRU eviction.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use wa_shell::{CacheConfig, TtlCache};
///
/// let cache = TtlCache::with_config(CacheConfig {
///     max_entries: 2,
///     ttl: Some(Duration::from_secs(60)),
/// });
/// cache.insert("a", 1);
/// cache.insert("b", 2);
/// assert_eq!(cache.get(&"a"), Some(1)); // "b" is now least recently used
///
/// cache.insert("c", 3);
/// assert_eq!(cache.get(&"b"), None);
/// assert_eq!(cache.stats().lru_evictions, 1);
/// ```
pub struct TtlCache<K, V> {
    state: Mutex<CacheState<K, V>>,
    config: CacheConfig,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a cache with the default configuration.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a cache whose entries live for `ttl`, holding at most
    /// `max_entries`.
    pub fn with_ttl(ttl: Duration, max_entries: usize) -> Self {
        Self::with_config(CacheConfig {
            max_entries,
            ttl: Some(ttl),
        })
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                tick: 0,
                stats: CacheStats::default(),
            }),
            config,
        }
    }

    /// Looks up a live entry. An expired entry is evicted and counts as a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut state = self.state.lock();
        let tick = state.next_tick();

        let expired = match state.entries.get_mut(key) {
            Some(entry) if !self.is_expired(entry) => {
                entry.last_access = tick;
                let value = entry.value.clone();
                state.stats.hits += 1;
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            state.entries.remove(key);
            state.stats.ttl_evictions += 1;
        }
        state.stats.misses += 1;
        None
    }

    /// Inserts or replaces an entry, restarting its TTL.
    ///
    /// Returns the previous live value for `key`.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let mut state = self.state.lock();
        let tick = state.next_tick();

        let previous = state
            .entries
            .remove(&key)
            .filter(|entry| !self.is_expired(entry))
            .map(|entry| entry.value);

        if self.config.max_entries > 0 && state.entries.len() >= self.config.max_entries {
            self.purge_locked(&mut state);
            if state.entries.len() >= self.config.max_entries {
                Self::evict_lru(&mut state);
            }
        }

        state.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                last_access: tick,
            },
        );
        previous
    }

    /// Removes an entry, returning its value if it was still live.
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut state = self.state.lock();
        state
            .entries
            .remove(key)
            .filter(|entry| !self.is_expired(entry))
            .map(|entry| entry.value)
    }

    /// Drops every expired entry, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let mut state = self.state.lock();
        self.purge_locked(&mut state)
    }

    /// Removes all entries. Statistics are kept.
    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }

    /// Number of stored entries, expired ones not yet purged included.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn is_expired(&self, entry: &CacheEntry<V>) -> bool {
        self.config
            .ttl
            .map_or(false, |ttl| entry.inserted_at.elapsed() >= ttl)
    }

    fn purge_locked(&self, state: &mut CacheState<K, V>) -> usize {
        let before = state.entries.len();
        state.entries.retain(|_, entry| !self.is_expired(entry));
        let purged = before - state.entries.len();
        state.stats.ttl_evictions += purged as u64;
        purged
    }

    fn evict_lru(state: &mut CacheState<K, V>) {
        let lru_key = state
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(key, _)| key.clone());

        if let Some(key) = lru_key {
            state.entries.remove(&key);
            state.stats.lru_evictions += 1;
        }
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TtlCache")
            .field("entries", &state.entries.len())
            .field("config", &self.config)
            .field("stats", &state.stats)
            .finish()
    }
}
