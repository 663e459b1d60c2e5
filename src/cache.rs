//! In-memory cache with per-entry TTL (time-to-live).
//!
//! Used by the update resolver to avoid scraping the same release page
//! twice within a session. Entries expire a fixed duration after they were
//! written. Expired entries are never returned: [`TtlCache::get`] deletes
//! them on access and every [`TtlCache::set`] sweeps the whole map.
//!
//! The cache itself is not synchronized. Shared owners wrap it in a lock.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use upwatch::cache::TtlCache;
//!
//! let mut cache = TtlCache::new(Duration::from_secs(60));
//!
//! cache.set("firefox", "115.0.0".to_string());
//! assert_eq!(cache.get("firefox"), Some("115.0.0".to_string()));
//! ```

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Default cache TTL in seconds.
pub const DEFAULT_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| now < expires_at)
    }
}

/// A key-value store whose entries expire after a fixed TTL.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Creates an empty cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Creates an empty cache with a TTL given in seconds.
    pub fn with_ttl_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Retrieves a live value.
    ///
    /// An expired entry is removed and `None` is returned.
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.get_at(key, Instant::now())
    }

    fn get_at<Q>(&mut self, key: &Q, now: Instant) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let entry = self.entries.get(key)?;
        if entry.is_live(now) {
            return Some(entry.value.clone());
        }

        self.entries.remove(key);
        None
    }

    /// Stores a value, replacing any previous entry for the key.
    ///
    /// Also evicts every entry that has already expired. A TTL too large to
    /// add to the current time never expires.
    pub fn set(&mut self, key: K, value: V) {
        self.set_at(key, value, Instant::now());
    }

    fn set_at(&mut self, key: K, value: V, now: Instant) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now.checked_add(self.ttl),
            },
        );
        self.purge_expired_at(now);
    }

    /// Removes all expired entries, returning how many were dropped.
    pub fn purge_expired(&mut self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    fn purge_expired_at(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before - self.entries.len()
    }

    /// Clears all cached entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::with_ttl_secs(DEFAULT_TTL_SECS)
    }
}
