//! Bounded LRU cache of resolved persons, keyed by raw address.

use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::trace;

use crate::model::person::PersonRecord;

/// Default number of persons kept in memory.
pub const DEFAULT_CACHE_SIZE: usize = 500;

/// Maps raw addresses to resolved persons.
///
/// Holds at most `capacity` entries. Both lookups and insertions mark an
/// entry as most recently used; inserting into a full cache evicts the
/// least recently used entry first.
pub struct PersonCache {
    entries: LruCache<String, PersonRecord>,
}

impl PersonCache {
    /// Create a cache holding at most `capacity` persons (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Look up an address and mark it as recently used.
    pub fn get(&mut self, address: &str) -> Option<&PersonRecord> {
        self.entries.get(address)
    }

    /// Check membership without touching recency.
    pub fn contains(&self, address: &str) -> bool {
        self.entries.contains(address)
    }

    /// Insert or replace a person, evicting the least recently used entry if full.
    pub fn insert(&mut self, address: &str, record: PersonRecord) {
        if let Some((evicted, _)) = self.entries.push(address.to_string(), record) {
            if evicted != address {
                trace!(address = %evicted, "Evicted person from cache");
            }
        }
    }

    /// The address that would be evicted next.
    pub fn least_recently_used(&self) -> Option<&str> {
        self.entries.peek_lru().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for PersonCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}
