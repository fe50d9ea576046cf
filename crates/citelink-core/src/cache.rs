//! Memoisation of definition indexes built from reference blocks.
//!
//! Building an index means scanning every line of a reference block with
//! several regexes. The batch tool reprocesses the same caches repeatedly, and
//! the linker builds one index per bucket, so identical (bucket, block) pairs
//! are looked up in a [`DashMap`] keyed by a SHA-256 digest of the input.
//!
//! The cache is an explicit object. Callers that want sharing wrap it in an
//! `Arc`; callers that don't simply pass `None` to the linker. It holds at most
//! `max_entries` indexes; inserting past the limit evicts an existing entry.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use sha2::{Digest, Sha256};

/// One definition: the lookup key and the full text it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionEntry {
    pub key: String,
    pub text: String,
}

/// Ordered definitions plus a key lookup. First occurrence of a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionIndex {
    entries: Vec<DefinitionEntry>,
    lookup: HashMap<String, usize>,
}

impl DefinitionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `key -> text` unless `key` is already present.
    /// Returns `true` when the entry was added.
    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) -> bool {
        let key = key.into();
        if self.lookup.contains_key(&key) {
            return false;
        }
        self.lookup.insert(key.clone(), self.entries.len());
        self.entries.push(DefinitionEntry {
            key,
            text: text.into(),
        });
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.lookup
            .get(key)
            .map(|&i| self.entries[i].text.as_str())
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[DefinitionEntry] {
        &self.entries
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Hit/miss counters for a [`DefinitionIndexCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

/// Entry limit used by [`DefinitionIndexCache::new`].
pub const DEFAULT_MAX_ENTRIES: usize = 4096;

/// Concurrent, size-bounded cache of [`DefinitionIndex`] values.
#[derive(Debug)]
pub struct DefinitionIndexCache {
    map: DashMap<String, Arc<DefinitionIndex>>,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl Default for DefinitionIndexCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionIndexCache {
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    /// A cache holding at most `max_entries` indexes (minimum 1).
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            map: DashMap::new(),
            max_entries: max_entries.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    fn key(bucket: &str, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bucket.as_bytes());
        hasher.update([0u8]);
        hasher.update(text.as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    /// Return the cached index for `(bucket, text)`, building it with `build`
    /// on a miss.
    pub fn get_or_insert_with<F>(&self, bucket: &str, text: &str, build: F) -> Arc<DefinitionIndex>
    where
        F: FnOnce() -> DefinitionIndex,
    {
        let key = Self::key(bucket, text);
        if let Some(found) = self.map.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(bucket, "definition index cache hit");
            return Arc::clone(found.value());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let built = Arc::new(build());
        while self.map.len() >= self.max_entries {
            // Clone the key first: removing while a shard guard is held deadlocks.
            let Some(victim) = self.map.iter().next().map(|e| e.key().clone()) else {
                break;
            };
            if self.map.remove(&victim).is_some() {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
        // Another worker may have raced us; keep whichever landed first.
        let entry = self.map.entry(key).or_insert(built);
        Arc::clone(entry.value())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&self) {
        self.map.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.map.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DefinitionIndex {
        let mut idx = DefinitionIndex::new();
        idx.insert("1", "First");
        idx.insert("2", "Second");
        idx
    }

    #[test]
    fn test_index_first_occurrence_wins() {
        let mut idx = sample();
        assert!(!idx.insert("1", "Duplicate"));
        assert_eq!(idx.get("1"), Some("First"));
        assert_eq!(idx.len(), 2);
        assert_eq!(idx.entries()[1].key, "2");
    }

    #[test]
    fn test_cache_hit_and_miss() {
        let cache = DefinitionIndexCache::new();
        let a = cache.get_or_insert_with("numeric", "1. First", sample);
        let b = cache.get_or_insert_with("numeric", "1. First", || panic!("should be cached"));
        assert!(Arc::ptr_eq(&a, &b));
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_cache_keys_include_bucket() {
        let cache = DefinitionIndexCache::new();
        cache.get_or_insert_with("numeric", "same", DefinitionIndex::new);
        cache.get_or_insert_with("tex", "same", DefinitionIndex::new);
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_stays_within_limit() {
        let cache = DefinitionIndexCache::with_max_entries(3);
        for i in 0..10 {
            cache.get_or_insert_with("numeric", &format!("{i}. Entry {i}"), sample);
            assert!(cache.len() <= 3);
        }
        let stats = cache.stats();
        assert_eq!(stats.entries, 3);
        assert_eq!(stats.misses, 10);
        assert_eq!(stats.evictions, 7);

        let again = cache.get_or_insert_with("numeric", "9. Entry 9", || panic!("latest entry kept"));
        assert_eq!(again.len(), 2);
    }
}
