//! # Content-addressed caches
//!
//! Every expensive derived artifact (pipeline layouts, pipelines,
//! descriptor set layouts, samplers, acceleration structures, uploaded
//! meshes, compiled shader modules) is cached by a content hash of its
//! descriptor rather than pointer identity (spec §4.9). Generalizes the
//! teacher's path-keyed `MaterialCache` (`RwLock<HashMap<K, Entry>>`,
//! `Arc`-shared values) into a structural-hash-keyed generic cache with
//! LRU eviction against a byte budget, instead of "reload on file mtime".

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

/// A value a [`ContentCache`] can store: every entry reports its own
/// footprint so the cache can enforce a byte budget during eviction.
pub trait CacheSize {
    fn cache_size_bytes(&self) -> u64;
}

struct CacheEntry<V> {
    value: Arc<V>,
    size_bytes: u64,
    /// Monotonically increasing touch counter, used for LRU ordering.
    last_used: u64,
}

/// A thread-safe, content-addressed cache. `GetOrCreate` either returns
/// an existing ref-counted entry or builds one with `create` and inserts
/// it (spec §4.9, `GetOrCreate(descriptor)`).
pub struct ContentCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    clock: std::sync::atomic::AtomicU64,
    byte_budget: u64,
}

impl<K, V> ContentCache<K, V>
where
    K: Eq + Hash + Clone,
    V: CacheSize,
{
    pub fn new(byte_budget: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock: std::sync::atomic::AtomicU64::new(0),
            byte_budget,
        }
    }

    /// Return the cached value for `key`, or build it with `create`,
    /// cache it, and return it. Eviction runs after insertion if the
    /// byte budget is now exceeded.
    pub fn get_or_create(&self, key: K, create: impl FnOnce() -> V) -> Arc<V> {
        {
            let mut entries = self.entries.write().unwrap();
            if let Some(entry) = entries.get_mut(&key) {
                entry.last_used = self.tick();
                return Arc::clone(&entry.value);
            }
        }

        let value = Arc::new(create());
        let size_bytes = value.cache_size_bytes();
        let last_used = self.tick();

        let mut entries = self.entries.write().unwrap();
        // Another thread may have raced us to the same key; prefer the
        // entry already present so both callers observe the same Arc.
        let value = entries
            .entry(key)
            .or_insert_with(|| CacheEntry { value: Arc::clone(&value), size_bytes, last_used })
            .value
            .clone();
        drop(entries);
        self.evict_to_budget();
        value
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let mut entries = self.entries.write().unwrap();
        let entry = entries.get_mut(key)?;
        entry.last_used = self.tick();
        Some(Arc::clone(&entry.value))
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_bytes(&self) -> u64 {
        self.entries.read().unwrap().values().map(|e| e.size_bytes).sum()
    }

    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
    }

    /// Evict least-recently-used entries until total size is within
    /// budget (spec §4.9, "Eviction is LRU with a configurable byte
    /// budget"). An entry with more than one outstanding `Arc` reference
    /// is still dropped from the cache's own table; the caller's
    /// existing handle stays valid until it drops.
    fn evict_to_budget(&self) {
        let mut entries = self.entries.write().unwrap();
        let mut total: u64 = entries.values().map(|e| e.size_bytes).sum();
        while total > self.byte_budget {
            let victim_key = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(k, _)| k.clone());
            let Some(victim_key) = victim_key else { break };
            if let Some(entry) = entries.remove(&victim_key) {
                total -= entry.size_bytes;
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Blob(u64);
    impl CacheSize for Blob {
        fn cache_size_bytes(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn get_or_create_returns_the_same_arc_on_repeat_lookup() {
        let cache: ContentCache<u64, Blob> = ContentCache::new(1_000_000);
        let a = cache.get_or_create(1, || Blob(10));
        let b = cache.get_or_create(1, || Blob(999));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn lru_eviction_respects_byte_budget() {
        let cache: ContentCache<u64, Blob> = ContentCache::new(150);
        cache.get_or_create(1, || Blob(100));
        cache.get_or_create(2, || Blob(100));
        // Budget is 150 bytes; inserting the second entry pushes total to
        // 200 and the least-recently-touched (key 1) is evicted.
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&2).is_some());
        assert!(cache.get(&1).is_none());
    }

    #[test]
    fn touching_an_entry_protects_it_from_eviction() {
        let cache: ContentCache<u64, Blob> = ContentCache::new(250);
        cache.get_or_create(1, || Blob(100));
        cache.get_or_create(2, || Blob(100));
        cache.get(&1); // entry 1 is now more recently used than entry 2
        cache.get_or_create(3, || Blob(100)); // pushes total to 300, forcing one eviction

        assert!(cache.get(&1).is_some());
        assert!(cache.get(&2).is_none());
        assert!(cache.get(&3).is_some());
    }
}
