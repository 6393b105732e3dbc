
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use ketchsql_storage::Dictionary;
use lru::LruCache;

/// Identity of a shared dictionary. Dictionaries with the same content hash
/// are assumed to hold the same keys; size is the tiebreaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DictionaryKey {
    pub hash: u128,
    pub size: u64,
}

/// One memoized kernel run over a dictionary. `dictionary_holder` keeps the
/// input dictionary alive so its hash stays meaningful for the lifetime of
/// the entry. `index_mapping` remaps dictionary positions into
/// `function_result`: `new_pos = index_mapping[old_pos]`.
#[derive(Debug, Clone)]
pub struct CachedValues {
    pub dictionary_holder: Arc<Dictionary>,
    pub function_result: Arc<Dictionary>,
    pub index_mapping: Arc<Vec<u32>>,
}

/// Bounded LRU cache of kernel results keyed by dictionary identity. Sized
/// to the number of concurrent reader streams, so one slot per stream is
/// expected.
pub struct DictionaryResultCache {
    cache: Mutex<LruCache<DictionaryKey, Arc<CachedValues>>>,
}

impl DictionaryResultCache {
    pub fn new(cache_size: NonZeroUsize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(cache_size)),
        }
    }

    pub fn get(&self, key: &DictionaryKey) -> Option<Arc<CachedValues>> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(key).cloned()
    }

    pub fn set(&self, key: DictionaryKey, values: Arc<CachedValues>) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.put(key, values);
    }

    /// Returns the existing entry if present, else inserts `values` and
    /// returns it. Atomic: concurrent producers for one key all observe the
    /// same canonical entry, and the losers adopt the winner's values.
    pub fn get_or_set(&self, key: DictionaryKey, values: Arc<CachedValues>) -> Arc<CachedValues> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = cache.get(&key) {
            return existing.clone();
        }
        cache.put(key, values.clone());
        values
    }

    pub fn len(&self) -> usize {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ketchsql_common::types::{DataType, Value};
    use ketchsql_storage::Column;

    use super::*;

    fn dictionary(values: &[&str]) -> Arc<Dictionary> {
        let mut col = Column::new(&DataType::String);
        for v in values {
            col.push_value(Value::String(v.to_string())).unwrap();
        }
        Arc::new(Dictionary::new(Arc::new(col)))
    }

    fn cached(dict: &Arc<Dictionary>) -> Arc<CachedValues> {
        Arc::new(CachedValues {
            dictionary_holder: dict.clone(),
            function_result: dict.clone(),
            index_mapping: Arc::new(vec![0; dict.len()]),
        })
    }

    fn key_of(dict: &Arc<Dictionary>) -> DictionaryKey {
        DictionaryKey {
            hash: dict.hash(),
            size: dict.len() as u64,
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_get_miss() {
        let cache = DictionaryResultCache::new(NonZeroUsize::new(4).unwrap());
        let dict = dictionary(&["a"]);
        assert!(cache.get(&key_of(&dict)).is_none());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_set_then_get() {
        let cache = DictionaryResultCache::new(NonZeroUsize::new(4).unwrap());
        let dict = dictionary(&["a", "b"]);
        let values = cached(&dict);
        cache.set(key_of(&dict), values.clone());
        let hit = cache.get(&key_of(&dict)).unwrap();
        assert!(Arc::ptr_eq(&hit, &values));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_get_or_set_returns_existing() {
        let cache = DictionaryResultCache::new(NonZeroUsize::new(4).unwrap());
        let dict = dictionary(&["a", "b"]);
        let first = cached(&dict);
        let second = cached(&dict);
        let winner = cache.get_or_set(key_of(&dict), first.clone());
        assert!(Arc::ptr_eq(&winner, &first));
        let loser = cache.get_or_set(key_of(&dict), second);
        assert!(Arc::ptr_eq(&loser, &first));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_lru_eviction_on_entry_count() {
        let cache = DictionaryResultCache::new(NonZeroUsize::new(2).unwrap());
        let a = dictionary(&["a"]);
        let b = dictionary(&["b"]);
        let c = dictionary(&["c"]);
        cache.set(key_of(&a), cached(&a));
        cache.set(key_of(&b), cached(&b));
        // Touch `a` so `b` is the least recently used.
        assert!(cache.get(&key_of(&a)).is_some());
        cache.set(key_of(&c), cached(&c));
        assert!(cache.get(&key_of(&a)).is_some());
        assert!(cache.get(&key_of(&b)).is_none());
        assert!(cache.get(&key_of(&c)).is_some());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_distinct_sizes_are_distinct_keys() {
        let cache = DictionaryResultCache::new(NonZeroUsize::new(4).unwrap());
        let dict = dictionary(&["a", "b"]);
        let mut key = key_of(&dict);
        cache.set(key, cached(&dict));
        key.size += 1;
        assert!(cache.get(&key).is_none());
    }
}
