//! In-memory cache implementation with LRU eviction.
//!
//! Records never expire. The LRU bound only exists to cap memory use; an
//! evicted record is simply a cache miss, the record store stays
//! authoritative.

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;

use cachesync_core::cache::{Cache, Result};

/// In-memory cache implementation with LRU eviction.
///
/// Thread-safe cache using `Arc<RwLock<LruCache>>` for concurrent access.
/// Clones share the same underlying store.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    store: Arc<RwLock<LruCache<String, Vec<u8>>>>,
}

impl MemoryCache {
    /// Creates a new in-memory cache with LRU eviction.
    ///
    /// # Arguments
    ///
    /// * `max_entries` - Maximum number of entries before LRU eviction kicks in.
    ///
    /// # Panics
    ///
    /// Panics if `max_entries` is 0.
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).expect("max_entries must be > 0");
        Self {
            store: Arc::new(RwLock::new(LruCache::new(capacity))),
        }
    }

    /// Number of records currently held.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Returns true if the cache holds no records.
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        // LruCache::get updates recency, hence the write lock.
        let mut store = self.store.write().await;
        Ok(store.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut store = self.store.write().await;
        store.put(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut store = self.store.write().await;
        store.pop(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Default max entries for tests
    const TEST_MAX_ENTRIES: usize = 1000;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);
        let key = "user-1";
        let value = b"test value";

        cache.set(key, value).await.unwrap();
        let result = cache.get(key).await.unwrap();

        assert_eq!(result, Some(value.to_vec()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);
        let result = cache.get("user-404").await.unwrap();

        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);

        cache.set("user-2", b"first").await.unwrap();
        cache.set("user-2", b"second").await.unwrap();

        assert_eq!(cache.get("user-2").await.unwrap(), Some(b"second".to_vec()));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);
        let key = "user-3";

        cache.set(key, b"to be deleted").await.unwrap();
        assert!(cache.get(key).await.unwrap().is_some());

        cache.delete(key).await.unwrap();
        assert!(cache.get(key).await.unwrap().is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_nonexistent_is_ok() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);
        assert!(cache.delete("user-404").await.is_ok());
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let cache = MemoryCache::new(2);

        cache.set("user-1", b"1").await.unwrap();
        cache.set("user-2", b"2").await.unwrap();
        // Touch user-1 so user-2 becomes least recently used.
        cache.get("user-1").await.unwrap();
        cache.set("user-3", b"3").await.unwrap();

        assert!(cache.get("user-1").await.unwrap().is_some());
        assert!(cache.get("user-2").await.unwrap().is_none());
        assert!(cache.get("user-3").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clones_share_store() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);
        let clone = cache.clone();

        clone.set("user-5", b"shared").await.unwrap();

        assert_eq!(cache.get("user-5").await.unwrap(), Some(b"shared".to_vec()));
    }
}
