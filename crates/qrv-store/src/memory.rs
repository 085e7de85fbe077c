use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use qrv_types::ScanId;

use crate::error::StoreResult;
use crate::traits::BlobStore;

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. All payloads are held in memory behind
/// a `RwLock` for safe concurrent access; `Bytes` payloads are cheap to
/// clone on read.
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<ScanId, Bytes>>,
}

impl MemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of payloads currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored payloads.
    pub fn total_bytes(&self) -> u64 {
        self.blobs
            .read()
            .expect("lock poisoned")
            .values()
            .map(|b| b.len() as u64)
            .sum()
    }

    /// Whether a payload is stored under `id`.
    pub fn contains(&self, id: &ScanId) -> bool {
        self.blobs.read().expect("lock poisoned").contains_key(id)
    }

    /// Return a sorted list of all ids in the store.
    pub fn all_ids(&self) -> Vec<ScanId> {
        let map = self.blobs.read().expect("lock poisoned");
        let mut ids: Vec<ScanId> = map.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn open(&self) -> StoreResult<()> {
        // Nothing to establish for an in-memory container.
        Ok(())
    }

    async fn put(&self, id: &ScanId, bytes: Bytes) -> StoreResult<()> {
        let mut map = self.blobs.write().expect("lock poisoned");
        map.insert(id.clone(), bytes);
        Ok(())
    }

    async fn get(&self, id: &ScanId) -> StoreResult<Option<Bytes>> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    async fn delete(&self, id: &ScanId) -> StoreResult<bool> {
        let mut map = self.blobs.write().expect("lock poisoned");
        Ok(map.remove(id).is_some())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.blobs.write().expect("lock poisoned").clear();
        Ok(())
    }
}

impl std::fmt::Debug for MemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("MemoryBlobStore")
            .field("blob_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ScanId {
        ScanId::new(s)
    }

    fn payload(content: &[u8]) -> Bytes {
        Bytes::copy_from_slice(content)
    }

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn put_and_get() {
        let store = MemoryBlobStore::new();
        store.put(&id("a1"), payload(b"image bytes")).await.unwrap();

        let read_back = store.get(&id("a1")).await.unwrap().expect("should exist");
        assert_eq!(read_back, payload(b"image bytes"));
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = MemoryBlobStore::new();
        assert!(store.get(&id("missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_overwrites_last_write_wins() {
        let store = MemoryBlobStore::new();
        store.put(&id("a1"), payload(b"first")).await.unwrap();
        store.put(&id("a1"), payload(b"second")).await.unwrap();

        let read_back = store.get(&id("a1")).await.unwrap().unwrap();
        assert_eq!(read_back, payload(b"second"));
        assert_eq!(store.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Delete / Clear
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn delete_present_then_missing() {
        let store = MemoryBlobStore::new();
        store.put(&id("a1"), payload(b"data")).await.unwrap();

        assert!(store.delete(&id("a1")).await.unwrap()); // was present
        assert!(!store.contains(&id("a1"))); // now gone
        assert!(!store.delete(&id("a1")).await.unwrap()); // second delete = false
    }

    #[tokio::test]
    async fn delete_missing_is_noop() {
        let store = MemoryBlobStore::new();
        assert!(!store.delete(&id("never-written")).await.unwrap());
    }

    #[tokio::test]
    async fn clear_removes_all() {
        let store = MemoryBlobStore::new();
        store.put(&id("a1"), payload(b"a")).await.unwrap();
        store.put(&id("a2"), payload(b"b")).await.unwrap();
        assert_eq!(store.len(), 2);

        store.clear().await.unwrap();
        assert!(store.is_empty());
    }

    // -----------------------------------------------------------------------
    // Open
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn open_is_idempotent_noop() {
        let store = MemoryBlobStore::new();
        store.open().await.unwrap();
        store.open().await.unwrap();
        assert!(store.is_empty());
    }

    // -----------------------------------------------------------------------
    // Utility methods
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn len_and_is_empty() {
        let store = MemoryBlobStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);

        store.put(&id("a1"), payload(b"a")).await.unwrap();
        assert!(!store.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn total_bytes() {
        let store = MemoryBlobStore::new();
        store.put(&id("a1"), payload(b"12345")).await.unwrap(); // 5 bytes
        store.put(&id("a2"), payload(b"123456789")).await.unwrap(); // 9 bytes
        assert_eq!(store.total_bytes(), 14);
    }

    #[tokio::test]
    async fn all_ids_is_sorted() {
        let store = MemoryBlobStore::new();
        store.put(&id("c"), payload(b"3")).await.unwrap();
        store.put(&id("a"), payload(b"1")).await.unwrap();
        store.put(&id("b"), payload(b"2")).await.unwrap();

        let ids = store.all_ids();
        assert_eq!(ids, vec![id("a"), id("b"), id("c")]);
    }

    // -----------------------------------------------------------------------
    // Concurrent access
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn concurrent_reads_are_safe() {
        use std::sync::Arc;

        let store = Arc::new(MemoryBlobStore::new());
        store.put(&id("shared"), payload(b"shared data")).await.unwrap();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let result = store.get(&ScanId::new("shared")).await.unwrap();
                    assert_eq!(result.unwrap(), Bytes::from_static(b"shared data"));
                })
            })
            .collect();

        for task in tasks {
            task.await.expect("task should not panic");
        }
    }

    #[tokio::test]
    async fn concurrent_puts_to_distinct_keys() {
        use std::sync::Arc;

        let store = Arc::new(MemoryBlobStore::new());
        let tasks: Vec<_> = (0..8)
            .map(|n| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let key = ScanId::new(format!("key-{n}"));
                    store.put(&key, Bytes::from(vec![n as u8])).await.unwrap();
                })
            })
            .collect();

        for task in tasks {
            task.await.expect("task should not panic");
        }
        assert_eq!(store.len(), 8);
    }

    // -----------------------------------------------------------------------
    // Default / Debug
    // -----------------------------------------------------------------------

    #[test]
    fn default_creates_empty_store() {
        let store = MemoryBlobStore::default();
        assert!(store.is_empty());
    }

    #[test]
    fn debug_format() {
        let store = MemoryBlobStore::new();
        let debug = format!("{store:?}");
        assert!(debug.contains("MemoryBlobStore"));
        assert!(debug.contains("blob_count"));
    }
}
