use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use qrv_types::ScanId;

use crate::error::{StoreError, StoreResult};
use crate::traits::BlobStore;

/// Current on-disk schema version, recorded in the `VERSION` marker file.
pub const STORE_VERSION: u32 = 1;

const VERSION_FILE: &str = "VERSION";
const BLOBS_DIR: &str = "blobs";

/// Filesystem-backed blob store.
///
/// Layout under the store root:
/// ```text
/// <root>/VERSION      schema version marker
/// <root>/blobs/<id>   one file per stored payload
/// ```
///
/// Writes go through a temp file in the blobs directory followed by a
/// rename, so a crash never leaves a half-written payload under a live id.
pub struct FsBlobStore {
    root: PathBuf,
    opened: AtomicBool,
}

impl FsBlobStore {
    /// Create a store rooted at the given directory. Nothing touches the
    /// filesystem until the first operation.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            opened: AtomicBool::new(false),
        }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, id: &ScanId) -> StoreResult<PathBuf> {
        let name = id.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(StoreError::InvalidId(name.to_string()));
        }
        Ok(self.root.join(BLOBS_DIR).join(name))
    }

    async fn ensure_open(&self) -> StoreResult<()> {
        if self.opened.load(Ordering::Acquire) {
            return Ok(());
        }
        self.open_container().await
    }

    async fn open_container(&self) -> StoreResult<()> {
        fs::create_dir_all(self.root.join(BLOBS_DIR)).await?;

        let version_path = self.root.join(VERSION_FILE);
        match fs::read_to_string(&version_path).await {
            Ok(found) => {
                let found = found.trim();
                if found != STORE_VERSION.to_string() {
                    return Err(StoreError::VersionMismatch {
                        found: found.to_string(),
                        supported: STORE_VERSION,
                    });
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::write(&version_path, format!("{STORE_VERSION}\n")).await?;
                debug!(root = %self.root.display(), version = STORE_VERSION, "blob store initialized");
            }
            Err(e) => return Err(e.into()),
        }

        self.opened.store(true, Ordering::Release);
        Ok(())
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn open(&self) -> StoreResult<()> {
        self.ensure_open().await
    }

    async fn put(&self, id: &ScanId, bytes: Bytes) -> StoreResult<()> {
        self.ensure_open().await?;
        let path = self.blob_path(id)?;

        // Unique temp name: concurrent writers to the same id never share one.
        let tmp = self
            .root
            .join(BLOBS_DIR)
            .join(format!("{}.tmp-{}", id.as_str(), uuid::Uuid::now_v7()));
        fs::write(&tmp, &bytes).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(id = %id, len = bytes.len(), "blob stored");
        Ok(())
    }

    async fn get(&self, id: &ScanId) -> StoreResult<Option<Bytes>> {
        self.ensure_open().await?;
        let path = self.blob_path(id)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: &ScanId) -> StoreResult<bool> {
        self.ensure_open().await?;
        let path = self.blob_path(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(id = %id, "blob deleted");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self) -> StoreResult<()> {
        self.ensure_open().await?;
        let mut dir = fs::read_dir(self.root.join(BLOBS_DIR)).await?;
        let mut removed = 0usize;
        while let Some(entry) = dir.next_entry().await? {
            if entry.file_type().await?.is_file() {
                fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        debug!(removed, "blob store cleared");
        Ok(())
    }
}

impl std::fmt::Debug for FsBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsBlobStore")
            .field("root", &self.root)
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
    // Container lifecycle
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn open_initializes_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        store.open().await.unwrap();

        let version = std::fs::read_to_string(dir.path().join("VERSION")).unwrap();
        assert_eq!(version.trim(), "1");
        assert!(dir.path().join("blobs").is_dir());

        // Reopening the same container is a no-op.
        store.open().await.unwrap();
    }

    #[tokio::test]
    async fn open_rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("VERSION"), "2\n").unwrap();

        let store = FsBlobStore::new(dir.path());
        let err = store.open().await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionMismatch { ref found, supported: 1 } if found == "2"
        ));
    }

    #[tokio::test]
    async fn first_operation_opens_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        // No explicit open; put must establish the container itself.
        store.put(&id("a1"), payload(b"data")).await.unwrap();
        assert!(dir.path().join("VERSION").is_file());
        assert_eq!(store.get(&id("a1")).await.unwrap(), Some(payload(b"data")));
    }

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn put_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        store.put(&id("a1"), payload(b"image bytes")).await.unwrap();
        let read_back = store.get(&id("a1")).await.unwrap().expect("should exist");
        assert_eq!(read_back, payload(b"image bytes"));
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        assert!(store.get(&id("missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_overwrites_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        store.put(&id("a1"), payload(b"first")).await.unwrap();
        store.put(&id("a1"), payload(b"second")).await.unwrap();
        assert_eq!(store.get(&id("a1")).await.unwrap(), Some(payload(b"second")));
    }

    #[tokio::test]
    async fn delete_present_then_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        store.put(&id("a1"), payload(b"data")).await.unwrap();
        assert!(store.delete(&id("a1")).await.unwrap());
        assert!(store.get(&id("a1")).await.unwrap().is_none());
        assert!(!store.delete(&id("a1")).await.unwrap());
    }

    #[tokio::test]
    async fn clear_removes_all() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        store.put(&id("a1"), payload(b"a")).await.unwrap();
        store.put(&id("a2"), payload(b"b")).await.unwrap();
        store.clear().await.unwrap();

        assert!(store.get(&id("a1")).await.unwrap().is_none());
        assert!(store.get(&id("a2")).await.unwrap().is_none());
        // Container survives a clear.
        assert!(dir.path().join("VERSION").is_file());
    }

    // -----------------------------------------------------------------------
    // Durability across instances
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn payloads_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FsBlobStore::new(dir.path());
            store.put(&id("a1"), payload(b"persisted")).await.unwrap();
        }

        let reopened = FsBlobStore::new(dir.path());
        assert_eq!(
            reopened.get(&id("a1")).await.unwrap(),
            Some(payload(b"persisted"))
        );
    }

    // -----------------------------------------------------------------------
    // Id validation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn rejects_path_traversal_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        for bad in ["../evil", "a/b", "a\\b", "..", "."] {
            let err = store.put(&id(bad), payload(b"x")).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidId(_)), "id {bad:?}");
        }
    }

    // -----------------------------------------------------------------------
    // Concurrent access
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn concurrent_puts_to_distinct_keys() {
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsBlobStore::new(dir.path()));

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
        for n in 0..8 {
            let key = ScanId::new(format!("key-{n}"));
            assert_eq!(store.get(&key).await.unwrap(), Some(Bytes::from(vec![n as u8])));
        }
    }
}
