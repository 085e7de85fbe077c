//! File-backed key-value store: one file per key under a root directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::kv::KeyValueStore;

/// A [`KeyValueStore`] holding each value in its own file.
///
/// The root directory is created lazily on the first write. Writes go
/// through a temp file followed by a rename, so a crash never leaves a
/// half-written document under a live key.
#[derive(Debug)]
pub struct FsKvStore {
    root: PathBuf,
}

impl FsKvStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> LedgerResult<PathBuf> {
        if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']) {
            return Err(LedgerError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

impl KeyValueStore for FsKvStore {
    fn get(&self, key: &str) -> LedgerResult<Option<String>> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> LedgerResult<()> {
        let path = self.key_path(key)?;
        fs::create_dir_all(&self.root)?;

        let tmp = self
            .root
            .join(format!("{key}.tmp-{}", uuid::Uuid::now_v7()));
        fs::write(&tmp, value)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        debug!(key, len = value.len(), "key-value document written");
        Ok(())
    }

    fn remove(&self, key: &str) -> LedgerResult<bool> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
