//! The [`KeyValueStore`] trait defining the metadata storage interface.

use crate::error::LedgerResult;

/// Synchronous local key-value storage for small metadata documents.
///
/// Implementations must be thread-safe (`Send + Sync`). Values are whole
/// documents: `put` replaces the entire value under a key, so a reader
/// never observes a partially updated document.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn get(&self, key: &str) -> LedgerResult<Option<String>>;

    /// Insert or replace the value stored under `key`.
    fn put(&self, key: &str, value: &str) -> LedgerResult<()>;

    /// Remove the value stored under `key`.
    ///
    /// Returns `Ok(true)` if the key existed and was removed, `Ok(false)` if
    /// it did not exist.
    fn remove(&self, key: &str) -> LedgerResult<bool>;
}
