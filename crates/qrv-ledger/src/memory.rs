//! In-memory key-value store for testing and ephemeral use.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{LedgerError, LedgerResult};
use crate::kv::KeyValueStore;

/// An in-memory implementation of [`KeyValueStore`].
///
/// All data lives in a `HashMap` behind a `RwLock`. Data is lost when the
/// store is dropped.
#[derive(Debug)]
pub struct MemoryKvStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryKvStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.values.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> LedgerResult<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|e| LedgerError::Serialization(format!("lock poisoned: {e}")))?;
        Ok(values.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> LedgerResult<()> {
        let mut values = self
            .values
            .write()
            .map_err(|e| LedgerError::Serialization(format!("lock poisoned: {e}")))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> LedgerResult<bool> {
        let mut values = self
            .values
            .write()
            .map_err(|e| LedgerError::Serialization(format!("lock poisoned: {e}")))?;
        Ok(values.remove(key).is_some())
    }
}
