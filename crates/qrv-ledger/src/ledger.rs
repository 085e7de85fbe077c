use std::sync::Arc;

use tracing::{debug, warn};

use qrv_types::ScanRecord;

use crate::entry::LedgerEntry;
use crate::error::{LedgerError, LedgerResult};
use crate::kv::KeyValueStore;

/// Fixed key the scan-result list is persisted under.
pub const LEDGER_KEY: &str = "scan-results";

/// The metadata ledger: one ordered JSON document of scan records under a
/// single key.
///
/// Every save rewrites the complete list, so the persisted document is
/// always internally consistent. Loading is forgiving: an absent key or a
/// corrupt document yields an empty list, and a single unreadable entry is
/// dropped during reconstruction while the rest survive.
pub struct ResultLedger {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl ResultLedger {
    /// Create a ledger over the given store, using [`LEDGER_KEY`].
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(kv, LEDGER_KEY)
    }

    /// Create a ledger persisted under a custom key.
    pub fn with_key(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    /// The key the document is persisted under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the persisted entries in stored order.
    ///
    /// Never fails: an absent key, an unreadable store, or a document that
    /// does not parse all load as an empty list (the failure is logged).
    pub fn load(&self) -> Vec<LedgerEntry> {
        match self.kv.get(&self.key) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(key = %self.key, error = %e, "ledger document corrupt, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "ledger read failed, starting empty");
                Vec::new()
            }
        }
    }

    /// Load and reconstruct typed records in stored order.
    ///
    /// Entries whose timestamp does not parse are dropped with a warning.
    pub fn load_records(&self) -> Vec<ScanRecord> {
        self.load()
            .into_iter()
            .filter_map(|entry| {
                let id = entry.id.clone();
                match entry.into_record() {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!(id = %id, error = %e, "dropping unreadable ledger entry");
                        None
                    }
                }
            })
            .collect()
    }

    /// Persist the full entry list, replacing the previous document.
    pub fn save(&self, entries: &[LedgerEntry]) -> LedgerResult<()> {
        let json = serde_json::to_string(entries)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        self.kv.put(&self.key, &json)?;
        debug!(key = %self.key, count = entries.len(), "ledger saved");
        Ok(())
    }

    /// Persist typed records, replacing the previous document.
    pub fn save_records(&self, records: &[ScanRecord]) -> LedgerResult<()> {
        let entries: Vec<LedgerEntry> = records.iter().map(LedgerEntry::from_record).collect();
        self.save(&entries)
    }
}

impl std::fmt::Debug for ResultLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultLedger").field("key", &self.key).finish()
    }
}
