use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use tracing::{debug, warn};

use qrv_decode::Decoded;
use qrv_ledger::{LedgerEntry, ResultLedger};
use qrv_store::BlobStore;
use qrv_types::{ImageDimensions, ScanId, ScanRecord};

use crate::handles::{ImageHandles, ImageUrl};
use crate::report::{BootstrapReport, CreateReceipt, DeleteReport, Durability};

/// Results older than this many days count as stale and are eligible for
/// pruning.
pub const RETENTION_DAYS: i64 = 7;

/// A hydrated scan result: the persisted record plus a live image handle.
///
/// The handle is process-local and minted fresh on every load; only the
/// record survives a restart.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanResult {
    pub record: ScanRecord,
    pub image_url: ImageUrl,
}

/// The scan-result lifecycle manager.
///
/// Owns the canonical in-memory result list (newest first) and keeps the
/// two persisted representations consistent: metadata in the ledger, image
/// bytes in the blob store. All mutations go through `&mut self`, so the
/// list never changes under a caller; storage runs async and failures only
/// degrade durability, they never block or roll back the in-memory change.
pub struct ScanSession {
    store: Arc<dyn BlobStore>,
    ledger: ResultLedger,
    handles: ImageHandles,
    results: Vec<ScanResult>,
    selected: Option<ScanId>,
    pending_crop: Option<ImageUrl>,
    scanning: bool,
}

impl ScanSession {
    /// Create a session over the given stores. Call
    /// [`bootstrap`](Self::bootstrap) to populate it.
    pub fn new(store: Arc<dyn BlobStore>, ledger: ResultLedger) -> Self {
        Self {
            store,
            ledger,
            handles: ImageHandles::new(),
            results: Vec::new(),
            selected: None,
            pending_crop: None,
            scanning: false,
        }
    }

    // ---- Bootstrap ----

    /// Load the ledger and hydrate each record from the blob store.
    ///
    /// Records whose entry does not reconstruct or whose blob is missing are
    /// dropped; the survivors populate the list in ledger order, each with a
    /// freshly minted image handle. The healed list is not re-saved here:
    /// the next mutation's full save persists it.
    pub async fn bootstrap(&mut self) -> BootstrapReport {
        if let Err(e) = self.store.open().await {
            warn!(error = %e, "blob store failed to open, starting with an empty list");
            return BootstrapReport::default();
        }

        let entries = self.ledger.load();
        let total = entries.len();

        let mut records = Vec::with_capacity(total);
        for entry in entries {
            let id = entry.id.clone();
            match entry.into_record() {
                Ok(record) => records.push(record),
                Err(e) => warn!(id = %id, error = %e, "dropping unreadable ledger entry"),
            }
        }

        // Hydrations are issued concurrently and joined in ledger order.
        let fetches = records.iter().map(|record| self.store.get(&record.id));
        let payloads = join_all(fetches).await;

        let mut restored = Vec::with_capacity(records.len());
        for (record, payload) in records.into_iter().zip(payloads) {
            match payload {
                Ok(Some(bytes)) => {
                    let image_url = self.handles.mint(bytes);
                    restored.push(ScanResult { record, image_url });
                }
                Ok(None) => {
                    debug!(id = %record.id, "dropping record whose blob is missing");
                }
                Err(e) => {
                    warn!(id = %record.id, error = %e, "dropping record, blob read failed");
                }
            }
        }

        let report = BootstrapReport {
            restored: restored.len(),
            dropped: total - restored.len(),
        };
        self.results = restored;
        debug!(restored = report.restored, dropped = report.dropped, "session bootstrapped");
        report
    }

    // ---- Create ----

    /// Persist a successful decode as a new result, prepended to the list.
    ///
    /// The blob write happens first, then the full-list ledger save; either
    /// failure is logged and reflected in the receipt's [`Durability`], and
    /// the in-memory result is added regardless. A result whose blob write
    /// failed lives until the next bootstrap drops it.
    pub async fn create_result(
        &mut self,
        decoded: Decoded,
        image_bytes: Bytes,
        dimensions: Option<ImageDimensions>,
    ) -> CreateReceipt {
        let id = ScanId::generate();
        let record = ScanRecord::new(
            id.clone(),
            decoded.text,
            decoded.format,
            qrv_types::time::now_millis(),
            decoded.points,
            dimensions,
        );

        let blob_stored = match self.store.put(&id, image_bytes.clone()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(id = %id, error = %e, "blob write failed, result will not survive a reload");
                false
            }
        };

        let ledger_saved = self.persist_list(
            std::iter::once(&record).chain(self.results.iter().map(|r| &r.record)),
        );

        let image_url = self.handles.mint(image_bytes);
        self.results.insert(0, ScanResult { record, image_url });

        debug!(id = %id, blob_stored, ledger_saved, "result created");
        CreateReceipt {
            id,
            durability: Durability {
                blob_stored,
                ledger_saved,
            },
        }
    }

    // ---- Delete operations ----

    /// Delete one result. Unknown ids are a complete no-op and return
    /// `false`, so a second delete of the same id is harmless.
    pub async fn delete_one(&mut self, id: &ScanId) -> bool {
        let Some(index) = self.results.iter().position(|r| r.record.id == *id) else {
            debug!(id = %id, "delete of unknown id ignored");
            return false;
        };

        if let Err(e) = self.store.delete(id).await {
            warn!(id = %id, error = %e, "blob delete failed");
        }
        self.persist_list(
            self.results
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, r)| &r.record),
        );

        let removed = self.results.remove(index);
        self.handles.release(&removed.image_url);
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        debug!(id = %id, "result deleted");
        true
    }

    /// Delete every result: blob deletes fan out concurrently, the ledger
    /// is saved empty, and all handles are released.
    pub async fn delete_all(&mut self) -> DeleteReport {
        let ids: Vec<ScanId> = self.results.iter().map(|r| r.record.id.clone()).collect();
        let outcomes = join_all(ids.iter().map(|id| self.store.delete(id))).await;
        for (id, outcome) in ids.iter().zip(outcomes) {
            if let Err(e) = outcome {
                warn!(id = %id, error = %e, "blob delete failed");
            }
        }

        self.persist_list(std::iter::empty());

        let removed = self.results.len();
        for result in std::mem::take(&mut self.results) {
            self.handles.release(&result.image_url);
        }
        self.selected = None;
        debug!(removed, "all results deleted");
        DeleteReport { removed, kept: 0 }
    }

    /// Delete results strictly older than `cutoff`; a result timestamped
    /// exactly at the cutoff is kept.
    ///
    /// When nothing is stale this is a complete no-op: no blob deletes are
    /// issued, the ledger is not re-saved, and the selection is untouched.
    pub async fn delete_older_than(&mut self, cutoff: DateTime<Utc>) -> DeleteReport {
        let stale: Vec<ScanId> = self
            .results
            .iter()
            .filter(|r| r.record.timestamp < cutoff)
            .map(|r| r.record.id.clone())
            .collect();
        if stale.is_empty() {
            return DeleteReport {
                removed: 0,
                kept: self.results.len(),
            };
        }

        let outcomes = join_all(stale.iter().map(|id| self.store.delete(id))).await;
        for (id, outcome) in stale.iter().zip(outcomes) {
            if let Err(e) = outcome {
                warn!(id = %id, error = %e, "blob delete failed");
            }
        }

        self.persist_list(
            self.results
                .iter()
                .filter(|r| r.record.timestamp >= cutoff)
                .map(|r| &r.record),
        );

        let mut removed = 0;
        let mut kept = Vec::with_capacity(self.results.len() - stale.len());
        for result in std::mem::take(&mut self.results) {
            if result.record.timestamp < cutoff {
                self.handles.release(&result.image_url);
                if self.selected.as_ref() == Some(&result.record.id) {
                    self.selected = None;
                }
                removed += 1;
            } else {
                kept.push(result);
            }
        }
        self.results = kept;

        debug!(removed, kept = self.results.len(), "stale results deleted");
        DeleteReport {
            removed,
            kept: self.results.len(),
        }
    }

    /// Delete results older than the retention window ending now.
    pub async fn prune_stale(&mut self) -> DeleteReport {
        self.delete_older_than(Utc::now() - chrono::Duration::days(RETENTION_DAYS))
            .await
    }

    /// How many results a [`delete_older_than`](Self::delete_older_than) at
    /// `cutoff` would remove.
    pub fn stale_count(&self, cutoff: DateTime<Utc>) -> usize {
        self.results
            .iter()
            .filter(|r| r.record.timestamp < cutoff)
            .count()
    }

    // ---- Teardown ----

    /// Release every held handle and clear the in-memory state. Persisted
    /// state is untouched; the next bootstrap rebuilds the list.
    pub fn teardown(&mut self) {
        let released = self.handles.live_count();
        self.handles.release_all();
        self.results.clear();
        self.selected = None;
        self.pending_crop = None;
        self.scanning = false;
        debug!(released, "session torn down");
    }

    // ---- Crop staging ----

    /// Stage a source image awaiting a crop decision, releasing any
    /// previously staged one.
    pub fn stage_crop_source(&mut self, bytes: Bytes) -> ImageUrl {
        if let Some(previous) = self.pending_crop.take() {
            self.handles.release(&previous);
        }
        let url = self.handles.mint(bytes);
        self.pending_crop = Some(url.clone());
        url
    }

    /// Handle of the staged crop source, if any.
    pub fn pending_crop(&self) -> Option<&ImageUrl> {
        self.pending_crop.as_ref()
    }

    /// Release the staged crop source. Used on cancel and on completion
    /// alike: a finished crop stores freshly cropped bytes under the new
    /// result, so the staged original is no longer needed either way.
    pub fn clear_crop_source(&mut self) -> bool {
        match self.pending_crop.take() {
            Some(url) => self.handles.release(&url),
            None => false,
        }
    }

    // ---- Selection and flags ----

    /// Mark a result as currently viewed. Returns `false` (selection
    /// unchanged) for an unknown id.
    pub fn select(&mut self, id: &ScanId) -> bool {
        if self.results.iter().any(|r| r.record.id == *id) {
            self.selected = Some(id.clone());
            true
        } else {
            false
        }
    }

    /// The currently viewed result, if any.
    pub fn selected(&self) -> Option<&ScanResult> {
        let id = self.selected.as_ref()?;
        self.results.iter().find(|r| r.record.id == *id)
    }

    /// Clear the current selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Set the scanning-in-progress flag.
    pub fn set_scanning(&mut self, scanning: bool) {
        self.scanning = scanning;
    }

    /// Whether a scan is in progress.
    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    // ---- Accessors ----

    /// The results, newest first.
    pub fn results(&self) -> &[ScanResult] {
        &self.results
    }

    /// Number of results in the list.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Look up a result by id.
    pub fn get(&self, id: &ScanId) -> Option<&ScanResult> {
        self.results.iter().find(|r| r.record.id == *id)
    }

    /// The bytes behind a live image handle.
    pub fn resolve_image(&self, url: &ImageUrl) -> Option<Bytes> {
        self.handles.resolve(url)
    }

    /// Number of live image handles (results plus any staged crop source).
    pub fn live_handles(&self) -> usize {
        self.handles.live_count()
    }

    /// Save the given records as the complete ledger document. Returns
    /// whether the save succeeded; failure is logged, never propagated.
    fn persist_list<'a>(&self, records: impl Iterator<Item = &'a ScanRecord>) -> bool {
        let entries: Vec<LedgerEntry> = records.map(LedgerEntry::from_record).collect();
        match self.ledger.save(&entries) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "ledger save failed, list kept in memory only");
                false
            }
        }
    }
}

impl std::fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSession")
            .field("results", &self.results.len())
            .field("live_handles", &self.handles.live_count())
            .field("scanning", &self.scanning)
            .finish()
    }
}
