use async_trait::async_trait;
use bytes::Bytes;
use qrv_types::ScanId;

use crate::error::StoreResult;

/// Durable local store for scan image payloads.
///
/// All implementations must satisfy these invariants:
/// - `open` is idempotent: the first call establishes the container at the
///   current schema version, later calls are no-ops. A container written by
///   an unknown (newer) schema version is an error, never silently reused.
/// - Every operation may be called without an explicit `open`; backends
///   establish the container lazily on first use.
/// - `get` returns `Ok(None)` for a missing key -- absence is not an error.
/// - `delete` of a missing key is a no-op.
/// - Operations may be issued concurrently. Writes to the same key are
///   serialized; the last write by call order wins.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Establish the store container, creating or validating it.
    async fn open(&self) -> StoreResult<()>;

    /// Insert or overwrite the payload stored under `id`.
    async fn put(&self, id: &ScanId, bytes: Bytes) -> StoreResult<()>;

    /// Read the payload stored under `id`.
    ///
    /// Returns `Ok(None)` if nothing is stored under the id.
    async fn get(&self, id: &ScanId) -> StoreResult<Option<Bytes>>;

    /// Remove the payload stored under `id`. Returns `true` if it existed.
    async fn delete(&self, id: &ScanId) -> StoreResult<bool>;

    /// Remove every stored payload.
    async fn clear(&self) -> StoreResult<()>;
}
