//! Blob storage for QRV scan images.
//!
//! Every scan result keeps its source image as an opaque binary payload in a
//! blob store keyed by [`ScanId`](qrv_types::ScanId). The store is one
//! logical container with a schema version; the metadata describing each
//! scan lives separately in the ledger, and the session layer keeps the two
//! consistent.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`MemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsBlobStore`] -- one file per payload under a versioned directory
//!
//! # Design Rules
//!
//! 1. `open` is idempotent; an unknown schema version is an error.
//! 2. Absence is not an error: `get` returns `Ok(None)`, `delete` of a
//!    missing key is a no-op.
//! 3. The store never interprets payload contents -- it is a pure key-value
//!    store.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use fs::{FsBlobStore, STORE_VERSION};
pub use memory::MemoryBlobStore;
pub use traits::BlobStore;
