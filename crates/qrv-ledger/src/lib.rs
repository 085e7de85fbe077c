//! Metadata ledger for QRV.
//!
//! Scan metadata is a single ordered JSON document persisted under one fixed
//! key in a small synchronous key-value store, the way a browser gadget
//! would keep it in `localStorage`. This crate provides:
//!
//! - [`KeyValueStore`] -- the storage port, with [`MemoryKvStore`] and
//!   [`FsKvStore`] backends
//! - [`LedgerEntry`] -- the raw wire shape of one persisted record
//! - [`ResultLedger`] -- load/save of the full record list, including
//!   reconstruction into typed [`ScanRecord`](qrv_types::ScanRecord)s
//!
//! # Design Rules
//!
//! 1. Every save rewrites the complete list; there are no partial updates.
//! 2. An absent or corrupt document loads as an empty list, never an error.
//! 3. One unreadable entry is dropped on reconstruction; the rest survive.
//! 4. Image handles are never part of the persisted document.

pub mod entry;
pub mod error;
pub mod fs;
pub mod kv;
pub mod ledger;
pub mod memory;

pub use entry::LedgerEntry;
pub use error::{LedgerError, LedgerResult};
pub use fs::FsKvStore;
pub use kv::KeyValueStore;
pub use ledger::{ResultLedger, LEDGER_KEY};
pub use memory::MemoryKvStore;
