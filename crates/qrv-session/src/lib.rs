//! Scan-result lifecycle management for QRV.
//!
//! [`ScanSession`] owns the canonical in-memory list of scan results and
//! coordinates the two persisted representations of each result: metadata
//! in the [`ResultLedger`](qrv_ledger::ResultLedger), image bytes in a
//! [`BlobStore`](qrv_store::BlobStore). It keeps the two referentially
//! consistent under creation, deletion (single, bulk, age-filtered), and
//! process restart.
//!
//! Availability beats durability here: every mutation fully applies to the
//! in-memory list, and a storage failure only degrades durability (logged,
//! surfaced through the operation's report). Divergence left behind by a
//! crash is healed on the next [`bootstrap`]: a ledger record whose blob is
//! missing is dropped, and the healed list is persisted by whatever
//! mutation comes next.
//!
//! [`bootstrap`]: ScanSession::bootstrap
//!
//! Supporting pieces: [`ImageHandles`] mints the process-local `mem:` URLs
//! that stand in for loaded image bytes, and [`NoticeCenter`] carries
//! transient user-facing notices.

pub mod handles;
pub mod notify;
pub mod report;
pub mod session;

pub use handles::{ImageHandles, ImageUrl};
pub use notify::{Notice, NoticeCenter, NoticeId, Severity, DEFAULT_NOTICE_TTL};
pub use report::{BootstrapReport, CreateReceipt, DeleteReport, Durability};
pub use session::{ScanResult, ScanSession, RETENTION_DAYS};
