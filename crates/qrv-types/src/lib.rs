//! Foundation types for QRV.
//!
//! This crate provides the identifier, geometry, and record types shared
//! across the QRV system. Every other QRV crate depends on `qrv-types`.
//!
//! # Key Types
//!
//! - [`ScanId`] — Unique scan result identifier (UUID v7 in string form)
//! - [`ScanRecord`] — The persisted metadata of one decoded scan
//! - [`ResultPoint`] / [`ImageDimensions`] — Corner geometry of a decoded
//!   code in source-image pixel space
//! - [`ResultGeometry`] — Borrowing view for rescaling corner points onto a
//!   differently-sized rendering
//! - [`TypeError`] — Validation and parse failures for the above

pub mod error;
pub mod geometry;
pub mod id;
pub mod record;
pub mod time;

pub use error::TypeError;
pub use geometry::{ImageDimensions, ResultGeometry, ResultPoint, MIN_GEOMETRY_POINTS};
pub use id::ScanId;
pub use record::{ScanRecord, QR_CODE_FORMAT};
