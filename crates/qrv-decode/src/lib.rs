//! Decode adapter for QRV.
//!
//! The decode engine is a black box behind the [`Decoder`] trait;
//! [`QrDecoder`] is the production engine backed by `rqrr`. [`ScanReader`]
//! is the adapter the rest of the system talks to: it validates incoming
//! image bytes, runs the engine, and normalizes the outcome into a
//! [`Capture`] (decoded payload plus source dimensions) or a classified
//! [`DecodeError`].
//!
//! The one classification that matters to callers: [`DecodeError::NotFound`]
//! means "no code located, offer a crop and retry"; every other failure is a
//! plain decode error. [`crop_bytes`] produces the re-submitted bytes for
//! that retry path.

pub mod crop;
pub mod decoder;
pub mod error;
pub mod reader;

pub use crop::{crop_bytes, rgba_to_png, CropRegion};
pub use decoder::{Decoded, Decoder, QrDecoder};
pub use error::{DecodeError, DecodeResult};
pub use reader::{Capture, ScanReader};
