use thiserror::Error;

use crate::crop::CropRegion;

/// Errors from decode operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// No code was located in the image. An expected outcome: the caller
    /// should offer a crop-and-retry rather than report a hard failure.
    #[error("no QR code found in the image")]
    NotFound,

    /// The bytes could not be loaded as an image.
    #[error("unreadable image: {0}")]
    InvalidImage(String),

    /// The engine located a code but could not read it.
    #[error("decode engine error: {0}")]
    Engine(String),

    /// The crop region is empty or falls outside the image.
    #[error("invalid crop region {region} for a {width}x{height} image")]
    InvalidCrop {
        region: CropRegion,
        width: u32,
        height: u32,
    },

    /// Re-encoding image bytes failed.
    #[error("image encoding failed: {0}")]
    Encoding(String),
}

impl DecodeError {
    /// Whether this is the "nothing found" outcome that merits a crop retry.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Result alias for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
