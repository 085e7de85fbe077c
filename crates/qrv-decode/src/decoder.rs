use image::GrayImage;

use qrv_types::{ResultPoint, QR_CODE_FORMAT};

use crate::error::{DecodeError, DecodeResult};

/// Output of a successful decode, normalized across engines.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    /// Decoded payload text.
    pub text: String,
    /// Symbology name, e.g. [`QR_CODE_FORMAT`].
    pub format: String,
    /// Corner points in the pixel space of the decoded image, if the engine
    /// reported geometry.
    pub points: Option<Vec<ResultPoint>>,
}

/// Black-box decode engine.
///
/// Implementations must distinguish "no code located" ([`DecodeError::NotFound`])
/// from engine failure, and report geometry in the pixel space of the image
/// they were given.
pub trait Decoder: Send + Sync {
    fn decode(&self, image: &GrayImage) -> DecodeResult<Decoded>;
}

/// QR decode engine backed by `rqrr`.
#[derive(Debug, Default)]
pub struct QrDecoder;

impl QrDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for QrDecoder {
    fn decode(&self, image: &GrayImage) -> DecodeResult<Decoded> {
        let (width, height) = image.dimensions();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            width as usize,
            height as usize,
            |x, y| image.get_pixel(x as u32, y as u32).0[0],
        );

        let grids = prepared.detect_grids();
        if grids.is_empty() {
            return Err(DecodeError::NotFound);
        }

        // Several grids can be detected in one image; the first that decodes
        // wins.
        let mut last_error = None;
        for grid in &grids {
            match grid.decode() {
                Ok((_meta, text)) => {
                    let points = grid
                        .bounds
                        .iter()
                        .map(|p| ResultPoint::new(f64::from(p.x), f64::from(p.y)))
                        .collect();
                    return Ok(Decoded {
                        text,
                        format: QR_CODE_FORMAT.to_string(),
                        points: Some(points),
                    });
                }
                Err(e) => last_error = Some(e.to_string()),
            }
        }

        Err(DecodeError::Engine(
            last_error.unwrap_or_else(|| "undecodable grid".to_string()),
        ))
    }
}
