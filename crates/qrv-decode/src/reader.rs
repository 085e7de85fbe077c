use tracing::debug;

use qrv_types::{geometry, ImageDimensions};

use crate::decoder::{Decoded, Decoder, QrDecoder};
use crate::error::{DecodeError, DecodeResult};

/// A successful scan: the decoded payload plus the dimensions of the image
/// it was decoded from. The dimensions anchor the geometry, so overlays can
/// rescale the corner points to any render size.
#[derive(Clone, Debug, PartialEq)]
pub struct Capture {
    pub decoded: Decoded,
    pub dimensions: ImageDimensions,
}

/// The decode adapter: validates incoming bytes, runs the engine, and
/// normalizes the outcome.
///
/// Stateless. Every call stands alone; the reader never retries or deletes
/// anything. Failure classification is the caller's cue for what to do
/// next: [`DecodeError::NotFound`] means "offer a crop and retry", anything
/// else is a plain decode failure.
pub struct ScanReader {
    decoder: Box<dyn Decoder>,
}

impl ScanReader {
    /// Reader backed by the production QR engine.
    pub fn new() -> Self {
        Self::with_decoder(Box::new(QrDecoder::new()))
    }

    /// Reader backed by a caller-supplied engine.
    pub fn with_decoder(decoder: Box<dyn Decoder>) -> Self {
        Self { decoder }
    }

    /// Decode an image payload.
    pub fn scan(&self, bytes: &[u8]) -> DecodeResult<Capture> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| DecodeError::InvalidImage(e.to_string()))?;
        let dimensions = ImageDimensions::new(image.width(), image.height());

        let gray = image.to_luma8();
        let mut decoded = self.decoder.decode(&gray)?;
        decoded.points = geometry::normalize_points(decoded.points);

        debug!(
            width = dimensions.width,
            height = dimensions.height,
            text_len = decoded.text.len(),
            "decode succeeded"
        );
        Ok(Capture {
            decoded,
            dimensions,
        })
    }
}

impl Default for ScanReader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScanReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanReader").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use image::{DynamicImage, GrayImage, Rgb, RgbImage};
    use qrv_types::{ResultPoint, QR_CODE_FORMAT};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 200, 200]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    /// Engine double returning a canned outcome.
    struct FixedDecoder(DecodeResult<Decoded>);

    impl Decoder for FixedDecoder {
        fn decode(&self, _image: &GrayImage) -> DecodeResult<Decoded> {
            match &self.0 {
                Ok(decoded) => Ok(decoded.clone()),
                Err(DecodeError::NotFound) => Err(DecodeError::NotFound),
                Err(DecodeError::Engine(msg)) => Err(DecodeError::Engine(msg.clone())),
                Err(other) => panic!("unexpected canned error: {other}"),
            }
        }
    }

    fn decoded_with_points(points: Option<Vec<ResultPoint>>) -> Decoded {
        Decoded {
            text: "hello".to_string(),
            format: QR_CODE_FORMAT.to_string(),
            points,
        }
    }

    #[test]
    fn scan_rejects_unreadable_bytes() {
        let reader = ScanReader::new();
        let err = reader.scan(b"definitely not an image").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidImage(_)));
    }

    #[test]
    fn blank_image_classifies_as_not_found() {
        let reader = ScanReader::new();
        let err = reader.scan(&png_bytes(64, 64)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn capture_reports_source_dimensions() {
        let reader = ScanReader::with_decoder(Box::new(FixedDecoder(Ok(decoded_with_points(None)))));
        let capture = reader.scan(&png_bytes(64, 48)).unwrap();
        assert_eq!(capture.dimensions, ImageDimensions::new(64, 48));
        assert_eq!(capture.decoded.text, "hello");
    }

    #[test]
    fn short_point_sets_are_normalized_away() {
        let two_points = Some(vec![ResultPoint::new(1.0, 1.0), ResultPoint::new(2.0, 2.0)]);
        let reader =
            ScanReader::with_decoder(Box::new(FixedDecoder(Ok(decoded_with_points(two_points)))));

        let capture = reader.scan(&png_bytes(32, 32)).unwrap();
        assert_eq!(capture.decoded.points, None);
    }

    #[test]
    fn full_point_sets_pass_through() {
        let corners = Some(vec![
            ResultPoint::new(0.0, 0.0),
            ResultPoint::new(31.0, 0.0),
            ResultPoint::new(31.0, 31.0),
            ResultPoint::new(0.0, 31.0),
        ]);
        let reader =
            ScanReader::with_decoder(Box::new(FixedDecoder(Ok(decoded_with_points(corners.clone())))));

        let capture = reader.scan(&png_bytes(32, 32)).unwrap();
        assert_eq!(capture.decoded.points, corners);
    }

    #[test]
    fn engine_errors_pass_through() {
        let reader = ScanReader::with_decoder(Box::new(FixedDecoder(Err(DecodeError::Engine(
            "damaged finder pattern".to_string(),
        )))));

        let err = reader.scan(&png_bytes(32, 32)).unwrap_err();
        assert!(matches!(err, DecodeError::Engine(_)));
        assert!(!err.is_not_found());
    }
}
