use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use bytes::Bytes;
use image::DynamicImage;

use crate::error::{DecodeError, DecodeResult};

/// A crop rectangle in source-image pixel space.
///
/// Rendered and parsed as `X,Y,WxH` (e.g. `10,20,64x48`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A region with no area.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the region lies fully inside an image of the given size.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        u64::from(self.x) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(height)
    }
}

impl fmt::Display for CropRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}x{}", self.x, self.y, self.width, self.height)
    }
}

impl FromStr for CropRegion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid crop region {s:?}, expected X,Y,WxH");

        let mut parts = s.split(',');
        let x = parts.next().ok_or_else(invalid)?;
        let y = parts.next().ok_or_else(invalid)?;
        let size = parts.next().ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        let (width, height) = size.split_once('x').ok_or_else(invalid)?;
        Ok(Self {
            x: x.trim().parse().map_err(|_| invalid())?,
            y: y.trim().parse().map_err(|_| invalid())?,
            width: width.trim().parse().map_err(|_| invalid())?,
            height: height.trim().parse().map_err(|_| invalid())?,
        })
    }
}

/// Re-encode the crop region of `bytes` as a PNG payload.
///
/// The crop must be non-empty and lie fully inside the image. The output
/// goes back through the normal scan path, and is what gets persisted when
/// the cropped scan succeeds.
pub fn crop_bytes(bytes: &[u8], region: CropRegion) -> DecodeResult<Bytes> {
    let image =
        image::load_from_memory(bytes).map_err(|e| DecodeError::InvalidImage(e.to_string()))?;
    let (width, height) = (image.width(), image.height());

    if region.is_empty() || !region.fits_within(width, height) {
        return Err(DecodeError::InvalidCrop {
            region,
            width,
            height,
        });
    }

    let cropped = image.crop_imm(region.x, region.y, region.width, region.height);
    encode_png(&cropped)
}

/// Encode raw RGBA rows (e.g. a pasted clipboard image) as a PNG payload.
pub fn rgba_to_png(width: u32, height: u32, rgba: &[u8]) -> DecodeResult<Bytes> {
    let buffer = image::RgbaImage::from_raw(width, height, rgba.to_vec()).ok_or_else(|| {
        DecodeError::InvalidImage(format!(
            "{width}x{height} image cannot be built from {} bytes",
            rgba.len()
        ))
    })?;
    encode_png(&DynamicImage::ImageRgba8(buffer))
}

fn encode_png(image: &DynamicImage) -> DecodeResult<Bytes> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| DecodeError::Encoding(e.to_string()))?;
    Ok(Bytes::from(out.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            if x < width / 2 && y < height / 2 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    // -----------------------------------------------------------------------
    // CropRegion parsing
    // -----------------------------------------------------------------------

    #[test]
    fn display_and_parse_round_trip() {
        let region = CropRegion::new(10, 20, 64, 48);
        let rendered = region.to_string();
        assert_eq!(rendered, "10,20,64x48");
        assert_eq!(rendered.parse::<CropRegion>().unwrap(), region);
    }

    #[test]
    fn parse_tolerates_spaces() {
        let region = " 1 , 2 , 3 x 4 ".trim().parse::<CropRegion>().unwrap();
        assert_eq!(region, CropRegion::new(1, 2, 3, 4));
    }

    #[test]
    fn parse_rejects_malformed_input() {
        for bad in ["", "1,2", "1,2,3", "1,2,3x", "1,2,3x4,5", "a,b,cxd", "1;2;3x4"] {
            assert!(bad.parse::<CropRegion>().is_err(), "input {bad:?}");
        }
    }

    // -----------------------------------------------------------------------
    // crop_bytes
    // -----------------------------------------------------------------------

    #[test]
    fn crop_produces_decodable_png_of_region_size() {
        let source = png_bytes(100, 80);
        let cropped = crop_bytes(&source, CropRegion::new(10, 10, 30, 20)).unwrap();

        let reloaded = image::load_from_memory(&cropped).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (30, 20));
    }

    #[test]
    fn crop_preserves_pixel_content() {
        let source = png_bytes(100, 80);
        // Entirely inside the red quadrant.
        let cropped = crop_bytes(&source, CropRegion::new(0, 0, 10, 10)).unwrap();

        let reloaded = image::load_from_memory(&cropped).unwrap().to_rgb8();
        assert_eq!(reloaded.get_pixel(5, 5), &Rgb([255, 0, 0]));
    }

    #[test]
    fn crop_rejects_empty_region() {
        let source = png_bytes(100, 80);
        let err = crop_bytes(&source, CropRegion::new(10, 10, 0, 20)).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidCrop { .. }));
    }

    #[test]
    fn crop_rejects_out_of_bounds_region() {
        let source = png_bytes(100, 80);
        for region in [
            CropRegion::new(90, 0, 20, 20),  // spills right
            CropRegion::new(0, 70, 20, 20),  // spills bottom
            CropRegion::new(200, 200, 5, 5), // fully outside
        ] {
            let err = crop_bytes(&source, region).unwrap_err();
            assert!(matches!(err, DecodeError::InvalidCrop { .. }), "{region}");
        }
    }

    #[test]
    fn crop_rejects_unreadable_bytes() {
        let err = crop_bytes(b"not an image", CropRegion::new(0, 0, 1, 1)).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidImage(_)));
    }

    #[test]
    fn full_image_crop_is_allowed() {
        let source = png_bytes(40, 30);
        let cropped = crop_bytes(&source, CropRegion::new(0, 0, 40, 30)).unwrap();
        let reloaded = image::load_from_memory(&cropped).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (40, 30));
    }

    // -----------------------------------------------------------------------
    // rgba_to_png
    // -----------------------------------------------------------------------

    #[test]
    fn rgba_round_trip() {
        let rgba = [
            255, 0, 0, 255, // red
            0, 255, 0, 255, // green
            0, 0, 255, 255, // blue
            255, 255, 255, 255, // white
        ];
        let png = rgba_to_png(2, 2, &rgba).unwrap();

        let reloaded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!((reloaded.width(), reloaded.height()), (2, 2));
        assert_eq!(reloaded.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(reloaded.get_pixel(1, 1).0, [255, 255, 255, 255]);
    }

    #[test]
    fn rgba_rejects_wrong_buffer_size() {
        let err = rgba_to_png(2, 2, &[0u8; 7]).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidImage(_)));
    }
}
