use serde::{Deserialize, Serialize};

/// Minimum number of corner points for usable geometry. Decoders may report
/// fewer when detection is partial; such sets are normalized to absent.
pub const MIN_GEOMETRY_POINTS: usize = 3;

/// A corner point reported by the decoder, in source-image pixel space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultPoint {
    pub x: f64,
    pub y: f64,
}

impl ResultPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pixel dimensions of a decoded source image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Normalize a decoder-reported point sequence.
///
/// Sequences shorter than [`MIN_GEOMETRY_POINTS`] cannot outline a code and
/// are treated as if the decoder reported no geometry at all.
pub fn normalize_points(points: Option<Vec<ResultPoint>>) -> Option<Vec<ResultPoint>> {
    points.filter(|p| p.len() >= MIN_GEOMETRY_POINTS)
}

/// Corner geometry of a decoded result, paired with the source dimensions
/// the points are expressed in.
///
/// Borrowed from a [`ScanRecord`](crate::ScanRecord) via
/// [`geometry()`](crate::ScanRecord::geometry); exists only when the record
/// carries both points and dimensions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResultGeometry<'a> {
    points: &'a [ResultPoint],
    source: ImageDimensions,
}

impl<'a> ResultGeometry<'a> {
    pub(crate) fn new(points: &'a [ResultPoint], source: ImageDimensions) -> Self {
        Self { points, source }
    }

    /// The corner points in source-image pixel space.
    pub fn points(&self) -> &[ResultPoint] {
        self.points
    }

    /// The dimensions the points are expressed in.
    pub fn source(&self) -> ImageDimensions {
        self.source
    }

    /// Rescale the points onto a rendering of `target` size.
    ///
    /// Source dimensions with a zero side leave the points unscaled.
    pub fn scale_to(&self, target: ImageDimensions) -> Vec<ResultPoint> {
        if self.source.width == 0 || self.source.height == 0 {
            return self.points.to_vec();
        }
        let sx = f64::from(target.width) / f64::from(self.source.width);
        let sy = f64::from(target.height) / f64::from(self.source.height);
        self.points
            .iter()
            .map(|p| ResultPoint::new(p.x * sx, p.y * sy))
            .collect()
    }

    /// The points as percentages of the source dimensions, for overlays that
    /// position corners relative to whatever size the image is shown at.
    pub fn as_percentages(&self) -> Vec<ResultPoint> {
        self.scale_to(ImageDimensions::new(100, 100))
    }
}
