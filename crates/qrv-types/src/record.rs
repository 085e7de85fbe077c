use chrono::{DateTime, Utc};

use crate::geometry::{normalize_points, ImageDimensions, ResultGeometry, ResultPoint};
use crate::id::ScanId;

/// Symbology name reported for QR decodes.
pub const QR_CODE_FORMAT: &str = "QR_CODE";

/// The persisted metadata of one decoded scan.
///
/// A record is immutable once created: it is born from a successful decode
/// and destroyed by deletion. The image bytes it was decoded from live in
/// the blob store under the same [`ScanId`]; the record itself never holds
/// an image handle.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanRecord {
    /// Primary key across both stores.
    pub id: ScanId,
    /// Decoded payload.
    pub text: String,
    /// Symbology name, e.g. [`QR_CODE_FORMAT`].
    pub format: String,
    /// Creation instant (UTC).
    pub timestamp: DateTime<Utc>,
    /// Corner points in source-image pixel space, when the decoder reported
    /// geometry. Always `None` or at least three points.
    pub points: Option<Vec<ResultPoint>>,
    /// Source image size, required to rescale `points` for display.
    pub dimensions: Option<ImageDimensions>,
}

impl ScanRecord {
    /// Build a record, normalizing under-length point sequences to `None`.
    pub fn new(
        id: ScanId,
        text: impl Into<String>,
        format: impl Into<String>,
        timestamp: DateTime<Utc>,
        points: Option<Vec<ResultPoint>>,
        dimensions: Option<ImageDimensions>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            format: format.into(),
            timestamp,
            points: normalize_points(points),
            dimensions,
        }
    }

    /// Corner geometry view, present only when the record carries both
    /// points and source dimensions.
    pub fn geometry(&self) -> Option<ResultGeometry<'_>> {
        match (&self.points, self.dimensions) {
            (Some(points), Some(dims)) => Some(ResultGeometry::new(points, dims)),
            _ => None,
        }
    }

    /// Whether the decoded text looks like an http(s) URL.
    pub fn is_link(&self) -> bool {
        let lower = self.text.trim().to_ascii_lowercase();
        ["http://", "https://"]
            .iter()
            .any(|scheme| lower.strip_prefix(scheme).is_some_and(|rest| !rest.is_empty()))
    }
}
