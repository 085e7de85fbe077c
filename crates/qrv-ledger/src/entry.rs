use serde::{Deserialize, Serialize};

use qrv_types::time;
use qrv_types::{ImageDimensions, ResultPoint, ScanId, ScanRecord, TypeError};

/// Raw wire shape of one persisted scan record.
///
/// Field names follow the persisted JSON document (camelCase). The
/// timestamp stays a string at this layer so a single unreadable entry is
/// dropped during reconstruction instead of poisoning the whole document.
/// There is deliberately no image-handle field: handles are process-local
/// and minted fresh from the blob store on every load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: ScanId,
    pub text: String,
    pub format: String,
    /// RFC 3339 instant, as written by [`from_record`](Self::from_record).
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_points: Option<Vec<ResultPoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_dimensions: Option<ImageDimensions>,
}

impl LedgerEntry {
    /// Serialize a typed record into its wire shape.
    pub fn from_record(record: &ScanRecord) -> Self {
        Self {
            id: record.id.clone(),
            text: record.text.clone(),
            format: record.format.clone(),
            timestamp: time::to_rfc3339(record.timestamp),
            result_points: record.points.clone(),
            image_dimensions: record.dimensions,
        }
    }

    /// Reconstruct the typed record.
    ///
    /// Fails when the stored timestamp does not parse. Point sequences
    /// shorter than three are normalized to absent, as at creation.
    pub fn into_record(self) -> Result<ScanRecord, TypeError> {
        let timestamp = time::parse_rfc3339(&self.timestamp)?;
        Ok(ScanRecord::new(
            self.id,
            self.text,
            self.format,
            timestamp,
            self.result_points,
            self.image_dimensions,
        ))
    }
}
