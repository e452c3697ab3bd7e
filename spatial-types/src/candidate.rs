use crate::bbox::BoundingBox2D;
use serde::{Deserialize, Serialize};

/// A feature whose bounding box overlapped a query point and which passed
/// every filter, before the exact containment test.
///
/// Used to diagnose why a point did or did not match a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointInPolygonCandidate {
    pub wof_id: i64,
    /// Empty for the default geometry.
    #[serde(default)]
    pub alt_label: String,
    /// Bounding box of the indexed part that produced this candidate.
    pub bounds: BoundingBox2D,
}

impl PointInPolygonCandidate {
    pub fn is_alternate(&self) -> bool {
        !self.alt_label.is_empty()
    }
}
