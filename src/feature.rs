//! Features as the database consumes them.
//!
//! A [`Feature`] is already decoded: it carries a numeric id, an alternate
//! geometry label (empty for the default geometry), a typed polygonal geometry,
//! one bounding box per geometry part, and its summary record. Decoding from
//! documents lives in [`crate::compute::geojson`].

use crate::compute::geometry::{FeatureGeometry, PartBounds};
use spatial_types::bbox::BoundingBox2D;
use spatial_types::spr::StandardPlacesResult;
use std::fmt;

/// Identity of one cached geometry variant of a feature.
///
/// Several index entries (one per geometry part) share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureKey {
    pub wof_id: i64,
    pub alt_label: String,
}

impl FeatureKey {
    pub fn new(wof_id: i64, alt_label: impl Into<String>) -> Self {
        Self {
            wof_id,
            alt_label: alt_label.into(),
        }
    }

    /// Key for a feature's default geometry.
    pub fn primary(wof_id: i64) -> Self {
        Self::new(wof_id, String::new())
    }

    pub fn is_alternate(&self) -> bool {
        !self.alt_label.is_empty()
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_alternate() {
            write!(f, "{}-alt-{}", self.wof_id, self.alt_label)
        } else {
            write!(f, "{}", self.wof_id)
        }
    }
}

/// A decoded feature ready to be indexed.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    key: FeatureKey,
    geometry: FeatureGeometry,
    bounding_boxes: PartBounds,
    spr: StandardPlacesResult,
}

impl Feature {
    /// Bounding boxes are computed from the geometry, one per polygon part.
    pub fn new(
        wof_id: i64,
        alt_label: impl Into<String>,
        geometry: impl Into<FeatureGeometry>,
        spr: StandardPlacesResult,
    ) -> Self {
        let geometry = geometry.into();
        let bounding_boxes = geometry.part_bounds();

        Self {
            key: FeatureKey::new(wof_id, alt_label),
            geometry,
            bounding_boxes,
            spr,
        }
    }

    /// Replace the computed bounding boxes.
    pub fn with_bounding_boxes(mut self, boxes: impl IntoIterator<Item = BoundingBox2D>) -> Self {
        self.bounding_boxes = boxes.into_iter().collect();
        self
    }

    pub fn key(&self) -> &FeatureKey {
        &self.key
    }

    pub fn wof_id(&self) -> i64 {
        self.key.wof_id
    }

    pub fn alt_label(&self) -> &str {
        &self.key.alt_label
    }

    pub fn is_alternate(&self) -> bool {
        self.key.is_alternate()
    }

    pub fn geometry(&self) -> &FeatureGeometry {
        &self.geometry
    }

    pub fn bounding_boxes(&self) -> &[BoundingBox2D] {
        &self.bounding_boxes
    }

    pub fn spr(&self) -> &StandardPlacesResult {
        &self.spr
    }

    pub(crate) fn into_parts(self) -> (FeatureKey, FeatureGeometry, PartBounds, StandardPlacesResult) {
        (self.key, self.geometry, self.bounding_boxes, self.spr)
    }
}
