//! Queryable feature geometry and exact point containment.
//!
//! Only polygonal geometry can answer a point-in-polygon query, so the cache
//! stores a closed [`FeatureGeometry`] variant rather than an arbitrary
//! `geo::Geometry`. Conversion from anything else fails at ingestion time.

use crate::error::{Result, SpatialError};
use geo::{BoundingRect, Contains, Coord, Geometry, MultiPolygon, Polygon};
use smallvec::SmallVec;
use spatial_types::bbox::BoundingBox2D;

/// Bounding boxes for the parts of one geometry. Most features have one part.
pub type PartBounds = SmallVec<[BoundingBox2D; 1]>;

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl FeatureGeometry {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Polygon(_) => "Polygon",
            Self::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Exact containment test for a coordinate.
    pub fn contains_coord(&self, coord: Coord<f64>) -> bool {
        match self {
            Self::Polygon(polygon) => polygon_contains_coord(polygon, coord),
            Self::MultiPolygon(multi) => multipolygon_contains_coord(multi, coord),
        }
    }

    /// One bounding box per polygon part, in part order.
    ///
    /// Parts without any coordinates contribute no box.
    pub fn part_bounds(&self) -> PartBounds {
        match self {
            Self::Polygon(polygon) => polygon
                .bounding_rect()
                .map(BoundingBox2D::from_rect)
                .into_iter()
                .collect(),
            Self::MultiPolygon(multi) => multi
                .iter()
                .filter_map(|polygon| polygon.bounding_rect())
                .map(BoundingBox2D::from_rect)
                .collect(),
        }
    }

    /// Bounding box of the whole geometry.
    pub fn bounds(&self) -> Option<BoundingBox2D> {
        let rect = match self {
            Self::Polygon(polygon) => polygon.bounding_rect(),
            Self::MultiPolygon(multi) => multi.bounding_rect(),
        };
        rect.map(BoundingBox2D::from_rect)
    }
}

impl From<Polygon<f64>> for FeatureGeometry {
    fn from(polygon: Polygon<f64>) -> Self {
        Self::Polygon(polygon)
    }
}

impl From<MultiPolygon<f64>> for FeatureGeometry {
    fn from(multi: MultiPolygon<f64>) -> Self {
        Self::MultiPolygon(multi)
    }
}

impl TryFrom<Geometry<f64>> for FeatureGeometry {
    type Error = SpatialError;

    fn try_from(geometry: Geometry<f64>) -> Result<Self> {
        match geometry {
            Geometry::Polygon(polygon) => Ok(Self::Polygon(polygon)),
            Geometry::MultiPolygon(multi) => Ok(Self::MultiPolygon(multi)),
            other => Err(SpatialError::UnsupportedGeometry(
                geometry_kind(&other).to_string(),
            )),
        }
    }
}

/// Inside the exterior ring and outside every interior ring.
///
/// Points exactly on a ring are not contained.
pub fn polygon_contains_coord(polygon: &Polygon<f64>, coord: Coord<f64>) -> bool {
    polygon.contains(&coord)
}

/// Inside any member polygon.
pub fn multipolygon_contains_coord(multi: &MultiPolygon<f64>, coord: Coord<f64>) -> bool {
    multi.iter().any(|polygon| polygon_contains_coord(polygon, coord))
}

pub(crate) fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
