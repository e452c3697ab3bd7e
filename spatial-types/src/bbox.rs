use geo::{Coord, Point, Rect};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in longitude/latitude space.
///
/// Corners are normalised on construction, so `min <= max` on both axes even
/// when the caller passes them swapped. Serialises as the wrapped `geo::Rect`.
///
/// ```
/// use spatial_types::bbox::BoundingBox2D;
///
/// let mission = BoundingBox2D::new(-122.43, 37.74, -122.40, 37.77);
/// assert!(mission.width() > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2D {
    pub rect: Rect,
}

impl BoundingBox2D {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::from_rect(Rect::new(
            geo::coord! { x: min_x, y: min_y },
            geo::coord! { x: max_x, y: max_y },
        ))
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self { rect }
    }

    /// Square of side `extent` centred on `center`. Used as the query probe.
    pub fn around(center: Coord, extent: f64) -> Self {
        let half = extent / 2.0;
        Self::new(
            center.x - half,
            center.y - half,
            center.x + half,
            center.y + half,
        )
    }

    pub fn min_x(&self) -> f64 {
        self.rect.min().x
    }

    pub fn min_y(&self) -> f64 {
        self.rect.min().y
    }

    pub fn max_x(&self) -> f64 {
        self.rect.max().x
    }

    pub fn max_y(&self) -> f64 {
        self.rect.max().y
    }

    /// Midpoint, used as the fallback label position of a place.
    pub fn center(&self) -> Point {
        self.rect.center().into()
    }

    pub fn width(&self) -> f64 {
        self.rect.width()
    }

    pub fn height(&self) -> f64 {
        self.rect.height()
    }

    /// False when any corner is NaN or infinite; such boxes are never indexed.
    pub fn is_finite(&self) -> bool {
        let (min, max) = (self.rect.min(), self.rect.max());
        [min.x, min.y, max.x, max.y].iter().all(|v| v.is_finite())
    }

    /// Edges count as inside.
    pub fn contains_point(&self, point: &Point) -> bool {
        (self.min_x()..=self.max_x()).contains(&point.x())
            && (self.min_y()..=self.max_y()).contains(&point.y())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swapped_corners_are_normalised() {
        let bbox = BoundingBox2D::new(-122.40, 37.77, -122.43, 37.74);
        assert_eq!(bbox.min_x(), -122.43);
        assert_eq!(bbox.min_y(), 37.74);
        assert_eq!(bbox.max_x(), -122.40);
        assert_eq!(bbox.max_y(), 37.77);
        assert!(bbox.width() > 0.0 && bbox.height() > 0.0);
    }

    #[test]
    fn test_around_is_centred() {
        let square = BoundingBox2D::around(geo::coord! { x: 1.0, y: 2.0 }, 0.5);
        assert_eq!(square.min_x(), 0.75);
        assert_eq!(square.max_y(), 2.25);
        assert_eq!(square.center(), Point::new(1.0, 2.0));
    }

    #[test]
    fn test_point_on_edge_is_inside() {
        let bbox = BoundingBox2D::new(0.0, 0.0, 10.0, 10.0);
        assert!(bbox.contains_point(&Point::new(5.0, 5.0)));
        assert!(bbox.contains_point(&Point::new(10.0, 0.0)));
        assert!(!bbox.contains_point(&Point::new(-0.1, 5.0)));
        assert!(!bbox.contains_point(&Point::new(5.0, 10.1)));
    }

    #[test]
    fn test_non_finite_corners() {
        assert!(BoundingBox2D::new(0.0, 0.0, 1.0, 1.0).is_finite());
        assert!(!BoundingBox2D::new(0.0, 0.0, f64::INFINITY, 1.0).is_finite());
        assert!(!BoundingBox2D::new(f64::NAN, 0.0, 1.0, 1.0).is_finite());
    }
}
