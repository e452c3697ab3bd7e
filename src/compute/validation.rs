//! Validation for query coordinates.

use crate::error::{Result, SpatialError};
use geo::Coord;

/// Validates that a coordinate has a finite, in-range longitude (x) and latitude (y).
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use spatial_rtree::compute::validation::validate_coordinate;
/// use geo::coord;
///
/// // Old Cambridge
/// assert!(validate_coordinate(&coord! { x: -71.120168, y: 42.376015 }).is_ok());
///
/// // Latitude and longitude swapped
/// assert!(validate_coordinate(&coord! { x: 42.376015, y: -171.120168 }).is_err());
/// ```
pub fn validate_coordinate(coord: &Coord<f64>) -> Result<()> {
    let (x, y) = (coord.x, coord.y);

    if !x.is_finite() {
        return Err(SpatialError::InvalidInput(format!(
            "Longitude must be finite, got: {}",
            x
        )));
    }

    if !y.is_finite() {
        return Err(SpatialError::InvalidInput(format!(
            "Latitude must be finite, got: {}",
            y
        )));
    }

    if !(-180.0..=180.0).contains(&x) {
        return Err(SpatialError::InvalidInput(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            x
        )));
    }

    if !(-90.0..=90.0).contains(&y) {
        return Err(SpatialError::InvalidInput(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            y
        )));
    }

    Ok(())
}

/// Builds a query coordinate from latitude and longitude, validating both.
pub fn coordinate(latitude: f64, longitude: f64) -> Result<Coord<f64>> {
    let coord = Coord {
        x: longitude,
        y: latitude,
    };
    validate_coordinate(&coord)?;
    Ok(coord)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    #[test]
    fn test_valid_coordinates() {
        assert!(validate_coordinate(&coord! { x: 0.0, y: 0.0 }).is_ok());
        assert!(validate_coordinate(&coord! { x: 180.0, y: 90.0 }).is_ok());
        assert!(validate_coordinate(&coord! { x: -180.0, y: -90.0 }).is_ok());
    }

    #[test]
    fn test_invalid_coordinates() {
        assert!(validate_coordinate(&coord! { x: f64::NAN, y: 0.0 }).is_err());
        assert!(validate_coordinate(&coord! { x: 0.0, y: f64::INFINITY }).is_err());
        assert!(validate_coordinate(&coord! { x: 180.1, y: 0.0 }).is_err());
        assert!(validate_coordinate(&coord! { x: 0.0, y: -90.5 }).is_err());
    }

    #[test]
    fn test_coordinate_uses_both_axes() {
        let coord = coordinate(37.794893, -122.395268).unwrap();
        assert_eq!(coord.x, -122.395268);
        assert_eq!(coord.y, 37.794893);
    }
}
