//! Compute layer: geometry tests, document decoding and the bounding-box index.
//!
//! Nothing here knows about the database facade; `db` composes these pieces.

pub mod geojson;
pub mod geometry;
pub mod spatial;
pub mod validation;

pub use geometry::{FeatureGeometry, multipolygon_contains_coord, polygon_contains_coord};
