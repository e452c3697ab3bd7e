//! # spatial-types
//!
//! Value types shared by the `spatial-rtree` database and its callers:
//!
//! - **Bounding boxes**: `BoundingBox2D`
//! - **Existential flags**: `Existential` (the `-1 / 0 / 1` convention)
//! - **Summary records**: `StandardPlacesResult`, `StandardPlacesResults`
//! - **Diagnostics**: `PointInPolygonCandidate`
//!
//! All types are serializable with Serde and built on top of the `geo` crate's
//! geometric primitives.
//!
//! ## Examples
//!
//! ```rust
//! use spatial_types::bbox::BoundingBox2D;
//! use spatial_types::existential::Existential;
//! use geo::Point;
//!
//! let cambridge = BoundingBox2D::new(-71.16, 42.35, -71.06, 42.40);
//! assert!(cambridge.contains_point(&Point::new(-71.12, 42.37)));
//!
//! assert_eq!(Existential::from_flag(-1), Some(Existential::Unknown));
//! ```

pub mod bbox;
pub mod candidate;
pub mod existential;
pub mod spr;

pub use bbox::BoundingBox2D;
pub use candidate::PointInPolygonCandidate;
pub use existential::Existential;
pub use spr::{StandardPlacesResult, StandardPlacesResults};
