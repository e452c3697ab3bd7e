//! In-memory R-tree spatial database for point-in-polygon queries.
//!
//! Polygon and multipolygon features are indexed by their per-part bounding
//! boxes; a query finds the boxes overlapping a point, drops duplicates,
//! applies attribute filters to each feature's summary record, and confirms
//! containment against the cached geometry.
//!
//! ```rust
//! use spatial_rtree::prelude::*;
//! use spatial_rtree::compute::geojson::feature_from_str;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<()> {
//! let db = RTreeSpatialDatabase::open("rtree://?strict=false")?;
//!
//! db.index_feature(feature_from_str(r#"{
//!     "type": "Feature",
//!     "properties": {"wof:id": 1108712253, "wof:placetype": "microhood", "mz:is_current": 1},
//!     "geometry": {"type": "Polygon", "coordinates": [[
//!         [-71.121, 42.375], [-71.119, 42.375], [-71.119, 42.377], [-71.121, 42.377], [-71.121, 42.375]
//!     ]]}
//! }"#)?)?;
//!
//! let current: SharedFilter = std::sync::Arc::new(SprFilter::from_query("is_current=1")?);
//! let outcome = db
//!     .point_in_polygon(coordinate(42.376015, -71.120168)?, &[current], &CancellationToken::new())
//!     .await?;
//!
//! assert_eq!(outcome.into_results().map(|r| r.ids()), Some(vec![1108712253]));
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod compute;
pub mod config;
pub mod db;
pub mod error;
pub mod feature;
pub mod filter;
pub mod ingest;

pub use builder::DatabaseBuilder;
pub use config::DatabaseConfig;
pub use db::{
    QueryOutcome, RTreeSpatialDatabase, SpatialDatabase, new_spatial_database,
    register_spatial_database,
};
pub use error::{Result, SpatialError};
pub use feature::{Feature, FeatureKey};
pub use filter::{Filter, Rejection, SharedFilter, SprFilter, SprInputs};

pub use geo::{Coord, MultiPolygon, Polygon};
pub use tokio_util::sync::CancellationToken;

pub use spatial_types::{
    BoundingBox2D, Existential, PointInPolygonCandidate, StandardPlacesResult,
    StandardPlacesResults,
};

pub mod prelude {
    pub use crate::compute::validation::coordinate;
    pub use crate::{
        CancellationToken, Coord, DatabaseBuilder, DatabaseConfig, Existential, Feature,
        Filter, QueryOutcome, RTreeSpatialDatabase, Rejection, Result, SharedFilter,
        SpatialDatabase, SpatialError, SprFilter, StandardPlacesResult, StandardPlacesResults,
    };
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
