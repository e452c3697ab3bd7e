//! Backend registry keyed by URI scheme.
//!
//! Callers hold an `Arc<dyn SpatialDatabase>` built by
//! [`new_spatial_database`] and never name a concrete backend. The in-memory
//! R-tree backend is registered under `rtree`; other backends register
//! themselves with [`register_spatial_database`] before the first lookup.

use super::{QueryOutcome, RTREE_SCHEME, RTreeSpatialDatabase};
use crate::error::{Result, SpatialError};
use crate::feature::Feature;
use crate::filter::SharedFilter;
use async_trait::async_trait;
use geo::Coord;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use spatial_types::candidate::PointInPolygonCandidate;
use spatial_types::spr::StandardPlacesResults;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Operations every spatial database backend provides.
#[async_trait]
pub trait SpatialDatabase: Send + Sync {
    async fn index_feature(&self, feature: Feature) -> Result<()>;

    /// Remove every geometry variant of a numeric id.
    async fn remove_feature(&self, wof_id: i64) -> Result<()>;

    async fn point_in_polygon(
        &self,
        coord: Coord,
        filters: &[SharedFilter],
        cancel: &CancellationToken,
    ) -> Result<QueryOutcome<StandardPlacesResults>>;

    async fn point_in_polygon_candidates(
        &self,
        coord: Coord,
        filters: &[SharedFilter],
        cancel: &CancellationToken,
    ) -> Result<QueryOutcome<Vec<PointInPolygonCandidate>>>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
impl SpatialDatabase for RTreeSpatialDatabase {
    async fn index_feature(&self, feature: Feature) -> Result<()> {
        RTreeSpatialDatabase::index_feature(self, feature)
    }

    async fn remove_feature(&self, wof_id: i64) -> Result<()> {
        RTreeSpatialDatabase::remove_feature(self, wof_id)
    }

    async fn point_in_polygon(
        &self,
        coord: Coord,
        filters: &[SharedFilter],
        cancel: &CancellationToken,
    ) -> Result<QueryOutcome<StandardPlacesResults>> {
        RTreeSpatialDatabase::point_in_polygon(self, coord, filters, cancel).await
    }

    async fn point_in_polygon_candidates(
        &self,
        coord: Coord,
        filters: &[SharedFilter],
        cancel: &CancellationToken,
    ) -> Result<QueryOutcome<Vec<PointInPolygonCandidate>>> {
        RTreeSpatialDatabase::point_in_polygon_candidates(self, coord, filters, cancel).await
    }

    async fn close(&self) -> Result<()> {
        RTreeSpatialDatabase::close(self)
    }
}

/// Builds a backend from its parsed construction URI.
pub type DatabaseConstructor = fn(&Url) -> Result<Arc<dyn SpatialDatabase>>;

fn rtree_constructor(url: &Url) -> Result<Arc<dyn SpatialDatabase>> {
    Ok(Arc::new(RTreeSpatialDatabase::from_url(url)?))
}

static REGISTRY: Lazy<RwLock<HashMap<String, DatabaseConstructor>>> = Lazy::new(|| {
    let mut constructors: HashMap<String, DatabaseConstructor> = HashMap::new();
    constructors.insert(RTREE_SCHEME.to_string(), rtree_constructor);
    RwLock::new(constructors)
});

/// Register a backend under `scheme`. Fails if the scheme is taken.
pub fn register_spatial_database(scheme: &str, constructor: DatabaseConstructor) -> Result<()> {
    let scheme = scheme.to_ascii_lowercase();
    let mut registry = REGISTRY.write();

    if registry.contains_key(&scheme) {
        return Err(SpatialError::DuplicateScheme(scheme));
    }

    log::debug!("Registered spatial database scheme '{}'", scheme);
    registry.insert(scheme, constructor);
    Ok(())
}

/// Construct the backend registered for the URI's scheme.
pub fn new_spatial_database(uri: &str) -> Result<Arc<dyn SpatialDatabase>> {
    let url = Url::parse(uri)?;

    let constructor = REGISTRY
        .read()
        .get(url.scheme())
        .copied()
        .ok_or_else(|| SpatialError::UnknownScheme(url.scheme().to_string()))?;

    constructor(&url)
}

/// Registered schemes, sorted.
pub fn schemes() -> Vec<String> {
    let mut schemes: Vec<String> = REGISTRY.read().keys().cloned().collect();
    schemes.sort();
    schemes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rtree_is_registered() {
        assert!(schemes().contains(&"rtree".to_string()));
        assert!(new_spatial_database("rtree://?strict=false").is_ok());
    }

    #[test]
    fn test_unknown_scheme() {
        assert!(matches!(
            new_spatial_database("postgis://localhost/wof"),
            Err(SpatialError::UnknownScheme(ref scheme)) if scheme == "postgis"
        ));
    }

    #[test]
    fn test_duplicate_registration() {
        assert!(matches!(
            register_spatial_database("rtree", rtree_constructor),
            Err(SpatialError::DuplicateScheme(_))
        ));

        register_spatial_database("registry-unit-test", rtree_constructor).unwrap();
        assert!(register_spatial_database("Registry-Unit-Test", rtree_constructor).is_err());
    }
}
