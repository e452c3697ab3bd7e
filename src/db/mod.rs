//! The in-memory R-tree spatial database.
//!
//! [`RTreeSpatialDatabase`] owns exactly one [`SpatialIndex`] and one
//! [`FeatureCache`]. Indexing writes the cache entry first and the index
//! entries second, so any index entry a query finds can be resolved; removal
//! drops both. Queries are async and fan candidate evaluation out onto the
//! blocking pool (see [`query`]).
//!
//! Thread-safe by default: clones share the same state.

use crate::builder::DatabaseBuilder;
use crate::compute::spatial::SpatialIndex;
use crate::config::DatabaseConfig;
use crate::error::{Result, SpatialError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use url::Url;

pub mod cache;
mod index;
mod query;
pub mod registry;

pub use cache::{CachedFeature, Expiration, FeatureCache};
pub use query::QueryOutcome;
pub use registry::{
    DatabaseConstructor, SpatialDatabase, new_spatial_database, register_spatial_database,
    schemes,
};

/// URI scheme of the in-memory R-tree backend.
pub const RTREE_SCHEME: &str = "rtree";

pub(crate) struct DatabaseInner {
    pub(crate) index: SpatialIndex,
    pub(crate) cache: FeatureCache,
    pub(crate) config: DatabaseConfig,
    pub(crate) closed: AtomicBool,
}

/// In-memory spatial database answering point-in-polygon queries.
#[derive(Clone)]
pub struct RTreeSpatialDatabase {
    pub(crate) inner: Arc<DatabaseInner>,
}

impl RTreeSpatialDatabase {
    /// Open a database from a construction URI such as
    /// `rtree://?strict=false&default_expiration=3600`.
    pub fn open(uri: &str) -> Result<Self> {
        let url = Url::parse(uri)?;
        Self::from_url(&url)
    }

    pub fn from_url(url: &Url) -> Result<Self> {
        if url.scheme() != RTREE_SCHEME {
            return Err(SpatialError::UnknownScheme(url.scheme().to_string()));
        }

        Ok(Self::with_config(DatabaseConfig::from_url(url)?))
    }

    pub fn with_config(config: DatabaseConfig) -> Self {
        let cache = FeatureCache::new(config.expiration(), config.sweep_interval());

        log::debug!(
            "Opened rtree database (strict: {}, expiration: {:?}, cleanup: {:?})",
            config.strict,
            config.expiration(),
            config.sweep_interval()
        );

        Self {
            inner: Arc::new(DatabaseInner {
                index: SpatialIndex::new(),
                cache,
                config,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Default configuration: strict, entries never expire.
    pub fn memory() -> Self {
        Self::with_config(DatabaseConfig::default())
    }

    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.inner.config
    }

    /// Number of index entries (one per indexed geometry part).
    pub fn len(&self) -> usize {
        self.inner.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.index.is_empty()
    }

    /// Number of distinct numeric ids with at least one index entry.
    pub fn feature_count(&self) -> usize {
        self.inner.index.feature_count()
    }

    /// Number of cached geometry variants.
    pub fn cached_features(&self) -> usize {
        self.inner.cache.len()
    }

    /// Release resources. Idempotent; every later operation fails with
    /// [`SpatialError::DatabaseClosed`].
    pub fn close(&self) -> Result<()> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        self.inner.cache.stop_janitor();
        log::debug!("Closed rtree database");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(SpatialError::DatabaseClosed);
        }
        Ok(())
    }
}

impl std::fmt::Debug for RTreeSpatialDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RTreeSpatialDatabase")
            .field("config", &self.inner.config)
            .field("entries", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_open_from_uri() {
        let db = RTreeSpatialDatabase::open("rtree://?strict=false&cleanup_interval=30").unwrap();
        assert!(!db.config().strict);
        assert_eq!(db.config().cleanup_interval, Duration::from_secs(30));
        assert!(db.is_empty());
        db.close().unwrap();
    }

    #[test]
    fn test_open_rejects_other_schemes() {
        assert!(matches!(
            RTreeSpatialDatabase::open("sqlite://?dsn=test.db"),
            Err(SpatialError::UnknownScheme(ref scheme)) if scheme == "sqlite"
        ));
        assert!(matches!(
            RTreeSpatialDatabase::open("rtree://?strict=perhaps"),
            Err(SpatialError::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_close_is_idempotent() {
        let db = RTreeSpatialDatabase::memory();
        let other = db.clone();

        db.close().unwrap();
        db.close().unwrap();

        assert!(other.is_closed());
        assert!(matches!(other.ensure_open(), Err(SpatialError::DatabaseClosed)));
    }
}
