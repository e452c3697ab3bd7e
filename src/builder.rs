//! Database builder for programmatic configuration
//!
//! The URI form (`rtree://?strict=false`) suits process wiring; the builder
//! suits code and tests. Sources added with [`DatabaseBuilder::source`] are
//! indexed when the database is built.

use crate::config::DatabaseConfig;
use crate::db::RTreeSpatialDatabase;
use crate::error::Result;
use crate::ingest::{IndexMode, index_paths};
use std::path::PathBuf;
use std::time::Duration;

/// Builder for an [`RTreeSpatialDatabase`].
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    config: DatabaseConfig,
    sources: Vec<(IndexMode, PathBuf)>,
}

impl DatabaseBuilder {
    /// Strict, never-expiring, empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configuration with one parsed from a construction URI.
    pub fn uri(mut self, uri: &str) -> Result<Self> {
        self.config = DatabaseConfig::from_uri(uri)?;
        Ok(self)
    }

    pub fn config(mut self, config: DatabaseConfig) -> Self {
        self.config = config;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.config = self.config.with_strict(strict);
        self
    }

    pub fn default_expiration(mut self, expiration: Duration) -> Self {
        self.config = self.config.with_default_expiration(expiration);
        self
    }

    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.config = self.config.with_cleanup_interval(interval);
        self
    }

    /// Index `path` on build.
    pub fn source<P: Into<PathBuf>>(mut self, mode: IndexMode, path: P) -> Self {
        self.sources.push((mode, path.into()));
        self
    }

    /// Build the database and index every source in the order added.
    pub fn build(self) -> Result<RTreeSpatialDatabase> {
        let db = RTreeSpatialDatabase::with_config(self.config);

        for (mode, path) in &self.sources {
            let indexed = index_paths(&db, *mode, std::slice::from_ref(path))?;
            log::debug!("Indexed {} features from {}", indexed, path.display());
        }

        Ok(db)
    }
}
