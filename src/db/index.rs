//! Indexing and removal.

use super::RTreeSpatialDatabase;
use crate::compute::spatial::IndexEntry;
use crate::error::Result;
use crate::feature::Feature;

impl RTreeSpatialDatabase {
    /// Cache a feature and index one rectangle per bounding box.
    ///
    /// Bounding boxes that cannot become index rectangles (non-finite or zero
    /// area) fail the whole call in strict mode, before anything is written.
    /// Otherwise they are logged and skipped, and the feature may end up
    /// partially indexed. Re-indexing the same (id, alt label) replaces its
    /// previous entries.
    pub fn index_feature(&self, feature: Feature) -> Result<()> {
        self.ensure_open()?;

        let strict = self.inner.config.strict;
        let (key, geometry, boxes, spr) = feature.into_parts();

        let mut entries = Vec::with_capacity(boxes.len());
        for (part, bounds) in boxes.into_iter().enumerate() {
            match IndexEntry::new(key.clone(), part, bounds) {
                Ok(entry) => entries.push(entry),
                Err(err) if strict => return Err(err),
                Err(err) => {
                    log::error!(
                        "{} failed indexing, ({}). Strict mode is disabled, so skipping.",
                        key,
                        err
                    );
                }
            }
        }

        if entries.is_empty() {
            log::warn!("{} has no indexable bounding boxes", key);
            return Ok(());
        }

        self.inner.cache.put(key.clone(), geometry, spr);

        let replaced = self.inner.index.replace(&key, entries);
        if replaced > 0 {
            log::debug!("Replaced {} index entries for {}", replaced, key);
        }

        Ok(())
    }

    /// Remove every index entry and cache entry, across all alt labels, for a
    /// numeric id. Removing an unknown id is not an error.
    pub fn remove_feature(&self, wof_id: i64) -> Result<()> {
        self.ensure_open()?;

        let entries = self.inner.index.remove_feature(wof_id);
        let cached = self.inner.cache.remove_all(wof_id);
        log::debug!(
            "Removed {} index entries and {} cache entries for {}",
            entries,
            cached,
            wof_id
        );

        Ok(())
    }
}
