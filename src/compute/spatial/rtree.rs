//! Bounding-box index over feature parts, backed by an R*-tree.
//!
//! Every polygon part of an indexed feature contributes one [`IndexEntry`].
//! A search returns *candidates*: entries whose rectangle overlaps the probe.
//! Overlap says nothing about whether the probe point is inside the polygon;
//! that is decided later against the cached geometry.
//!
//! The index is internally synchronised. Inserts and removals take the writer
//! lock, searches take the reader lock, and no lock is held past a single call.

use crate::config::{RTREE_MAX_CHILDREN, RTREE_MIN_CHILDREN, RTREE_REINSERTION_COUNT};
use crate::error::{Result, SpatialError};
use crate::feature::FeatureKey;
use parking_lot::RwLock;
use rstar::{AABB, RStarInsertionStrategy, RTree, RTreeObject, RTreeParams};
use rustc_hash::FxHashMap;
use spatial_types::bbox::BoundingBox2D;

/// Node sizing for the feature tree.
///
/// Half-full minimum keeps the tree shallow for tens of thousands of parts
/// while bounding the per-node scan during a search.
pub struct IndexParams;

impl RTreeParams for IndexParams {
    const MIN_SIZE: usize = RTREE_MIN_CHILDREN;
    const MAX_SIZE: usize = RTREE_MAX_CHILDREN;
    const REINSERTION_COUNT: usize = RTREE_REINSERTION_COUNT;
    type DefaultInsertionStrategy = RStarInsertionStrategy;
}

/// One indexed rectangle: a single part of a single geometry variant.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    bounds: BoundingBox2D,
    key: FeatureKey,
    entry_id: String,
}

impl IndexEntry {
    /// Fails when the rectangle has non-finite corners or no area.
    pub fn new(key: FeatureKey, part: usize, bounds: BoundingBox2D) -> Result<Self> {
        let entry_id = format!("{}#{}", key, part);

        if !bounds.is_finite() {
            return Err(SpatialError::DegenerateRect {
                key: entry_id,
                reason: "non-finite coordinates".to_string(),
            });
        }

        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Err(SpatialError::DegenerateRect {
                key: entry_id,
                reason: format!(
                    "rectangle must have positive extent, got {} x {}",
                    bounds.width(),
                    bounds.height()
                ),
            });
        }

        Ok(Self {
            bounds,
            key,
            entry_id,
        })
    }

    pub fn key(&self) -> &FeatureKey {
        &self.key
    }

    pub fn wof_id(&self) -> i64 {
        self.key.wof_id
    }

    pub fn alt_label(&self) -> &str {
        &self.key.alt_label
    }

    pub fn bounds(&self) -> &BoundingBox2D {
        &self.bounds
    }

    /// Per-part bookkeeping id, only used inside the index and in logs.
    pub(crate) fn entry_id(&self) -> &str {
        &self.entry_id
    }
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        to_envelope(&self.bounds)
    }
}

fn to_envelope(bounds: &BoundingBox2D) -> AABB<[f64; 2]> {
    AABB::from_corners(
        [bounds.min_x(), bounds.min_y()],
        [bounds.max_x(), bounds.max_y()],
    )
}

struct IndexState {
    tree: RTree<IndexEntry, IndexParams>,
    // Entries per numeric id, for removal without a full tree scan
    by_feature: FxHashMap<i64, Vec<IndexEntry>>,
}

impl IndexState {
    fn insert(&mut self, entry: IndexEntry) {
        self.by_feature
            .entry(entry.wof_id())
            .or_default()
            .push(entry.clone());
        self.tree.insert(entry);
    }

    fn remove_key(&mut self, key: &FeatureKey) -> usize {
        let Some(entries) = self.by_feature.get_mut(&key.wof_id) else {
            return 0;
        };

        let (doomed, kept): (Vec<_>, Vec<_>) =
            entries.drain(..).partition(|entry| &entry.key == key);
        *entries = kept;

        if entries.is_empty() {
            self.by_feature.remove(&key.wof_id);
        }

        doomed
            .iter()
            .filter(|entry| self.tree.remove(entry).is_some())
            .count()
    }
}

/// The shared feature tree.
pub struct SpatialIndex {
    state: RwLock<IndexState>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(IndexState {
                tree: RTree::new_with_params(),
                by_feature: FxHashMap::default(),
            }),
        }
    }

    pub fn insert(&self, entry: IndexEntry) {
        log::trace!("index {} {:?}", entry.entry_id(), entry.bounds());
        self.state.write().insert(entry);
    }

    /// Swap every entry for `key` with `entries` in one critical section.
    ///
    /// Returns the number of entries removed.
    pub fn replace(&self, key: &FeatureKey, entries: Vec<IndexEntry>) -> usize {
        let mut state = self.state.write();
        let removed = state.remove_key(key);

        for entry in entries {
            log::trace!("index {} {:?}", entry.entry_id(), entry.bounds());
            state.insert(entry);
        }

        removed
    }

    /// Entries whose rectangle overlaps `bounds` (edges inclusive).
    pub fn search_intersect(&self, bounds: &BoundingBox2D) -> Vec<IndexEntry> {
        let envelope = to_envelope(bounds);
        let state = self.state.read();

        state
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .cloned()
            .collect()
    }

    /// Remove every entry, across all geometry variants, for a numeric id.
    pub fn remove_feature(&self, wof_id: i64) -> usize {
        let mut state = self.state.write();
        let Some(entries) = state.by_feature.remove(&wof_id) else {
            return 0;
        };

        entries
            .iter()
            .filter(|entry| state.tree.remove(entry).is_some())
            .count()
    }

    /// Remove every entry matching `predicate`. Scans the whole tree.
    pub fn remove_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&IndexEntry) -> bool,
    {
        let mut state = self.state.write();
        let doomed: Vec<IndexEntry> = state
            .tree
            .iter()
            .filter(|entry| predicate(*entry))
            .cloned()
            .collect();

        for entry in &doomed {
            state.tree.remove(entry);
            if let Some(entries) = state.by_feature.get_mut(&entry.wof_id()) {
                entries.retain(|e| e != entry);
                if entries.is_empty() {
                    state.by_feature.remove(&entry.wof_id());
                }
            }
        }

        doomed.len()
    }

    /// Number of indexed rectangles.
    pub fn len(&self) -> usize {
        self.state.read().tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct numeric ids with at least one entry.
    pub fn feature_count(&self) -> usize {
        self.state.read().by_feature.len()
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(wof_id: i64, alt: &str, part: usize, bounds: BoundingBox2D) -> IndexEntry {
        IndexEntry::new(FeatureKey::new(wof_id, alt), part, bounds).unwrap()
    }

    #[test]
    fn test_degenerate_rectangles_rejected() {
        let key = FeatureKey::primary(1);

        let point = BoundingBox2D::new(1.0, 1.0, 1.0, 1.0);
        assert!(matches!(
            IndexEntry::new(key.clone(), 0, point),
            Err(SpatialError::DegenerateRect { .. })
        ));

        let flat = BoundingBox2D::new(0.0, 1.0, 5.0, 1.0);
        assert!(IndexEntry::new(key.clone(), 0, flat).is_err());

        let nan = BoundingBox2D::new(f64::NAN, 0.0, 1.0, 1.0);
        assert!(IndexEntry::new(key, 0, nan).is_err());
    }

    #[test]
    fn test_search_returns_overlapping_candidates() {
        let index = SpatialIndex::new();
        index.insert(entry(1, "", 0, BoundingBox2D::new(0.0, 0.0, 10.0, 10.0)));
        index.insert(entry(2, "", 0, BoundingBox2D::new(5.0, 5.0, 15.0, 15.0)));
        index.insert(entry(3, "", 0, BoundingBox2D::new(20.0, 20.0, 30.0, 30.0)));

        let probe = BoundingBox2D::around(geo::coord! { x: 7.0, y: 7.0 }, 0.0001);
        let mut ids: Vec<i64> = index
            .search_intersect(&probe)
            .iter()
            .map(IndexEntry::wof_id)
            .collect();
        ids.sort_unstable();

        assert_eq!(ids, vec![1, 2]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_remove_feature_drops_all_parts_and_variants() {
        let index = SpatialIndex::new();
        index.insert(entry(1, "", 0, BoundingBox2D::new(0.0, 0.0, 1.0, 1.0)));
        index.insert(entry(1, "", 1, BoundingBox2D::new(2.0, 2.0, 3.0, 3.0)));
        index.insert(entry(1, "quattroshapes", 0, BoundingBox2D::new(0.0, 0.0, 1.5, 1.5)));
        index.insert(entry(2, "", 0, BoundingBox2D::new(0.0, 0.0, 1.0, 1.0)));

        assert_eq!(index.feature_count(), 2);
        assert_eq!(index.remove_feature(1), 3);
        assert_eq!(index.len(), 1);
        assert_eq!(index.remove_feature(1), 0);
    }

    #[test]
    fn test_replace_only_touches_matching_variant() {
        let index = SpatialIndex::new();
        index.insert(entry(1, "", 0, BoundingBox2D::new(0.0, 0.0, 1.0, 1.0)));
        index.insert(entry(1, "alt", 0, BoundingBox2D::new(0.0, 0.0, 1.0, 1.0)));

        let key = FeatureKey::primary(1);
        let removed = index.replace(
            &key,
            vec![entry(1, "", 0, BoundingBox2D::new(10.0, 10.0, 11.0, 11.0))],
        );

        assert_eq!(removed, 1);
        assert_eq!(index.len(), 2);

        let probe = BoundingBox2D::around(geo::coord! { x: 0.5, y: 0.5 }, 0.0001);
        let hits = index.search_intersect(&probe);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].alt_label(), "alt");
    }

    #[test]
    fn test_remove_where() {
        let index = SpatialIndex::new();
        for id in 0..100 {
            let x = id as f64;
            index.insert(entry(id, "", 0, BoundingBox2D::new(x, 0.0, x + 0.5, 0.5)));
        }

        let removed = index.remove_where(|entry| entry.wof_id() % 2 == 0);
        assert_eq!(removed, 50);
        assert_eq!(index.len(), 50);
        assert_eq!(index.feature_count(), 50);
    }
}
