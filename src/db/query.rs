//! Point-in-polygon queries.
//!
//! A query runs in four steps:
//!
//! 1. search the index with a tiny probe rectangle centred on the coordinate,
//!    holding the reader lock for that one call only;
//! 2. fan out one blocking task per candidate entry;
//! 3. in each task: skip if the query was cancelled, skip if another entry
//!    with the same numeric id was already claimed, resolve the cache entry
//!    (a miss drops the candidate), apply the filters in order, then test
//!    exact containment;
//! 4. collect whatever survives. Order is not meaningful.
//!
//! Per-candidate problems never fail the query. Cancellation is reported as
//! [`QueryOutcome::Cancelled`], not as an error and not as an empty result.

use super::RTreeSpatialDatabase;
use crate::compute::spatial::IndexEntry;
use crate::compute::validation::validate_coordinate;
use crate::config::PROBE_EXTENT;
use crate::db::cache::CachedFeature;
use crate::error::{Result, SpatialError};
use crate::filter::{SharedFilter, apply_filters};
use geo::Coord;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use spatial_types::bbox::BoundingBox2D;
use spatial_types::candidate::PointInPolygonCandidate;
use spatial_types::spr::{StandardPlacesResult, StandardPlacesResults};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Result of a query that may be cancelled.
///
/// `Complete` with an empty set means nothing matched; `Cancelled` means the
/// caller gave up before an answer was ready.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome<T> {
    Complete(T),
    Cancelled,
}

impl<T> QueryOutcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// `None` when the query was cancelled.
    pub fn into_results(self) -> Option<T> {
        match self {
            Self::Complete(results) => Some(results),
            Self::Cancelled => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryOutcome<U> {
        match self {
            Self::Complete(results) => QueryOutcome::Complete(f(results)),
            Self::Cancelled => QueryOutcome::Cancelled,
        }
    }
}

impl RTreeSpatialDatabase {
    /// Summary records of every feature containing `coord` and passing all
    /// `filters`. `coord` is `x = longitude`, `y = latitude`.
    pub async fn point_in_polygon(
        &self,
        coord: Coord,
        filters: &[SharedFilter],
        cancel: &CancellationToken,
    ) -> Result<QueryOutcome<StandardPlacesResults>> {
        let outcome = self
            .evaluate(coord, filters, cancel, move |entry, cached| {
                if !cached.geometry.contains_coord(coord) {
                    log::debug!(
                        "SKIP {} because does not contain coord ({}, {})",
                        entry.key(),
                        coord.x,
                        coord.y
                    );
                    return None;
                }

                Some(StandardPlacesResult::clone(&cached.spr))
            })
            .await?;

        Ok(outcome.map(StandardPlacesResults::new))
    }

    /// Candidates whose bounding box overlaps `coord` and whose summary record
    /// passes all `filters`, before the exact containment test.
    pub async fn point_in_polygon_candidates(
        &self,
        coord: Coord,
        filters: &[SharedFilter],
        cancel: &CancellationToken,
    ) -> Result<QueryOutcome<Vec<PointInPolygonCandidate>>> {
        self.evaluate(coord, filters, cancel, |entry, _| {
            Some(PointInPolygonCandidate {
                wof_id: entry.wof_id(),
                alt_label: entry.alt_label().to_string(),
                bounds: *entry.bounds(),
            })
        })
        .await
    }

    /// Index entries whose rectangle overlaps the probe around `coord`.
    fn intersecting(&self, coord: Coord) -> Vec<IndexEntry> {
        let probe = BoundingBox2D::around(coord, PROBE_EXTENT);
        self.inner.index.search_intersect(&probe)
    }

    async fn evaluate<T, F>(
        &self,
        coord: Coord,
        filters: &[SharedFilter],
        cancel: &CancellationToken,
        finish: F,
    ) -> Result<QueryOutcome<Vec<T>>>
    where
        T: Send + 'static,
        F: Fn(&IndexEntry, &CachedFeature) -> Option<T> + Send + Sync + 'static,
    {
        self.ensure_open()?;
        validate_coordinate(&coord)?;

        if cancel.is_cancelled() {
            return Ok(QueryOutcome::Cancelled);
        }

        let possible = self.intersecting(coord);
        log::debug!(
            "{} candidates for ({}, {})",
            possible.len(),
            coord.x,
            coord.y
        );

        // Stragglers see this fire when we return, whatever the reason.
        let worker_cancel = cancel.child_token();
        let _stop_workers = worker_cancel.clone().drop_guard();

        let seen: Arc<Mutex<FxHashSet<i64>>> = Arc::default();
        let filters: Arc<[SharedFilter]> = Arc::from(filters);
        let finish = Arc::new(finish);

        let mut workers = JoinSet::new();
        for entry in possible {
            let inner = Arc::clone(&self.inner);
            let seen = Arc::clone(&seen);
            let filters = Arc::clone(&filters);
            let finish = Arc::clone(&finish);
            let cancel = worker_cancel.clone();

            workers.spawn_blocking(move || {
                if cancel.is_cancelled() {
                    return None;
                }

                if !seen.lock().insert(entry.wof_id()) {
                    return None;
                }

                let Some(cached) = inner.cache.get(entry.key()) else {
                    log::debug!("Failed to retrieve feature cache for {}", entry.key());
                    return None;
                };

                if let Err(rejection) = apply_filters(&filters, &cached.spr) {
                    log::debug!("SKIP {} because filter error {}", entry.key(), rejection);
                    return None;
                }

                (*finish)(&entry, &cached)
            });
        }

        let mut results = Vec::new();
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    workers.abort_all();
                    log::debug!("Query for ({}, {}) cancelled", coord.x, coord.y);
                    return Ok(QueryOutcome::Cancelled);
                }

                joined = workers.join_next() => match joined {
                    None => break,
                    Some(Ok(Some(result))) => results.push(result),
                    Some(Ok(None)) => {}
                    Some(Err(err)) => {
                        return Err(SpatialError::WorkerFailed(err.to_string()));
                    }
                },
            }
        }

        Ok(QueryOutcome::Complete(results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Feature;
    use crate::filter::{Rejection, SprFilter};
    use geo::{MultiPolygon, coord, polygon};
    use spatial_types::existential::Existential;

    fn spr(wof_id: i64, is_current: Existential) -> StandardPlacesResult {
        StandardPlacesResult {
            id: wof_id,
            placetype: "microhood".to_string(),
            is_current,
            ..Default::default()
        }
    }

    fn square(wof_id: i64, x: f64, y: f64, is_current: Existential) -> Feature {
        let poly = polygon![
            (x: x, y: y),
            (x: x + 1.0, y: y),
            (x: x + 1.0, y: y + 1.0),
            (x: x, y: y + 1.0),
            (x: x, y: y),
        ];
        Feature::new(wof_id, "", poly, spr(wof_id, is_current))
    }

    fn database() -> RTreeSpatialDatabase {
        let db = RTreeSpatialDatabase::memory();
        db.index_feature(square(1, 0.0, 0.0, Existential::True)).unwrap();
        db.index_feature(square(2, 0.5, 0.5, Existential::False)).unwrap();
        db.index_feature(square(3, 10.0, 10.0, Existential::True)).unwrap();
        db
    }

    #[tokio::test]
    async fn test_point_in_polygon() {
        let db = database();
        let cancel = CancellationToken::new();

        let results = db
            .point_in_polygon(coord! { x: 0.25, y: 0.25 }, &[], &cancel)
            .await
            .unwrap()
            .into_results()
            .unwrap();
        assert_eq!(results.ids(), vec![1]);

        let results = db
            .point_in_polygon(coord! { x: 0.75, y: 0.75 }, &[], &cancel)
            .await
            .unwrap()
            .into_results()
            .unwrap();
        assert_eq!(results.ids(), vec![1, 2]);

        let results = db
            .point_in_polygon(coord! { x: 50.0, y: 50.0 }, &[], &cancel)
            .await
            .unwrap();
        assert_eq!(results, QueryOutcome::Complete(StandardPlacesResults::default()));
    }

    #[tokio::test]
    async fn test_filters_run_before_containment() {
        let db = database();
        let cancel = CancellationToken::new();
        let current: SharedFilter = Arc::new(SprFilter::from_query("is_current=1").unwrap());

        let results = db
            .point_in_polygon(coord! { x: 0.75, y: 0.75 }, &[current], &cancel)
            .await
            .unwrap()
            .into_results()
            .unwrap();
        assert_eq!(results.ids(), vec![1]);

        let nothing: SharedFilter =
            Arc::new(|_: &StandardPlacesResult| -> std::result::Result<(), Rejection> {
                Err(Rejection::new("nope"))
            });
        let candidates = db
            .point_in_polygon_candidates(coord! { x: 0.75, y: 0.75 }, &[nothing], &cancel)
            .await
            .unwrap()
            .into_results()
            .unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn test_candidates_include_bounding_box_false_positives() {
        let db = RTreeSpatialDatabase::memory();
        let triangle = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 0.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ];
        db.index_feature(Feature::new(7, "", triangle, spr(7, Existential::True)))
            .unwrap();

        let cancel = CancellationToken::new();
        let point = coord! { x: 0.9, y: 0.9 };

        let candidates = db
            .point_in_polygon_candidates(point, &[], &cancel)
            .await
            .unwrap()
            .into_results()
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].wof_id, 7);

        let results = db
            .point_in_polygon(point, &[], &cancel)
            .await
            .unwrap()
            .into_results()
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_multipart_feature_deduplicated() {
        let db = RTreeSpatialDatabase::memory();
        let left = polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 0.0, y: 2.0),
            (x: 0.0, y: 0.0),
        ];
        let right = polygon![
            (x: 1.0, y: 1.0),
            (x: 3.0, y: 1.0),
            (x: 3.0, y: 3.0),
            (x: 1.0, y: 3.0),
            (x: 1.0, y: 1.0),
        ];
        let multi = MultiPolygon::new(vec![left, right]);
        db.index_feature(Feature::new(9, "", multi, spr(9, Existential::True)))
            .unwrap();
        assert_eq!(db.len(), 2);

        let cancel = CancellationToken::new();
        let point = coord! { x: 1.5, y: 1.5 };

        let results = db
            .point_in_polygon(point, &[], &cancel)
            .await
            .unwrap()
            .into_results()
            .unwrap();
        assert_eq!(results.ids(), vec![9]);

        let candidates = db
            .point_in_polygon_candidates(point, &[], &cancel)
            .await
            .unwrap()
            .into_results()
            .unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[tokio::test]
    async fn test_cache_miss_drops_candidate() {
        let db = database();
        db.inner.cache.remove_all(1);

        let results = db
            .point_in_polygon(coord! { x: 0.25, y: 0.25 }, &[], &CancellationToken::new())
            .await
            .unwrap()
            .into_results()
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_query_is_not_an_empty_answer() {
        let db = database();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = db
            .point_in_polygon(coord! { x: 0.25, y: 0.25 }, &[], &cancel)
            .await
            .unwrap();
        assert!(outcome.is_cancelled());
        assert!(outcome.into_results().is_none());

        let outcome = db
            .point_in_polygon(coord! { x: 50.0, y: 50.0 }, &[], &CancellationToken::new())
            .await
            .unwrap();
        assert!(!outcome.is_cancelled());
    }

    #[tokio::test]
    async fn test_invalid_coordinates_and_closed_database() {
        let db = database();
        let cancel = CancellationToken::new();

        assert!(matches!(
            db.point_in_polygon(coord! { x: 0.0, y: 95.0 }, &[], &cancel).await,
            Err(SpatialError::InvalidInput(_))
        ));

        db.close().unwrap();
        assert!(matches!(
            db.point_in_polygon(coord! { x: 0.25, y: 0.25 }, &[], &cancel).await,
            Err(SpatialError::DatabaseClosed)
        ));
    }
}
