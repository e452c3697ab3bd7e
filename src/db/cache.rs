//! Feature cache: geometry and summary record per geometry variant.
//!
//! Keyed by [`FeatureKey`] (numeric id + alt label). Reads and writes are safe
//! from any thread without external locking.
//!
//! Expiry is lazy: an expired entry reads as a miss and stays in memory until
//! it is overwritten, removed, or swept. When a sweep interval is configured a
//! janitor thread ticks a `tokio::time::interval` on its own single-threaded
//! runtime and sweeps on every tick until its cancellation token fires, which
//! happens when the cache is dropped or [`FeatureCache::stop_janitor`] is called.

use crate::compute::geometry::FeatureGeometry;
use crate::feature::FeatureKey;
use dashmap::DashMap;
use parking_lot::Mutex;
use spatial_types::spr::StandardPlacesResult;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Lifetime of a single cache write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiration {
    /// Use the cache's default expiration.
    #[default]
    Default,
    /// Never expire, regardless of the default.
    Never,
    After(Duration),
}

/// A cache hit. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CachedFeature {
    pub geometry: Arc<FeatureGeometry>,
    pub spr: Arc<StandardPlacesResult>,
}

#[derive(Debug)]
struct CacheItem {
    feature: CachedFeature,
    expires_at: Option<Instant>,
}

impl CacheItem {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

type ItemMap = DashMap<FeatureKey, CacheItem>;

struct Janitor {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct FeatureCache {
    items: Arc<ItemMap>,
    default_expiration: Option<Duration>,
    janitor: Mutex<Option<Janitor>>,
}

impl FeatureCache {
    /// `None` means entries never expire / no periodic sweep.
    pub fn new(default_expiration: Option<Duration>, cleanup_interval: Option<Duration>) -> Self {
        let items = Arc::new(ItemMap::new());
        let janitor = cleanup_interval.map(|interval| spawn_janitor(Arc::downgrade(&items), interval));

        Self {
            items,
            default_expiration,
            janitor: Mutex::new(janitor),
        }
    }

    /// Store an entry with the default expiration.
    pub fn put(&self, key: FeatureKey, geometry: FeatureGeometry, spr: StandardPlacesResult) {
        self.put_with_expiration(key, geometry, spr, Expiration::Default);
    }

    pub fn put_with_expiration(
        &self,
        key: FeatureKey,
        geometry: FeatureGeometry,
        spr: StandardPlacesResult,
        expiration: Expiration,
    ) {
        let lifetime = match expiration {
            Expiration::Default => self.default_expiration,
            Expiration::Never => None,
            Expiration::After(duration) => Some(duration),
        };

        let item = CacheItem {
            feature: CachedFeature {
                geometry: Arc::new(geometry),
                spr: Arc::new(spr),
            },
            // A lifetime too long to represent never expires.
            expires_at: lifetime.and_then(|duration| Instant::now().checked_add(duration)),
        };

        self.items.insert(key, item);
    }

    /// `None` when the key is absent or its entry has expired.
    pub fn get(&self, key: &FeatureKey) -> Option<CachedFeature> {
        let item = self.items.get(key)?;

        if item.is_expired(Instant::now()) {
            return None;
        }

        Some(item.feature.clone())
    }

    pub fn contains(&self, key: &FeatureKey) -> bool {
        self.get(key).is_some()
    }

    /// Remove every geometry variant cached for a numeric id.
    pub fn remove_all(&self, wof_id: i64) -> usize {
        let mut removed = 0;
        self.items.retain(|key, _| {
            let doomed = key.wof_id == wof_id;
            removed += usize::from(doomed);
            !doomed
        });
        removed
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        sweep(&self.items)
    }

    /// Number of stored entries, expired ones included until they are swept.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Stop the background sweep, if one is running, and wait for it to exit.
    pub fn stop_janitor(&self) {
        let Some(janitor) = self.janitor.lock().take() else {
            return;
        };

        janitor.shutdown.cancel();
        if janitor.handle.join().is_err() {
            log::error!("Feature cache janitor panicked");
        }
    }
}

impl Drop for FeatureCache {
    fn drop(&mut self) {
        self.stop_janitor();
    }
}

fn sweep(items: &ItemMap) -> usize {
    let now = Instant::now();
    let mut removed = 0;
    items.retain(|_, item| {
        let expired = item.is_expired(now);
        removed += usize::from(expired);
        !expired
    });

    if removed > 0 {
        log::debug!("Swept {} expired feature cache entries", removed);
    }

    removed
}

fn spawn_janitor(items: Weak<ItemMap>, interval: Duration) -> Janitor {
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();

    // Own runtime so the cache works with or without an ambient one.
    let handle = thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                log::error!("Feature cache janitor could not start: {}", err);
                return;
            }
        };

        runtime.block_on(run_janitor(items, interval, token));
    });

    Janitor { shutdown, handle }
}

async fn run_janitor(items: Weak<ItemMap>, period: Duration, shutdown: CancellationToken) {
    log::debug!("Feature cache janitor started, interval {:?}", period);

    let mut ticks = tokio::time::interval(period);
    ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticks.tick().await;

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => break,

            _ = ticks.tick() => {
                let Some(items) = items.upgrade() else {
                    break;
                };
                sweep(&items);
            }
        }
    }

    log::debug!("Feature cache janitor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn geometry() -> FeatureGeometry {
        polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ]
        .into()
    }

    fn spr(id: i64) -> StandardPlacesResult {
        StandardPlacesResult {
            id,
            ..Default::default()
        }
    }

    #[test]
    fn test_put_get() {
        let cache = FeatureCache::new(None, None);
        let key = FeatureKey::primary(1);

        assert!(cache.get(&key).is_none());
        cache.put(key.clone(), geometry(), spr(1));

        let hit = cache.get(&key).unwrap();
        assert_eq!(hit.spr.id, 1);
        assert_eq!(hit.geometry.kind(), "Polygon");
        assert!(cache.get(&FeatureKey::new(1, "alt")).is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let cache = FeatureCache::new(None, None);
        let key = FeatureKey::primary(7);

        cache.put(key.clone(), geometry(), spr(7));
        let mut updated = spr(7);
        updated.name = "renamed".to_string();
        cache.put(key.clone(), geometry(), updated);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key).unwrap().spr.name, "renamed");
    }

    #[test]
    fn test_remove_all_variants() {
        let cache = FeatureCache::new(None, None);
        cache.put(FeatureKey::primary(1), geometry(), spr(1));
        cache.put(FeatureKey::new(1, "quattroshapes"), geometry(), spr(1));
        cache.put(FeatureKey::primary(2), geometry(), spr(2));

        assert_eq!(cache.remove_all(1), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&FeatureKey::primary(2)));
    }

    #[test]
    fn test_lazy_expiration() {
        let cache = FeatureCache::new(Some(Duration::from_millis(20)), None);
        let key = FeatureKey::primary(1);
        cache.put(key.clone(), geometry(), spr(1));
        cache.put_with_expiration(FeatureKey::primary(2), geometry(), spr(2), Expiration::Never);

        assert!(cache.contains(&key));
        thread::sleep(Duration::from_millis(40));

        assert!(!cache.contains(&key));
        assert!(cache.contains(&FeatureKey::primary(2)));
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_unrepresentable_lifetime_never_expires() {
        let cache = FeatureCache::new(Some(Duration::from_secs(u64::MAX)), None);
        let key = FeatureKey::primary(1);
        cache.put(key.clone(), geometry(), spr(1));
        cache.put_with_expiration(
            FeatureKey::primary(2),
            geometry(),
            spr(2),
            Expiration::After(Duration::MAX),
        );

        assert!(cache.contains(&key));
        assert!(cache.contains(&FeatureKey::primary(2)));
        assert_eq!(cache.cleanup_expired(), 0);
    }

    #[test]
    fn test_janitor_stops_without_sweeping() {
        let cache = FeatureCache::new(None, Some(Duration::from_secs(3600)));
        cache.put_with_expiration(
            FeatureKey::primary(1),
            geometry(),
            spr(1),
            Expiration::After(Duration::from_millis(1)),
        );

        let started = Instant::now();
        cache.stop_janitor();
        assert!(started.elapsed() < Duration::from_secs(60));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_janitor_sweeps() {
        let cache = FeatureCache::new(None, Some(Duration::from_millis(10)));
        cache.put_with_expiration(
            FeatureKey::primary(1),
            geometry(),
            spr(1),
            Expiration::After(Duration::from_millis(5)),
        );

        let deadline = Instant::now() + Duration::from_secs(2);
        while !cache.is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }

        assert!(cache.is_empty());
        cache.stop_janitor();
        cache.stop_janitor();
    }
}
