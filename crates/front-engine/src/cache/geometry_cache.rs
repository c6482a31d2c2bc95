//! LRU cache for resolved bin geometry, shared across granules.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::error::Result;
use crate::geometry::{resolve, ResolvedGeometry};
use crate::scheme::BinningScheme;
use crate::types::CacheStats;

type Entry = (BinningScheme, Arc<ResolvedGeometry>);

struct Inner {
    cache: LruCache<u64, Entry>,
    current_memory: usize,
}

/// Memory-bounded LRU of [`ResolvedGeometry`] keyed by scheme identity.
///
/// Entries are handed out as `Arc`s, so a geometry stays alive for callers
/// holding it even after eviction. All methods take `&self`; the cache can be
/// shared between worker threads.
pub struct GeometryCache {
    inner: Mutex<Inner>,
    memory_limit: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl GeometryCache {
    /// Create a cache with the given memory limit in bytes.
    pub fn new(memory_limit: usize) -> Self {
        // A granule batch rarely mixes more than a handful of schemes.
        let max_entries = NonZeroUsize::new(16).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                cache: LruCache::new(max_entries),
                current_memory: 0,
            }),
            memory_limit,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the cached geometry for `scheme`, resolving it on a miss.
    ///
    /// Resolution runs outside the lock; two threads missing on the same
    /// scheme may both resolve it, and the second insert wins.
    pub fn get_or_resolve(&self, scheme: &BinningScheme) -> Result<Arc<ResolvedGeometry>> {
        let key = scheme.fingerprint();

        if let Some(geometry) = self.get(key, scheme) {
            return Ok(geometry);
        }

        let geometry = Arc::new(resolve(scheme)?);
        self.insert(key, scheme.clone(), Arc::clone(&geometry));
        Ok(geometry)
    }

    fn get(&self, key: u64, scheme: &BinningScheme) -> Option<Arc<ResolvedGeometry>> {
        let mut inner = self.lock();
        match inner.cache.get(&key) {
            Some((cached_scheme, geometry)) if cached_scheme == scheme => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(geometry))
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn insert(&self, key: u64, scheme: BinningScheme, geometry: Arc<ResolvedGeometry>) {
        let size = geometry.memory_bytes();
        if size > self.memory_limit {
            debug!(bytes = size, limit = self.memory_limit, "Geometry too large to cache");
            return;
        }

        let mut inner = self.lock();

        if let Some((_, old)) = inner.cache.pop(&key) {
            inner.current_memory = inner.current_memory.saturating_sub(old.memory_bytes());
        }

        while (inner.current_memory + size > self.memory_limit || inner.cache.len() == inner.cache.cap().get())
            && !inner.cache.is_empty()
        {
            if let Some((_, (_, evicted))) = inner.cache.pop_lru() {
                inner.current_memory = inner.current_memory.saturating_sub(evicted.memory_bytes());
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        inner.cache.put(key, (scheme, geometry));
        inner.current_memory += size;
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: inner.cache.len(),
            memory_bytes: inner.current_memory as u64,
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Clear all entries from the cache.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.cache.clear();
        inner.current_memory = 0;
    }

    pub fn len(&self) -> usize {
        self.lock().cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().cache.is_empty()
    }
}

/// Default memory bound: the 4 km ISIN geometry (about 475 MB at 20 bytes
/// per bin) plus the 9 km one (about 119 MB).
pub const DEFAULT_MEMORY_LIMIT: usize = 640 * 1024 * 1024;

impl Default for GeometryCache {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limit_holds_both_isin_resolutions() {
        let sample = resolve(&BinningScheme::isin(18).unwrap()).unwrap();
        let per_bin = sample.memory_bytes() / sample.len();
        assert_eq!(per_bin, 20);

        let fine = BinningScheme::isin(4320).unwrap().total_bins() as usize;
        let coarse = BinningScheme::isin(2160).unwrap().total_bins() as usize;
        assert_eq!(fine, 23_761_676);
        assert!((fine + coarse) * per_bin <= DEFAULT_MEMORY_LIMIT);
    }

    #[test]
    fn test_same_scheme_shares_geometry() {
        let cache = GeometryCache::new(1024 * 1024);
        let scheme = BinningScheme::isin(18).unwrap();

        let a = cache.get_or_resolve(&scheme).unwrap();
        let b = cache.get_or_resolve(&scheme).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_distinct_schemes_get_distinct_entries() {
        let cache = GeometryCache::new(1024 * 1024);
        let a = cache
            .get_or_resolve(&BinningScheme::variable(vec![4, 4]).unwrap())
            .unwrap();
        let b = cache
            .get_or_resolve(&BinningScheme::fixed(2, 4).unwrap())
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_memory_bound_evicts_lru() {
        let small = BinningScheme::fixed(10, 10).unwrap();
        let per_entry = resolve(&small).unwrap().memory_bytes();
        let cache = GeometryCache::new(per_entry * 2);

        for width in 10..14 {
            cache
                .get_or_resolve(&BinningScheme::fixed(10, width).unwrap())
                .unwrap();
        }

        let stats = cache.stats();
        assert!(stats.evictions > 0);
        assert!(stats.memory_bytes as usize <= per_entry * 2);
    }

    #[test]
    fn test_oversized_geometry_is_returned_but_not_cached() {
        let cache = GeometryCache::new(16);
        let geometry = cache
            .get_or_resolve(&BinningScheme::isin(18).unwrap())
            .unwrap();
        assert!(!geometry.is_empty());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalid_scheme_is_not_cached() {
        let cache = GeometryCache::default();
        let bad = BinningScheme::Fixed {
            row_count: 0,
            row_width: 4,
        };
        assert!(cache.get_or_resolve(&bad).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = GeometryCache::default();
        cache
            .get_or_resolve(&BinningScheme::isin(18).unwrap())
            .unwrap();
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().memory_bytes, 0);
    }
}
