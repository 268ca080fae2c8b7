use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

use super::{ResolveError, Unit, UnitResolver};

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    /// Calls made to the underlying resolver
    pub lookup_count: u64,
    pub failure_count: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// Memoizing, single-flight front for a [`UnitResolver`].
///
/// Each identifier owns a cell; the first caller runs the lookup while
/// concurrent callers for the same identifier wait on it. Failed lookups leave
/// the cell empty so a later call tries again.
pub struct ResolverCache {
    resolver: Arc<dyn UnitResolver>,
    units: DashMap<String, Arc<OnceCell<Arc<Unit>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    lookups: AtomicU64,
    failures: AtomicU64,
}

impl ResolverCache {
    pub fn new(resolver: Arc<dyn UnitResolver>) -> Self {
        Self {
            resolver,
            units: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            lookups: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    pub async fn resolve(&self, identifier: &str) -> Result<Arc<Unit>, ResolveError> {
        // The map guard must be gone before awaiting.
        let cell = self
            .units
            .entry(identifier.to_string())
            .or_default()
            .value()
            .clone();

        if let Some(unit) = cell.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(unit.clone());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let unit = cell
            .get_or_try_init(|| async {
                self.lookups.fetch_add(1, Ordering::Relaxed);
                debug!("Resolving {}", identifier);
                match self.resolver.resolve(identifier).await {
                    Ok(unit) => Ok(Arc::new(unit)),
                    Err(e) => {
                        self.failures.fetch_add(1, Ordering::Relaxed);
                        Err(e)
                    }
                }
            })
            .await?;
        Ok(unit.clone())
    }

    /// The cached unit, without triggering a lookup
    pub fn get(&self, identifier: &str) -> Option<Arc<Unit>> {
        self.units
            .get(identifier)
            .and_then(|cell| cell.get().cloned())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.units.iter().filter(|cell| cell.initialized()).count(),
            hit_count: self.hits.load(Ordering::Relaxed),
            miss_count: self.misses.load(Ordering::Relaxed),
            lookup_count: self.lookups.load(Ordering::Relaxed),
            failure_count: self.failures.load(Ordering::Relaxed),
        }
    }
}
