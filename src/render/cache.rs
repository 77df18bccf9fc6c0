//! Render Cache
//!
//! Memoized rendering results for the revision a [`PageRenderer`] is bound
//! to. Display and publish results are cached independently, as are the
//! name sets derived from them. Export output is never stored.
//!
//! Every slot is tagged with the epoch it was computed under. Rebinding the
//! renderer bumps the epoch, which empties all slots at once; a value
//! computed under an older epoch is discarded instead of stored.
//!
//! [`PageRenderer`]: super::PageRenderer

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::markup::RenderingResult;
use crate::types::{RenderMode, Result, WikiError};

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
}

/// Derived name sets memoized apart from the HTML they come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSet {
    WikiWords,
    Includes,
    References,
}

struct Slot<T> {
    value: RwLock<Option<(u64, Arc<T>)>>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            value: RwLock::new(None),
        }
    }

    fn get(&self, epoch: u64) -> Result<Option<Arc<T>>> {
        let guard = self
            .value
            .read()
            .map_err(|_| WikiError::Storage("Render cache lock poisoned".to_string()))?;
        Ok(match guard.as_ref() {
            Some((tag, value)) if *tag == epoch => Some(Arc::clone(value)),
            _ => None,
        })
    }

    /// Store `value` unless another writer got there first under the same
    /// epoch; returns whichever value ends up in the slot.
    fn set(&self, epoch: u64, value: Arc<T>) -> Result<Arc<T>> {
        let mut guard = self
            .value
            .write()
            .map_err(|_| WikiError::Storage("Render cache lock poisoned".to_string()))?;
        if let Some((tag, existing)) = guard.as_ref()
            && *tag == epoch
        {
            return Ok(Arc::clone(existing));
        }
        *guard = Some((epoch, Arc::clone(&value)));
        Ok(value)
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.value.write() {
            *guard = None;
        }
    }
}

pub struct RenderCache {
    enabled: bool,
    epoch: AtomicU64,
    display: Slot<RenderingResult>,
    publish: Slot<RenderingResult>,
    wiki_words: Slot<Vec<String>>,
    includes: Slot<Vec<String>>,
    references: Slot<Vec<String>>,
    stats: RwLock<CacheStats>,
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl std::fmt::Debug for RenderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderCache")
            .field("enabled", &self.enabled)
            .field("epoch", &self.epoch.load(Ordering::Acquire))
            .field("stats", &self.stats())
            .finish()
    }
}

impl RenderCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            epoch: AtomicU64::new(0),
            display: Slot::new(),
            publish: Slot::new(),
            wiki_words: Slot::new(),
            includes: Slot::new(),
            references: Slot::new(),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    /// Cached result for `mode`, computing it on a miss.
    ///
    /// Export results are computed on every call.
    pub fn rendering<F>(&self, mode: RenderMode, compute: F) -> Result<Arc<RenderingResult>>
    where
        F: FnOnce() -> Result<RenderingResult>,
    {
        if !mode.is_cacheable() {
            return compute().map(Arc::new);
        }
        let slot = match mode {
            RenderMode::Publish => &self.publish,
            RenderMode::Display | RenderMode::Export => &self.display,
        };
        self.get_or_compute(slot, mode, || compute().map(Arc::new))
    }

    /// Cached name set, computing it on a miss
    pub fn names<F>(&self, set: NameSet, compute: F) -> Result<Arc<Vec<String>>>
    where
        F: FnOnce() -> Result<Vec<String>>,
    {
        let slot = match set {
            NameSet::WikiWords => &self.wiki_words,
            NameSet::Includes => &self.includes,
            NameSet::References => &self.references,
        };
        self.get_or_compute(slot, set, || compute().map(Arc::new))
    }

    fn get_or_compute<T, K, F>(&self, slot: &Slot<T>, key: K, compute: F) -> Result<Arc<T>>
    where
        K: std::fmt::Debug,
        F: FnOnce() -> Result<Arc<T>>,
    {
        if !self.enabled {
            return compute();
        }

        let epoch = self.epoch.load(Ordering::Acquire);
        if let Some(value) = slot.get(epoch)? {
            self.record(|stats| stats.hits += 1);
            tracing::debug!(?key, epoch, "Render cache hit");
            return Ok(value);
        }

        self.record(|stats| stats.misses += 1);
        tracing::debug!(?key, epoch, "Render cache miss");
        let value = compute()?;

        // Rebound while computing: hand the value out but do not keep it
        if self.epoch.load(Ordering::Acquire) != epoch {
            return Ok(value);
        }
        slot.set(epoch, value)
    }

    /// Drop every slot
    pub fn invalidate(&self) {
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        self.display.clear();
        self.publish.clear();
        self.wiki_words.clear();
        self.includes.clear();
        self.references.clear();
        self.record(|stats| stats.invalidations += 1);
        tracing::debug!(epoch, "Render cache invalidated");
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
            .read()
            .map(|stats| stats.clone())
            .unwrap_or_default()
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        if let Ok(mut stats) = self.stats.write() {
            update(&mut stats);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::types::RevisionId;

    fn result(html: &str, mode: RenderMode) -> RenderingResult {
        RenderingResult::new(html, Vec::new(), mode, RevisionId::new(1))
    }

    #[test]
    fn test_display_is_memoized() {
        let cache = RenderCache::default();
        let calls = Cell::new(0);
        let render = || {
            calls.set(calls.get() + 1);
            Ok(result("<p>a</p>", RenderMode::Display))
        };

        let first = cache.rendering(RenderMode::Display, render).unwrap();
        let second = cache.rendering(RenderMode::Display, render).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.get(), 1);
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                invalidations: 0
            }
        );
    }

    #[test]
    fn test_display_and_publish_are_independent() {
        let cache = RenderCache::default();
        let display = cache
            .rendering(RenderMode::Display, || Ok(result("d", RenderMode::Display)))
            .unwrap();
        let publish = cache
            .rendering(RenderMode::Publish, || Ok(result("p", RenderMode::Publish)))
            .unwrap();

        assert_eq!(display.html(), "d");
        assert_eq!(publish.html(), "p");
    }

    #[test]
    fn test_export_is_never_stored() {
        let cache = RenderCache::default();
        let calls = Cell::new(0);
        for _ in 0..3 {
            cache
                .rendering(RenderMode::Export, || {
                    calls.set(calls.get() + 1);
                    Ok(result("e", RenderMode::Export))
                })
                .unwrap();
        }
        assert_eq!(calls.get(), 3);
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_invalidate_clears_every_slot() {
        let cache = RenderCache::default();
        cache
            .rendering(RenderMode::Display, || Ok(result("old", RenderMode::Display)))
            .unwrap();
        cache
            .names(NameSet::WikiWords, || Ok(vec!["OldPage".to_string()]))
            .unwrap();

        cache.invalidate();

        let display = cache
            .rendering(RenderMode::Display, || Ok(result("new", RenderMode::Display)))
            .unwrap();
        let words = cache
            .names(NameSet::WikiWords, || Ok(vec!["NewPage".to_string()]))
            .unwrap();
        assert_eq!(display.html(), "new");
        assert_eq!(words.as_slice(), ["NewPage".to_string()]);
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = RenderCache::default();
        let failed = cache.names(NameSet::Includes, || {
            Err(WikiError::Storage("boom".to_string()))
        });
        assert!(failed.is_err());

        let names = cache.names(NameSet::Includes, || Ok(Vec::new())).unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn test_concurrent_callers_share_one_result() {
        let cache = RenderCache::default();
        let barrier = std::sync::Barrier::new(8);

        let results: Vec<Arc<RenderingResult>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        cache
                            .rendering(RenderMode::Display, || {
                                Ok(result("<p>shared</p>", RenderMode::Display))
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
        let stats = cache.stats();
        assert_eq!(stats.hits + stats.misses, 8);
        assert!(stats.misses >= 1);
    }

    #[test]
    fn test_disabled_cache_always_computes() {
        let cache = RenderCache::new(false);
        let calls = Cell::new(0);
        for _ in 0..2 {
            cache
                .rendering(RenderMode::Display, || {
                    calls.set(calls.get() + 1);
                    Ok(result("d", RenderMode::Display))
                })
                .unwrap();
        }
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
