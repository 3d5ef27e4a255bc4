//! Text-keyed cache of compiled filters.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use lru::LruCache;
use parking_lot::Mutex;

use crate::{
    binder,
    config::Limits,
    descriptor::Entity,
    entity_filter::EntityFilterCriteria,
    error::Error,
};

pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    /// Distinct filters held
    pub size: usize,
    /// Spellings that map onto a held filter
    pub aliases: usize,
}

struct Entries<T> {
    /// Raw text as requested → canonical text
    aliases: LruCache<String, String>,
    /// Canonical text → shared filter
    filters: LruCache<String, Arc<EntityFilterCriteria<T>>>,
}

/// Filters over `T` by text, shared across threads.
///
/// Lookups go by the exact text first and then by canonical text, so
/// `Age>30` and `Age > 30` resolve to one instance that compiles its closure
/// once. Filters and spellings are each held up to the capacity, least
/// recently used first out.
pub struct PredicateCache<T> {
    entries: Mutex<Entries<T>>,
    limits: Limits,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<T: Entity> Default for PredicateCache<T> {
    fn default() -> Self {
        PredicateCache::with_limits(Limits::default(), DEFAULT_CAPACITY)
    }
}

impl<T: Entity> PredicateCache<T> {
    pub fn new() -> Self {
        PredicateCache::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        PredicateCache::with_limits(Limits::default(), capacity)
    }

    /// A capacity of zero is treated as one.
    pub fn with_limits(limits: Limits, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        PredicateCache {
            entries: Mutex::new(Entries {
                aliases: LruCache::new(capacity),
                filters: LruCache::new(capacity),
            }),
            limits,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn get_or_parse(&self, text: &str) -> Result<Arc<EntityFilterCriteria<T>>, Error> {
        {
            let mut guard = self.entries.lock();
            let entries = &mut *guard;
            if let Some(canonical) = entries.aliases.get(text) {
                if let Some(found) = entries.filters.get(canonical) {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!(entity = T::entity_name(), filter = text, "filter cache hit");
                    return Ok(Arc::clone(found));
                }
            }
        }

        // Parsing happens outside the lock; a racing thread may parse the same
        // text, but only the first insert is kept.
        let predicate = binder::bind_text_with::<T>(text, &self.limits)?;
        let canonical = predicate.to_string();

        let mut entries = self.entries.lock();
        if let Some(found) = entries.filters.get(&canonical).map(Arc::clone) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            entries.aliases.put(text.to_string(), canonical);
            return Ok(found);
        }

        let filter = Arc::new(EntityFilterCriteria::new(predicate)?);
        self.misses.fetch_add(1, Ordering::Relaxed);
        entries.filters.put(canonical.clone(), Arc::clone(&filter));
        entries.aliases.put(text.to_string(), canonical);
        Ok(filter)
    }

    /// Number of distinct filters held.
    pub fn len(&self) -> usize {
        self.entries.lock().filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().filters.cap().get()
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        entries.aliases.clear();
        entries.filters.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    // Relaxed counters; they are diagnostics only
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: entries.filters.len(),
            aliases: entries.aliases.len(),
        }
    }
}

impl<T> fmt::Debug for PredicateCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.lock();
        f.debug_struct("PredicateCache")
            .field("filters", &entries.filters.len())
            .field("aliases", &entries.aliases.len())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}
