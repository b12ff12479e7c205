// Copyright 2025 Cowboy AI, LLC.

//! Instance-owned bounded caches
//!
//! Each mapper owns one [`CacheManager`]; nothing here is process-wide.
//! Caches are safe to read and write from concurrent mapping calls. Entries
//! beyond a cache's capacity evict the least recently used one.

use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::errors::{MappingError, MappingResult};
use crate::types::TypeRef;

/// Cache of converter resolutions by `(source type, destination type)`
pub const CONVERTER_BY_DEST_TYPE: &str = "converter-by-dest-type";

/// Cache of supertype checks by `(supertype, subtype)`
pub const SUPER_TYPE_CHECK: &str = "super-type-check";

/// Key of a cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// An ordered pair of types
    TypePair(TypeRef, TypeRef),
}

/// Value of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheValue {
    /// Index of the resolved converter registration
    Converter(usize),
    /// No converter applies
    NoMatch,
    /// Outcome of a type relation check
    Relation(bool),
}

/// Counters of one cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups that found an entry
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Current number of entries
    pub size: usize,
    /// Configured capacity; 0 means disabled
    pub max_size: usize,
}

/// Named bounded key/value stores
pub trait CacheManager: Send + Sync {
    /// Create a named cache
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the name is already registered.
    fn register_cache(&self, name: &str, max_size: usize) -> MappingResult<()>;

    /// Look up an entry; unknown cache names miss
    fn get(&self, name: &str, key: &CacheKey) -> Option<CacheValue>;

    /// Store an entry; unknown cache names are ignored
    fn put(&self, name: &str, key: CacheKey, value: CacheValue);

    /// Counters of a named cache
    fn stats(&self, name: &str) -> Option<CacheStats>;

    /// Names of the registered caches
    fn cache_names(&self) -> Vec<String>;

    /// Drop every entry of every cache
    fn clear(&self);
}

struct BoundedCache {
    max_size: usize,
    entries: Option<Mutex<LruCache<CacheKey, CacheValue>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl BoundedCache {
    fn new(max_size: usize) -> Self {
        Self {
            max_size,
            entries: NonZeroUsize::new(max_size).map(|cap| Mutex::new(LruCache::new(cap))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn get(&self, key: &CacheKey) -> Option<CacheValue> {
        let found = self
            .entries
            .as_ref()
            .and_then(|entries| entries.lock().get(key).copied());
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    fn put(&self, key: CacheKey, value: CacheValue) {
        if let Some(entries) = &self.entries {
            entries.lock().put(key, value);
        }
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.entries.as_ref().map(|e| e.lock().len()).unwrap_or(0),
            max_size: self.max_size,
        }
    }

    fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.lock().clear();
        }
    }
}

/// [`CacheManager`] backed by LRU caches
#[derive(Default)]
pub struct LruCacheManager {
    caches: RwLock<HashMap<String, Arc<BoundedCache>>>,
}

impl LruCacheManager {
    /// Create a manager without caches
    pub fn new() -> Self {
        Self::default()
    }

    fn cache(&self, name: &str) -> Option<Arc<BoundedCache>> {
        self.caches.read().get(name).cloned()
    }
}

impl std::fmt::Debug for LruCacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCacheManager")
            .field("caches", &self.cache_names())
            .finish()
    }
}

impl CacheManager for LruCacheManager {
    fn register_cache(&self, name: &str, max_size: usize) -> MappingResult<()> {
        let mut caches = self.caches.write();
        if caches.contains_key(name) {
            return Err(MappingError::configuration(format!(
                "cache {} is already registered",
                name
            )));
        }
        caches.insert(name.to_string(), Arc::new(BoundedCache::new(max_size)));
        Ok(())
    }

    fn get(&self, name: &str, key: &CacheKey) -> Option<CacheValue> {
        self.cache(name)?.get(key)
    }

    fn put(&self, name: &str, key: CacheKey, value: CacheValue) {
        if let Some(cache) = self.cache(name) {
            cache.put(key, value);
        }
    }

    fn stats(&self, name: &str) -> Option<CacheStats> {
        self.cache(name).map(|c| c.stats())
    }

    fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn clear(&self) {
        for cache in self.caches.read().values() {
            cache.clear();
        }
    }
}
