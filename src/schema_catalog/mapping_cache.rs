//! Mapping cache module for sharing built table mappings
//!
//! A [`TableMapping`] is immutable once built, so library callers that map the
//! same type repeatedly can keep one `Arc<TableMapping>` per (type, creation
//! flags) pair instead of re-running the schema mapper.
//!
//! # Architecture
//!
//! Cache Key: (type_name, create_flags)
//! Cache Value: `Arc<TableMapping>`
//!
//! Each cache owns the [`SchemaMapper`] it builds with, so every entry comes from
//! the same catalog, registry and naming config. The mapper borrows the catalog
//! and registry, which therefore cannot change while the cache is alive; a new
//! catalog or new bindings mean a new cache.
//!
//! Entries are evicted least-recently-used first once `max_entries` is reached.
//!
//! # Configuration
//!
//! Environment variables:
//! - `ROWMAP_MAPPING_CACHE_ENABLED` (default: true)
//! - `ROWMAP_MAPPING_CACHE_MAX_ENTRIES` (default: 256)
use log::debug;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::errors::SchemaError;
use super::table_mapping::{CreateFlags, SchemaMapper, TableMapping};

/// Key for cache lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MappingCacheKey {
    pub type_name: String,
    pub flags: CreateFlags,
}

impl MappingCacheKey {
    pub fn new(type_name: &str, flags: CreateFlags) -> Self {
        MappingCacheKey {
            type_name: type_name.to_string(),
            flags,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    mapping: Arc<TableMapping>,
    /// Logical access tick, for LRU
    last_accessed: u64,
}

/// Configuration for the mapping cache
#[derive(Debug, Clone)]
pub struct MappingCacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for MappingCacheConfig {
    fn default() -> Self {
        MappingCacheConfig {
            enabled: true,
            max_entries: 256,
        }
    }
}

impl MappingCacheConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let enabled = std::env::var("ROWMAP_MAPPING_CACHE_ENABLED")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(true);

        let max_entries = std::env::var("ROWMAP_MAPPING_CACHE_MAX_ENTRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(256);

        MappingCacheConfig {
            enabled,
            max_entries,
        }
    }
}

/// Thread-safe cache of the mappings one [`SchemaMapper`] builds
pub struct MappingCache<'a> {
    mapper: SchemaMapper<'a>,
    cache: Arc<Mutex<HashMap<MappingCacheKey, CacheEntry>>>,
    config: MappingCacheConfig,
    clock: AtomicU64,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    evictions: Arc<AtomicU64>,
}

impl<'a> MappingCache<'a> {
    pub fn new(mapper: SchemaMapper<'a>, config: MappingCacheConfig) -> Self {
        MappingCache {
            mapper,
            cache: Arc::new(Mutex::new(HashMap::new())),
            config,
            clock: AtomicU64::new(0),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            evictions: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_defaults(mapper: SchemaMapper<'a>) -> Self {
        Self::new(mapper, MappingCacheConfig::default())
    }

    pub fn from_env(mapper: SchemaMapper<'a>) -> Self {
        Self::new(mapper, MappingCacheConfig::from_env())
    }

    pub fn mapper(&self) -> &SchemaMapper<'a> {
        &self.mapper
    }

    // Entries are inserted whole, so a poisoned map is still consistent
    fn lock(&self) -> MutexGuard<'_, HashMap<MappingCacheKey, CacheEntry>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the cached mapping, if any
    pub fn get(&self, key: &MappingCacheKey) -> Option<Arc<TableMapping>> {
        if !self.config.enabled {
            return None;
        }

        let now = self.tick();
        let mut cache = self.lock();
        if let Some(entry) = cache.get_mut(key) {
            entry.last_accessed = now;
            self.hits.fetch_add(1, Ordering::Relaxed);
            Some(Arc::clone(&entry.mapping))
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Insert a mapping, evicting the least recently used entry when full
    pub fn insert(&self, key: MappingCacheKey, mapping: Arc<TableMapping>) {
        if !self.config.enabled || self.config.max_entries == 0 {
            return;
        }

        let entry = CacheEntry {
            mapping,
            last_accessed: self.tick(),
        };

        let mut cache = self.lock();
        if !cache.contains_key(&key) && cache.len() >= self.config.max_entries {
            self.evict_lru(&mut cache);
        }
        cache.insert(key, entry);
    }

    /// Cached mapping for `type_name`, building it on a miss.
    ///
    /// The build runs outside the lock; concurrent misses for the same key may
    /// both build, which is harmless because building is deterministic.
    pub fn get_or_build(
        &self,
        type_name: &str,
        flags: CreateFlags,
    ) -> Result<Arc<TableMapping>, SchemaError> {
        let key = MappingCacheKey::new(type_name, flags);
        if let Some(mapping) = self.get(&key) {
            return Ok(mapping);
        }

        debug!("Mapping cache miss for {} ({})", type_name, flags);
        let mapping = Arc::new(self.mapper.build_mapping(type_name, flags)?);
        self.insert(key, Arc::clone(&mapping));
        Ok(mapping)
    }

    fn evict_lru(&self, cache: &mut HashMap<MappingCacheKey, CacheEntry>) {
        if let Some((key, _)) = cache.iter().min_by_key(|(_, entry)| entry.last_accessed) {
            let key = key.clone();
            cache.remove(&key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Drop every mapping of `type_name`, whatever its flags
    pub fn invalidate_type(&self, type_name: &str) {
        let mut cache = self.lock();
        cache.retain(|key, _| key.type_name != type_name);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn metrics(&self) -> CacheMetrics {
        let cache = self.lock();
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            size: cache.len(),
            max_entries: self.config.max_entries,
        }
    }
}

/// Cache metrics for monitoring
#[derive(Debug, Clone)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
    pub max_entries: usize,
}

impl CacheMetrics {
    /// Calculate cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Calculate entry utilization (0.0 to 1.0)
    pub fn entry_utilization(&self) -> f64 {
        if self.max_entries == 0 {
            0.0
        } else {
            self.size as f64 / self.max_entries as f64
        }
    }
}
