//! Cache pool clearing.

use super::CacheError;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// A cache pool that can be emptied.
pub trait CachePool: Send + Sync {
    /// Remove every item. Returns `false` when the pool could not be cleared.
    fn clear(&self) -> bool;
}

/// Clears caches living under a cache directory.
pub trait CacheClearer: Send + Sync {
    /// Clear everything this clearer is responsible for.
    fn clear(&self, cache_dir: &Path);
}

/// Clears a set of named cache pools.
///
/// Pools keep their registration order; registering a name twice replaces
/// the pool in place.
#[derive(Default)]
pub struct PoolClearer {
    pools: Vec<(String, Arc<dyn CachePool>)>,
}

impl PoolClearer {
    /// Create a clearer over `pools`.
    pub fn new<I, S>(pools: I) -> Self
    where
        I: IntoIterator<Item = (S, Arc<dyn CachePool>)>,
        S: Into<String>,
    {
        let mut clearer = Self::default();
        for (name, pool) in pools {
            clearer.add_pool(name, pool);
        }
        clearer
    }

    /// Register a pool.
    pub fn add_pool(&mut self, name: impl Into<String>, pool: Arc<dyn CachePool>) {
        let name = name.into();
        match self.pools.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = pool,
            None => self.pools.push((name, pool)),
        }
    }

    /// Whether a pool is registered under `name`.
    pub fn has_pool(&self, name: &str) -> bool {
        self.pool(name).is_some()
    }

    /// Clear a single pool.
    pub fn clear_pool(&self, name: &str) -> Result<bool, CacheError> {
        let pool = self
            .pool(name)
            .ok_or_else(|| CacheError::PoolNotFound(name.to_string()))?;
        let cleared = pool.clear();
        tracing::info!(pool = name, cleared, "cleared cache pool");
        Ok(cleared)
    }

    /// Registered pool names, in registration order.
    pub fn pool_names(&self) -> impl Iterator<Item = &str> {
        self.pools.iter().map(|(name, _)| name.as_str())
    }

    fn pool(&self, name: &str) -> Option<&Arc<dyn CachePool>> {
        self.pools
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, pool)| pool)
    }
}

impl CacheClearer for PoolClearer {
    fn clear(&self, cache_dir: &Path) {
        tracing::info!(cache_dir = %cache_dir.display(), pools = self.pools.len(), "clearing cache pools");
        for (name, pool) in &self.pools {
            if !pool.clear() {
                tracing::warn!(pool = %name, "cache pool could not be cleared");
            }
        }
    }
}

/// An in-memory cache pool.
#[derive(Debug, Default)]
pub struct MemoryPool {
    items: Mutex<HashMap<String, Value>>,
}

impl MemoryPool {
    /// An empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an item.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Store an item.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the pool holds no item.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CachePool for MemoryPool {
    fn clear(&self) -> bool {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        true
    }
}
