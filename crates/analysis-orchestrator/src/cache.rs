//! Per-orchestrator memoization of provider fetches.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;

/// Deterministic cache key: method name and arguments joined with `_`.
pub fn cache_key(method: &str, args: &[&str]) -> String {
    let mut key = method.to_string();
    for arg in args {
        key.push('_');
        key.push_str(arg);
    }
    key
}

/// Internal cache entry with timestamp
struct CacheEntry {
    data: Arc<dyn Any + Send + Sync>,
    cached_at: DateTime<Utc>,
}

/// Keyed store of fetched values, owned by one orchestrator.
///
/// A disabled store reports every key absent and ignores writes. Entries
/// live as long as the store unless a TTL is configured.
pub struct CacheStore {
    entries: DashMap<String, CacheEntry>,
    enabled: bool,
    ttl_secs: Option<u64>,
}

impl CacheStore {
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: DashMap::new(),
            enabled,
            ttl_secs: None,
        }
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Expire entries older than `ttl_secs`.
    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = Some(ttl_secs);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Cached value for `key`, if present, fresh and of type `T`.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        if !self.enabled {
            return None;
        }

        let entry = self.entries.get(key)?;
        if let Some(ttl) = self.ttl_secs {
            let age = (Utc::now() - entry.cached_at).num_seconds().max(0) as u64;
            if age >= ttl {
                return None;
            }
        }

        entry.data.clone().downcast::<T>().ok()
    }

    pub fn set<T: Any + Send + Sync>(&self, key: impl Into<String>, value: Arc<T>) {
        if !self.enabled {
            return;
        }

        let entry = CacheEntry {
            data: value,
            cached_at: Utc::now(),
        };
        self.entries.insert(key.into(), entry);
    }

    /// Number of stored entries (including expired ones).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(true)
    }
}
