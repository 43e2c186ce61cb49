//! The key-value cache contract consumed by [`crate::CachedExporter`]. The
//! cache service itself lives outside this crate; only its wire contract is
//! defined here. `InMemoryCache` and `NoopCache` exist so the exporter is
//! exercisable without a real backend.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a cache write.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache write failed: {0}")]
    Failed(String),
}

/// A key-value cache with TTL-based expiry, as required by the cache
/// summary export.
#[async_trait]
pub trait CacheClient: Send + Sync {
    async fn set(&self, key: String, value: String, ttl: Duration) -> Result<(), CacheError>;
}

/// Discards every write. Useful when cache export is configured but no
/// backend is wired up yet.
#[derive(Debug, Default)]
pub struct NoopCache;

#[async_trait]
impl CacheClient for NoopCache {
    async fn set(&self, _key: String, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }
}

/// An in-process cache, mainly for tests and local demos. Entries are not
/// actually evicted on TTL expiry; the TTL is recorded but not enforced,
/// since nothing in this crate reads expired entries back.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, (String, Duration)>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let Ok(entries) = self.entries.lock() else {
            tracing::warn!("in-memory cache lock poisoned, returning no entry");
            return None;
        };
        entries.get(key).map(|(value, _)| value.clone())
    }
}

#[async_trait]
impl CacheClient for InMemoryCache {
    async fn set(&self, key: String, value: String, ttl: Duration) -> Result<(), CacheError> {
        let Ok(mut entries) = self.entries.lock() else {
            return Err(CacheError::Failed("cache lock poisoned".to_string()));
        };
        entries.insert(key, (value, ttl));
        Ok(())
    }
}
