//! Process-local cache implementation.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use super::service::{CacheError, CacheResult, UrlCache};

/// An in-memory cache with a tag index.
///
/// Holds entries for the lifetime of the process with no time-based expiry,
/// which makes it a faithful stand-in for tests exercising tag
/// invalidation, and a reasonable default for single-node deployments
/// without Redis. Untagged entries (negative lookups) stay until the
/// process ends.
#[derive(Debug, Default)]
pub struct MemoryCache {
    inner: Mutex<MemoryCacheState>,
}

#[derive(Debug, Default)]
struct MemoryCacheState {
    entries: HashMap<String, String>,
    /// tag → keys carrying it
    tags: HashMap<String, HashSet<String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> CacheResult<std::sync::MutexGuard<'_, MemoryCacheState>> {
        self.inner
            .lock()
            .map_err(|_| CacheError::OperationError("cache mutex poisoned".to_string()))
    }
}

#[async_trait]
impl UrlCache for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.state()?.entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, tags: &[String]) -> CacheResult<()> {
        let mut state = self.state()?;
        state.entries.insert(key.to_string(), value.to_string());
        for tag in tags {
            state
                .tags
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
        Ok(())
    }

    async fn invalidate(&self, tags: &[String]) -> CacheResult<()> {
        let mut state = self.state()?;
        for tag in tags {
            if let Some(keys) = state.tags.remove(tag) {
                debug!("Cache INVALIDATE: tag {} ({} entries)", tag, keys.len());
                for key in keys {
                    state.entries.remove(&key);
                }
            }
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
