//! Cache trait and error types.

use async_trait::async_trait;
use std::fmt;

/// Errors that can occur during cache operations.
#[derive(Debug)]
pub enum CacheError {
    ConnectionError(String),
    OperationError(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Cache connection error: {}", e),
            Self::OperationError(e) => write!(f, "Cache operation error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Trait for caching resolved url lookups, with tag-based bulk invalidation.
///
/// Entries are written together with the invalidation tags of the records
/// they were derived from; invalidating a tag drops every entry carrying
/// it. An entry stored with no tags expires only through the backend's own
/// time/size policy.
///
/// Implementations must be thread-safe and degrade gracefully: a failing
/// cache must never break resolution, which falls back to storage lookups.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::MemoryCache`] - Process-local cache for tests and small deployments
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[async_trait]
pub trait UrlCache: Send + Sync {
    /// Retrieves a raw cached value.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))` on cache hit
    /// - `Ok(None)` on cache miss or error (fail-open behavior)
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores a value under `key`, associated with the given invalidation
    /// tags.
    ///
    /// # Errors
    ///
    /// Should not propagate errors to callers. Implementations log failures
    /// and return `Ok(())` so a degraded cache never blocks resolution.
    async fn set(&self, key: &str, value: &str, tags: &[String]) -> CacheResult<()>;

    /// Drops every entry associated with any of the given tags.
    ///
    /// # Errors
    ///
    /// Should not propagate errors to callers.
    async fn invalidate(&self, tags: &[String]) -> CacheResult<()>;

    /// Checks whether the cache backend is healthy.
    async fn health_check(&self) -> bool;
}
