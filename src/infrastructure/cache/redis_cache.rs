//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, UrlCache};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, error, info, warn};

/// Redis cache for resolved url lookups.
///
/// Uses connection pooling via `ConnectionManager` for efficient connection
/// reuse. Tags are materialized as Redis sets holding the keys they cover,
/// so invalidating a tag drops every entry derived from the same record.
/// All operations are fail-open: errors are logged but don't propagate to
/// callers.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: u64,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis, validates the connection with a PING, and
    /// configures the entry TTL.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379"`)
    /// - `default_ttl_seconds` - TTL applied to cached entries and their tag
    ///   sets; controlled via `CACHE_TTL_SECONDS` env var
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the
    /// connection cannot be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        info!("Connecting to Redis at {}", redis_url);

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            client: manager,
            default_ttl: default_ttl_seconds,
            key_prefix: "routing:".to_string(),
        })
    }

    /// Constructs the full Redis key with namespace prefix.
    fn build_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    /// Constructs the Redis key of a tag's member set.
    fn build_tag_key(&self, tag: &str) -> String {
        format!("{}tag:{}", self.key_prefix, tag)
    }
}

#[async_trait]
impl UrlCache for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let full_key = self.build_key(key);
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&full_key).await {
            Ok(Some(value)) => {
                debug!("Cache HIT: {}", key);
                Ok(Some(value))
            }
            Ok(None) => {
                debug!("Cache MISS: {}", key);
                Ok(None)
            }
            Err(e) => {
                error!("Redis GET error for {}: {}", key, e);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &str, tags: &[String]) -> CacheResult<()> {
        let full_key = self.build_key(key);
        let mut conn = self.client.clone();

        if let Err(e) = conn
            .set_ex::<_, _, ()>(&full_key, value, self.default_ttl)
            .await
        {
            warn!("Redis SET error for {}: {}", key, e);
            return Ok(());
        }

        // Tag sets expire with the entries they index.
        for tag in tags {
            let tag_key = self.build_tag_key(tag);
            if let Err(e) = conn.sadd::<_, _, ()>(&tag_key, &full_key).await {
                warn!("Redis SADD error for tag {}: {}", tag, e);
                continue;
            }
            if let Err(e) = conn.expire::<_, ()>(&tag_key, self.default_ttl as i64).await {
                warn!("Redis EXPIRE error for tag {}: {}", tag, e);
            }
        }

        debug!("Cache SET: {} (tags: {:?}, TTL: {}s)", key, tags, self.default_ttl);
        Ok(())
    }

    async fn invalidate(&self, tags: &[String]) -> CacheResult<()> {
        let mut conn = self.client.clone();

        for tag in tags {
            let tag_key = self.build_tag_key(tag);

            let members = match conn.smembers::<_, Vec<String>>(&tag_key).await {
                Ok(members) => members,
                Err(e) => {
                    warn!("Redis SMEMBERS error for tag {}: {}", tag, e);
                    continue;
                }
            };

            if !members.is_empty() {
                if let Err(e) = conn.del::<_, ()>(&members).await {
                    warn!("Redis DEL error for tag {}: {}", tag, e);
                    continue;
                }
                debug!("Cache INVALIDATE: tag {} ({} entries)", tag, members.len());
            }

            if let Err(e) = conn.del::<_, ()>(&tag_key).await {
                warn!("Redis DEL error for tag set {}: {}", tag, e);
            }
        }

        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
