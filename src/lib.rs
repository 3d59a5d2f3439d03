//! # URL Resolver
//!
//! Database-backed URL routing: resolves human-readable paths to internal
//! application destinations (and back), with a cache-aside layer and
//! redirect-chain maintenance for renamed urls.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Url record, destination grammar, query
//!   builder and storage traits
//! - **Application Layer** ([`application`]) - Persister, redirect linker,
//!   cache-aside resolver and the consumer-facing facade
//! - **Infrastructure Layer** ([`infrastructure`]) - PostgreSQL and
//!   in-memory storage, Redis/in-memory/no-op caches
//!
//! ## Quick start
//!
//! ```ignore
//! let pool = Arc::new(PgPool::connect(&config.database_url).await?);
//! let repository = Arc::new(PgUrlRepository::new(pool));
//! let cache = Arc::new(RedisCache::connect(&redis_url, config.cache_ttl_seconds).await?);
//!
//! let facade = UrlFacade::new(repository, cache);
//!
//! let old = facade.register("old-page", "Article", "view", Some("42")).await?;
//! let new = facade.register("new-page", "Article", "view", Some("42")).await?;
//! facade.link_urls(&old, &new).await?;
//!
//! // Resolves through the redirect chain to `new-page`'s destination.
//! let resolved = facade.resolve_by_path("old-page").await?;
//! ```
//!
//! ## Semantics worth knowing
//!
//! - Mutations run inside one storage transaction; cache tags are
//!   invalidated after commit.
//! - Concurrent creates of the same path race at the database's unique
//!   constraint; exactly one wins, the loser gets
//!   [`Error::UrlAlreadyExists`].
//! - Not-found resolutions are cached without an invalidation tag and only
//!   expire by cache policy.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod utils;

pub use error::Error;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{
        UrlFacade, UrlGenerator, UrlLinker, UrlPersister, UrlResolver,
    };
    pub use crate::config::Config;
    pub use crate::domain::entities::{Destination, ResolvedUrl, Url};
    pub use crate::domain::query::UrlQuery;
    pub use crate::domain::repositories::{StorageError, UrlRepository, UrlTransaction};
    pub use crate::error::Error;
    pub use crate::infrastructure::cache::{MemoryCache, NullCache, RedisCache, UrlCache};
    pub use crate::infrastructure::persistence::{MemoryUrlRepository, PgUrlRepository};
}
