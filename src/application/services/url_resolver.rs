//! Cache-aside resolution of paths and destinations.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{error, warn};

use crate::domain::entities::{ResolvedUrl, Url};
use crate::domain::query::UrlQuery;
use crate::domain::repositories::UrlRepository;
use crate::error::{Error, Result};
use crate::infrastructure::cache::UrlCache;

/// Namespace prefix of every resolver cache key.
const CACHE_NAMESPACE: &str = "routing/";

/// Resolves url paths to destinations and destinations back to paths.
///
/// Lookups are cache-aside: the cache is consulted first and populated from
/// storage on a miss, each entry tagged with the identity of the record it
/// was resolved from. The resolver never invalidates — it only consumes
/// tags written by the persister and linker.
///
/// A looked-up record may have been superseded; the redirect chain is
/// followed to its canonical end before the result is handed out.
pub struct UrlResolver<R: UrlRepository, C: UrlCache> {
    repository: Arc<R>,
    cache: Arc<C>,
}

impl<R: UrlRepository, C: UrlCache> UrlResolver<R, C> {
    /// Creates a new resolver over the given collaborators.
    pub fn new(repository: Arc<R>, cache: Arc<C>) -> Self {
        Self { repository, cache }
    }

    /// Resolves a normalized path to its destination descriptor.
    ///
    /// Returns `Ok(None)` when no record matches; that outcome is cached as
    /// a bare miss carrying no invalidation tag, so it only expires through
    /// the cache's own policy.
    ///
    /// # Errors
    ///
    /// Passes storage failures through; returns [`Error::RedirectLoop`] on
    /// a cyclic chain.
    pub async fn resolve_by_path(&self, path: &str) -> Result<Option<ResolvedUrl>> {
        let cache_key = format!("{CACHE_NAMESPACE}{path}");

        if let Some(cached) = self.load_cached(&cache_key).await {
            return match cached {
                Some(url) => Ok(Some(self.convert(path, url).await?)),
                None => Ok(None),
            };
        }

        let found = self
            .repository
            .find_one(UrlQuery::new().by_path(path).with_redirect_target())
            .await?;

        if found.is_none() {
            error!("page not found, url path: {path:?}");
        }

        self.store(&cache_key, &found).await;

        match found {
            Some(url) => Ok(Some(self.convert(path, url).await?)),
            None => Ok(None),
        }
    }

    /// Resolves a destination back to the path serving it.
    ///
    /// Without `internal_id` any record with the presenter/action pair
    /// matches and the first one in storage-native order wins. Cached under
    /// the composite key `presenter:action:internal_id`, the internal id
    /// rendered empty when absent.
    ///
    /// # Errors
    ///
    /// Same contract as [`UrlResolver::resolve_by_path`].
    pub async fn resolve_by_destination(
        &self,
        presenter: &str,
        action: &str,
        internal_id: Option<&str>,
    ) -> Result<Option<ResolvedUrl>> {
        let cache_key = format!(
            "{CACHE_NAMESPACE}{presenter}:{action}:{}",
            internal_id.unwrap_or_default()
        );

        if let Some(cached) = self.load_cached(&cache_key).await {
            return match cached {
                Some(url) => {
                    let origin = url.path().to_string();
                    Ok(Some(self.convert(&origin, url).await?))
                }
                None => Ok(None),
            };
        }

        let mut query = UrlQuery::new()
            .by_presenter(presenter)
            .by_action(action)
            .with_redirect_target();
        if let Some(internal_id) = internal_id {
            query = query.by_internal_id(internal_id);
        }

        let found = self.repository.find_one(query).await?;

        if found.is_none() {
            warn!(
                "no route found, presenter: {presenter}, action: {action}, internal id: {internal_id:?}"
            );
        }

        self.store(&cache_key, &found).await;

        match found {
            Some(url) => {
                let origin = url.path().to_string();
                Ok(Some(self.convert(&origin, url).await?))
            }
            None => Ok(None),
        }
    }

    /// Cached lookup outcome: `None` on miss, `Some(None)` for a cached
    /// negative result. Undecodable entries degrade to a miss.
    async fn load_cached(&self, key: &str) -> Option<Option<Url>> {
        let raw = self.cache.get(key).await.ok().flatten()?;

        match serde_json::from_str::<Option<Url>>(&raw) {
            Ok(cached) => Some(cached),
            Err(e) => {
                warn!("discarding undecodable cache entry {key}: {e}");
                None
            }
        }
    }

    /// Populates the cache with a lookup outcome, tagging hits with the
    /// record's identity. Misses are stored untagged: with no record there
    /// is no identity tag to tie the entry to.
    async fn store(&self, key: &str, found: &Option<Url>) {
        let tags = found
            .as_ref()
            .and_then(|url| url.cache_tag())
            .map_or_else(Vec::new, |tag| vec![tag]);

        match serde_json::to_string(found) {
            Ok(payload) => {
                if let Err(e) = self.cache.set(key, &payload, &tags).await {
                    warn!("cache population for {key} failed: {e}");
                }
            }
            Err(e) => warn!("failed to serialize cache entry {key}: {e}"),
        }
    }

    /// Walks stored redirect links to the canonical record and produces the
    /// immutable descriptor. The first hop is usually eagerly loaded;
    /// deeper hops are fetched by identifier. A visited set stops chains
    /// that storage corruption turned cyclic.
    async fn convert(&self, origin_path: &str, url: Url) -> Result<ResolvedUrl> {
        let mut visited: HashSet<i64> = HashSet::new();
        let mut current = url;

        loop {
            if let Some(id) = current.id() {
                if !visited.insert(id) {
                    error!("redirect loop detected at url id {id}");
                    return Err(Error::RedirectLoop { id });
                }
            }

            let Some(next_id) = current.redirect_to_id() else {
                return Ok(ResolvedUrl::from_canonical(origin_path, &current));
            };

            current = match current.take_redirect_to() {
                Some(target) => *target,
                None => match self.repository.find_by_id(next_id).await? {
                    Some(target) => target,
                    None => {
                        // The target row vanished under us; treat this
                        // record as the end of the chain.
                        warn!(
                            "dangling redirect target {next_id} from url {:?}",
                            current.path()
                        );
                        return Ok(ResolvedUrl::from_canonical(origin_path, &current));
                    }
                },
            };
        }
    }
}
