//! Consumer-facing API over the routing services.

use std::sync::Arc;

use tracing::warn;

use crate::domain::entities::{Destination, ResolvedUrl, Url};
use crate::domain::entities::url::cache_tag_for;
use crate::domain::query::UrlQuery;
use crate::domain::repositories::UrlRepository;
use crate::error::Result;
use crate::infrastructure::cache::UrlCache;

use super::{UrlGenerator, UrlLinker, UrlPersister, UrlResolver};

/// The routing surface the rest of an application talks to.
///
/// Acts as the composition root: given concrete repository and cache
/// handles it wires the persister, linker and resolver explicitly. There
/// is no container magic; tests pass in-memory fakes instead.
pub struct UrlFacade<R: UrlRepository, C: UrlCache> {
    repository: Arc<R>,
    cache: Arc<C>,
    persister: Arc<UrlPersister<R, C>>,
    linker: Arc<UrlLinker<R, C>>,
    resolver: Arc<UrlResolver<R, C>>,
    lowercase_paths: bool,
}

impl<R: UrlRepository, C: UrlCache> UrlFacade<R, C> {
    /// Wires the service graph with path lower-casing disabled.
    pub fn new(repository: Arc<R>, cache: Arc<C>) -> Self {
        Self::with_options(repository, cache, false)
    }

    /// Wires the service graph.
    ///
    /// With `lowercase_paths` enabled, registered paths are lower-cased
    /// during normalization.
    pub fn with_options(repository: Arc<R>, cache: Arc<C>, lowercase_paths: bool) -> Self {
        let persister = Arc::new(UrlPersister::new(
            Arc::clone(&repository),
            Arc::clone(&cache),
        ));
        let linker = Arc::new(UrlLinker::new(Arc::clone(&repository), Arc::clone(&cache)));
        let resolver = Arc::new(UrlResolver::new(
            Arc::clone(&repository),
            Arc::clone(&cache),
        ));

        Self {
            repository,
            cache,
            persister,
            linker,
            resolver,
            lowercase_paths,
        }
    }

    /// Registers a new url for a destination and persists it.
    ///
    /// # Errors
    ///
    /// Returns validation failures from the path normalizer and destination
    /// parser, and [`crate::error::Error::UrlAlreadyExists`] when the
    /// normalized path is taken.
    pub async fn register(
        &self,
        path: &str,
        presenter: &str,
        action: &str,
        internal_id: Option<&str>,
    ) -> Result<Url> {
        let destination = Destination::from_parts(presenter, action)?;

        let mut url = Url::new(path, destination)?;
        if self.lowercase_paths {
            url.set_path(path, true)?;
        }
        url.set_internal_id(internal_id.map(str::to_string));

        self.save_url(&url).await
    }

    /// Persists a record built by the caller.
    pub async fn save_url(&self, url: &Url) -> Result<Url> {
        self.persister.save(url).await
    }

    /// First record matching the query.
    pub async fn get_url(&self, query: UrlQuery) -> Result<Option<Url>> {
        Ok(self.repository.find_one(query).await?)
    }

    /// Every record matching the query.
    pub async fn find_urls(&self, query: UrlQuery) -> Result<Vec<Url>> {
        Ok(self.repository.find_many(query).await?)
    }

    pub async fn get_by_path(&self, path: &str) -> Result<Option<Url>> {
        self.get_url(UrlQuery::new().by_path(path)).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Url>> {
        Ok(self.repository.find_by_id(id).await?)
    }

    /// Records serving the given destination, optionally narrowed to one
    /// internal id.
    pub async fn get_by_destination(
        &self,
        presenter: &str,
        action: &str,
        internal_id: Option<&str>,
    ) -> Result<Vec<Url>> {
        let mut query = UrlQuery::new().by_presenter(presenter).by_action(action);
        if let Some(internal_id) = internal_id {
            query = query.by_internal_id(internal_id);
        }

        self.find_urls(query).await
    }

    /// Makes `new` the canonical url for everything pointing at `old`.
    pub async fn link_urls(&self, old: &Url, new: &Url) -> Result<()> {
        self.linker.link_urls(old, new).await
    }

    /// Deletes a record. Anything still redirecting at it falls back to
    /// canonical; cache entries resolved from it are invalidated.
    pub async fn remove_by_id(&self, id: i64) -> Result<()> {
        self.repository.delete_by_id(id).await?;

        if let Err(e) = self.cache.invalidate(&[cache_tag_for(id)]).await {
            warn!("cache invalidation after removal failed: {e}");
        }

        Ok(())
    }

    /// Cache-aside path resolution; see [`UrlResolver::resolve_by_path`].
    pub async fn resolve_by_path(&self, path: &str) -> Result<Option<ResolvedUrl>> {
        self.resolver.resolve_by_path(path).await
    }

    /// Cache-aside reverse resolution; see
    /// [`UrlResolver::resolve_by_destination`].
    pub async fn resolve_by_destination(
        &self,
        presenter: &str,
        action: &str,
        internal_id: Option<&str>,
    ) -> Result<Option<ResolvedUrl>> {
        self.resolver
            .resolve_by_destination(presenter, action, internal_id)
            .await
    }

    /// Batch registration helper bound to one presenter.
    pub fn generator(&self, presenter: impl Into<String>) -> UrlGenerator<R, C> {
        UrlGenerator::new(presenter, Arc::clone(&self.persister))
    }
}
