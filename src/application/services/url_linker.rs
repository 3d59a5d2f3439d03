//! Redirect-chain maintenance.

use std::sync::Arc;

use tracing::warn;

use crate::domain::entities::Url;
use crate::domain::entities::url::cache_tag_for;
use crate::domain::repositories::{UrlRepository, UrlTransaction};
use crate::error::{Error, Result};
use crate::infrastructure::cache::UrlCache;

/// Re-points redirect chains when a url's canonical role moves.
///
/// All records already redirecting at the superseded url are rewritten, not
/// just the immediate one, so the stored graph stays flat: after a relink
/// no record is more than one hop away from its predecessor's new target.
/// Reads still walk the chain because the new canonical url may itself be
/// superseded later.
pub struct UrlLinker<R: UrlRepository, C: UrlCache> {
    repository: Arc<R>,
    cache: Arc<C>,
}

impl<R: UrlRepository, C: UrlCache> UrlLinker<R, C> {
    /// Creates a new linker over the given collaborators.
    pub fn new(repository: Arc<R>, cache: Arc<C>) -> Self {
        Self { repository, cache }
    }

    /// Makes `new` the canonical url for everything that pointed at `old`,
    /// including `old` itself, in one unit of work.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UrlNotPersisted`] when either record lacks an
    /// identifier. Storage failures roll the transaction back, reset the
    /// session, and propagate unchanged.
    pub async fn link_urls(&self, old: &Url, new: &Url) -> Result<()> {
        let (Some(old_id), Some(new_id)) = (old.id(), new.id()) else {
            return Err(Error::UrlNotPersisted);
        };

        let mut tx = self.repository.begin().await?;

        let tags = match Self::repoint(tx.as_mut(), old_id, new_id).await {
            Ok(tags) => tags,
            Err(e) => {
                Self::close_session(tx.as_mut()).await;
                return Err(e);
            }
        };

        tx.commit().await?;

        // Invalidation runs post-commit: a brief window where storage is
        // ahead of the cache is accepted, the reverse would serve dropped
        // state.
        if let Err(e) = self.cache.invalidate(&tags).await {
            warn!("cache invalidation after relink failed: {e}");
        }

        Ok(())
    }

    /// Rewrites every chain member inside the open transaction, collecting
    /// the identity tags of all changed records.
    async fn repoint(
        tx: &mut dyn UrlTransaction,
        old_id: i64,
        new_id: i64,
    ) -> Result<Vec<String>> {
        let already_redirected = tx.find_redirecting_to(old_id).await?;

        let mut tags = Vec::with_capacity(already_redirected.len() + 1);
        for url in &already_redirected {
            if let Some(id) = url.id() {
                tx.set_redirect_target(id, new_id).await?;
            }
            if let Some(tag) = url.cache_tag() {
                tags.push(tag);
            }
        }

        tx.set_redirect_target(old_id, new_id).await?;
        tags.push(cache_tag_for(old_id));

        Ok(tags)
    }

    async fn close_session(tx: &mut dyn UrlTransaction) {
        if let Err(e) = tx.rollback().await {
            warn!("session reset after failed relink also failed: {e}");
        }
    }
}
