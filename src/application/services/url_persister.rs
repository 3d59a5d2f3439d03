//! Transactional persistence of url records.

use std::sync::Arc;

use tracing::{error, warn};

use crate::domain::entities::Url;
use crate::domain::repositories::{StorageError, UrlRepository, UrlTransaction};
use crate::error::{Error, Result};
use crate::infrastructure::cache::UrlCache;

/// Saves url records inside a single unit of work.
///
/// Whether a save inserts or flushes is decided by the presence of the
/// record's identifier. Any failure rolls the transaction back and resets
/// the session before the error propagates; a session that failed a save is
/// never left reusable.
pub struct UrlPersister<R: UrlRepository, C: UrlCache> {
    repository: Arc<R>,
    cache: Arc<C>,
}

impl<R: UrlRepository, C: UrlCache> UrlPersister<R, C> {
    /// Creates a new persister over the given collaborators.
    pub fn new(repository: Arc<R>, cache: Arc<C>) -> Self {
        Self { repository, cache }
    }

    /// Saves the record, returning it with its storage identity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UrlAlreadyExists`] when a create hits the unique
    /// path constraint (the transaction has been rolled back by then) and
    /// passes storage failures through unchanged after rollback. No retry
    /// is performed here; retrying is caller policy.
    pub async fn save(&self, url: &Url) -> Result<Url> {
        let is_update = url.id().is_some();
        let mut tx = self.repository.begin().await?;

        let staged = if is_update {
            Self::update(tx.as_mut(), url).await
        } else {
            Self::create(tx.as_mut(), url).await
        };

        let saved = match staged {
            Ok(saved) => saved,
            Err(e) => {
                Self::close_session(tx.as_mut()).await;
                match &e {
                    Error::UrlAlreadyExists { path } => {
                        error!("url path already exists: {path:?}");
                    }
                    _ => error!("url record saving failure: {e}"),
                }
                return Err(e);
            }
        };

        if let Err(e) = tx.commit().await {
            error!("url record saving failure: {e}");
            return Err(e.into());
        }

        // A flushed record may be cached from earlier resolutions;
        // invalidation runs post-commit. Freshly created records have no
        // tagged entries yet.
        if is_update {
            if let Some(tag) = saved.cache_tag() {
                if let Err(e) = self.cache.invalidate(&[tag]).await {
                    warn!("cache invalidation after save failed: {e}");
                }
            }
        }

        Ok(saved)
    }

    async fn create(tx: &mut dyn UrlTransaction, url: &Url) -> Result<Url> {
        match tx.insert(url).await {
            Ok(saved) => Ok(saved),
            Err(StorageError::DuplicatePath) => Err(Error::UrlAlreadyExists {
                path: url.path().to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(tx: &mut dyn UrlTransaction, url: &Url) -> Result<Url> {
        tx.update(url).await?;
        Ok(url.clone())
    }

    async fn close_session(tx: &mut dyn UrlTransaction) {
        if let Err(e) = tx.rollback().await {
            warn!("session reset after failed save also failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Destination;
    use crate::domain::repositories::{MockUrlRepository, MockUrlTransaction};
    use crate::infrastructure::cache::{MemoryCache, NullCache};

    fn url(path: &str) -> Url {
        Url::new(path, Destination::from_parts("Article", "view").unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_save_without_id_creates() {
        let mut repo = MockUrlRepository::new();
        repo.expect_begin().return_once(|| {
            let mut tx = MockUrlTransaction::new();
            tx.expect_insert()
                .times(1)
                .returning(|url| Ok(url.clone().with_id(1)));
            tx.expect_commit().times(1).returning(|| Ok(()));
            Ok(Box::new(tx))
        });

        let persister = UrlPersister::new(Arc::new(repo), Arc::new(NullCache::new()));
        let saved = persister.save(&url("page")).await.unwrap();

        assert_eq!(saved.id(), Some(1));
    }

    #[tokio::test]
    async fn test_save_with_id_updates() {
        let mut repo = MockUrlRepository::new();
        repo.expect_begin().return_once(|| {
            let mut tx = MockUrlTransaction::new();
            tx.expect_update().times(1).returning(|_| Ok(()));
            tx.expect_commit().times(1).returning(|| Ok(()));
            Ok(Box::new(tx))
        });

        let persister = UrlPersister::new(Arc::new(repo), Arc::new(NullCache::new()));
        let saved = persister.save(&url("page").with_id(4)).await.unwrap();

        assert_eq!(saved.id(), Some(4));
    }

    #[tokio::test]
    async fn test_duplicate_path_is_surfaced_distinctly() {
        let mut repo = MockUrlRepository::new();
        repo.expect_begin().return_once(|| {
            let mut tx = MockUrlTransaction::new();
            tx.expect_insert()
                .times(1)
                .returning(|_| Err(StorageError::DuplicatePath));
            tx.expect_rollback().times(1).returning(|| Ok(()));
            Ok(Box::new(tx))
        });

        let persister = UrlPersister::new(Arc::new(repo), Arc::new(NullCache::new()));
        let result = persister.save(&url("taken")).await;

        assert!(matches!(result, Err(Error::UrlAlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_storage_failure_rolls_back_and_propagates_unchanged() {
        let mut repo = MockUrlRepository::new();
        repo.expect_begin().return_once(|| {
            let mut tx = MockUrlTransaction::new();
            tx.expect_insert()
                .times(1)
                .returning(|_| Err(StorageError::Backend("connection reset".to_string())));
            tx.expect_rollback().times(1).returning(|| Ok(()));
            Ok(Box::new(tx))
        });

        let persister = UrlPersister::new(Arc::new(repo), Arc::new(NullCache::new()));
        let result = persister.save(&url("page")).await;

        assert!(matches!(
            result,
            Err(Error::Storage(StorageError::Backend(_)))
        ));
    }

    #[tokio::test]
    async fn test_update_invalidates_the_record_tag() {
        let mut repo = MockUrlRepository::new();
        repo.expect_begin().return_once(|| {
            let mut tx = MockUrlTransaction::new();
            tx.expect_update().returning(|_| Ok(()));
            tx.expect_commit().returning(|| Ok(()));
            Ok(Box::new(tx))
        });

        let cache = Arc::new(MemoryCache::new());
        cache
            .set("routing/page", "stale", &["Url/4".to_string()])
            .await
            .unwrap();

        let persister = UrlPersister::new(Arc::new(repo), Arc::clone(&cache));
        persister.save(&url("page").with_id(4)).await.unwrap();

        assert_eq!(cache.get("routing/page").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_does_not_touch_the_cache() {
        let mut repo = MockUrlRepository::new();
        repo.expect_begin().return_once(|| {
            let mut tx = MockUrlTransaction::new();
            tx.expect_insert().returning(|url| Ok(url.clone().with_id(9)));
            tx.expect_commit().returning(|| Ok(()));
            Ok(Box::new(tx))
        });

        let cache = Arc::new(MemoryCache::new());
        cache
            .set("routing/other", "fresh", &["Url/9".to_string()])
            .await
            .unwrap();

        let persister = UrlPersister::new(Arc::new(repo), Arc::clone(&cache));
        persister.save(&url("page")).await.unwrap();

        assert_eq!(
            cache.get("routing/other").await.unwrap().as_deref(),
            Some("fresh")
        );
    }
}
