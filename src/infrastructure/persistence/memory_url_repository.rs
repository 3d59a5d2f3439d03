//! In-memory implementation of the url repository.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::entities::Url;
use crate::domain::query::UrlQuery;
use crate::domain::repositories::{StorageError, StorageResult, UrlRepository, UrlTransaction};

/// An in-memory url store.
///
/// Implements the same contract as the PostgreSQL repository so tests and
/// cacheless development setups can substitute it without touching the
/// service graph. Will be destroyed on shutdown.
///
/// Transactions take an owned lock on the whole store for their lifetime:
/// writers are serialized exactly like they would be by the database, and
/// plain reads block until the open unit of work commits or rolls back.
#[derive(Clone, Default)]
pub struct MemoryUrlRepository {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Clone)]
struct MemoryState {
    next_id: i64,
    rows: BTreeMap<i64, Url>,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

impl MemoryUrlRepository {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UrlRepository for MemoryUrlRepository {
    async fn begin(&self) -> StorageResult<Box<dyn UrlTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();

        Ok(Box::new(MemoryUrlTransaction {
            guard: Some(guard),
            staged,
        }))
    }

    async fn find_one(&self, query: UrlQuery) -> StorageResult<Option<Url>> {
        let state = self.state.lock().await;
        Ok(state
            .rows
            .values()
            .find(|url| matches(url, &query))
            .map(|url| attach_target(&state, url.clone(), query.with_redirect_target)))
    }

    async fn find_many(&self, query: UrlQuery) -> StorageResult<Vec<Url>> {
        let state = self.state.lock().await;
        Ok(state
            .rows
            .values()
            .filter(|url| matches(url, &query))
            .map(|url| attach_target(&state, url.clone(), query.with_redirect_target))
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Url>> {
        Ok(self.state.lock().await.rows.get(&id).cloned())
    }

    async fn delete_by_id(&self, id: i64) -> StorageResult<()> {
        let mut state = self.state.lock().await;
        state.rows.remove(&id);

        // Referencing rows fall back to canonical, like ON DELETE SET NULL.
        for url in state.rows.values_mut() {
            if url.redirect_to_id() == Some(id) {
                url.set_redirect_target_id(None);
            }
        }

        Ok(())
    }
}

/// A unit of work staged against a copy of the store. The owned guard keeps
/// other writers out until the transaction ends; dropping it without a
/// commit discards the staged copy.
struct MemoryUrlTransaction {
    guard: Option<OwnedMutexGuard<MemoryState>>,
    staged: MemoryState,
}

impl MemoryUrlTransaction {
    fn open(&mut self) -> StorageResult<&mut MemoryState> {
        if self.guard.is_none() {
            return Err(StorageError::SessionClosed);
        }
        Ok(&mut self.staged)
    }
}

#[async_trait]
impl UrlTransaction for MemoryUrlTransaction {
    async fn insert(&mut self, url: &Url) -> StorageResult<Url> {
        let staged = self.open()?;

        if staged.rows.values().any(|row| row.path() == url.path()) {
            return Err(StorageError::DuplicatePath);
        }

        let id = staged.next_id;
        staged.next_id += 1;
        staged.rows.insert(id, url.without_loaded_target().with_id(id));

        Ok(url.clone().with_id(id))
    }

    async fn update(&mut self, url: &Url) -> StorageResult<()> {
        let staged = self.open()?;

        let Some(id) = url.id() else {
            return Err(StorageError::Backend(
                "cannot flush a record without an identifier".to_string(),
            ));
        };
        if !staged.rows.contains_key(&id) {
            return Err(StorageError::Backend(format!("no url record with id {id}")));
        }

        staged.rows.insert(id, url.without_loaded_target());
        Ok(())
    }

    async fn find_redirecting_to(&mut self, target_id: i64) -> StorageResult<Vec<Url>> {
        let staged = self.open()?;

        Ok(staged
            .rows
            .values()
            .filter(|url| url.redirect_to_id() == Some(target_id))
            .cloned()
            .collect())
    }

    async fn set_redirect_target(&mut self, id: i64, target_id: i64) -> StorageResult<()> {
        let staged = self.open()?;

        match staged.rows.get_mut(&id) {
            Some(url) => {
                url.set_redirect_target_id(Some(target_id));
                Ok(())
            }
            None => Err(StorageError::Backend(format!("no url record with id {id}"))),
        }
    }

    async fn commit(&mut self) -> StorageResult<()> {
        let mut guard = self.guard.take().ok_or(StorageError::SessionClosed)?;
        *guard = std::mem::take(&mut self.staged);
        Ok(())
    }

    async fn rollback(&mut self) -> StorageResult<()> {
        self.guard.take().ok_or(StorageError::SessionClosed)?;
        Ok(())
    }
}

fn matches(url: &Url, query: &UrlQuery) -> bool {
    if let Some(path) = &query.path {
        if url.path() != path {
            return false;
        }
    }
    if let Some(presenter) = &query.presenter {
        if url.presenter() != presenter {
            return false;
        }
    }
    if let Some(action) = &query.action {
        if url.action() != action {
            return false;
        }
    }
    if let Some(internal_id) = &query.internal_id {
        if url.internal_id() != Some(internal_id.as_str()) {
            return false;
        }
    }

    true
}

fn attach_target(state: &MemoryState, mut url: Url, eager: bool) -> Url {
    if eager {
        if let Some(target_id) = url.redirect_to_id() {
            if let Some(target) = state.rows.get(&target_id) {
                url.set_redirect_to(target.clone());
            }
        }
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Destination;

    fn url(path: &str) -> Url {
        Url::new(path, Destination::from_parts("Article", "view").unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let repo = MemoryUrlRepository::new();

        let mut tx = repo.begin().await.unwrap();
        let first = tx.insert(&url("a")).await.unwrap();
        let second = tx.insert(&url("b")).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(first.id(), Some(1));
        assert_eq!(second.id(), Some(2));
    }

    #[tokio::test]
    async fn test_committed_rows_are_visible() {
        let repo = MemoryUrlRepository::new();

        let mut tx = repo.begin().await.unwrap();
        tx.insert(&url("a")).await.unwrap();
        tx.commit().await.unwrap();

        let found = repo
            .find_one(UrlQuery::new().by_path("a"))
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_rollback_discards_staged_rows() {
        let repo = MemoryUrlRepository::new();

        let mut tx = repo.begin().await.unwrap();
        tx.insert(&url("a")).await.unwrap();
        tx.rollback().await.unwrap();

        let found = repo.find_one(UrlQuery::new().by_path("a")).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_path_is_distinct() {
        let repo = MemoryUrlRepository::new();

        let mut tx = repo.begin().await.unwrap();
        tx.insert(&url("a")).await.unwrap();
        let result = tx.insert(&url("a")).await;

        assert!(matches!(result, Err(StorageError::DuplicatePath)));
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_session_is_unusable() {
        let repo = MemoryUrlRepository::new();

        let mut tx = repo.begin().await.unwrap();
        tx.commit().await.unwrap();

        assert!(matches!(
            tx.insert(&url("a")).await,
            Err(StorageError::SessionClosed)
        ));
        assert!(matches!(
            tx.commit().await,
            Err(StorageError::SessionClosed)
        ));
    }

    #[tokio::test]
    async fn test_delete_clears_references() {
        let repo = MemoryUrlRepository::new();

        let mut tx = repo.begin().await.unwrap();
        let canonical = tx.insert(&url("new")).await.unwrap();
        let old = tx.insert(&url("old")).await.unwrap();
        tx.set_redirect_target(old.id().unwrap(), canonical.id().unwrap())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        repo.delete_by_id(canonical.id().unwrap()).await.unwrap();

        let old = repo
            .find_by_id(old.id().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(old.redirect_to_id().is_none());
    }

    #[tokio::test]
    async fn test_eager_load_attaches_target() {
        let repo = MemoryUrlRepository::new();

        let mut tx = repo.begin().await.unwrap();
        let canonical = tx.insert(&url("new")).await.unwrap();
        let old = tx.insert(&url("old")).await.unwrap();
        tx.set_redirect_target(old.id().unwrap(), canonical.id().unwrap())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let found = repo
            .find_one(UrlQuery::new().by_path("old").with_redirect_target())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.redirect_to().unwrap().path(), "new");
        assert_eq!(found.current_path(), "new");
    }
}
