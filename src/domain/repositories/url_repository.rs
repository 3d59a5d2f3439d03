//! Repository traits for url storage access.

use async_trait::async_trait;

use crate::domain::entities::Url;
use crate::domain::query::UrlQuery;

/// Errors reported by the storage collaborator.
///
/// A duplicate-path insert is signalled distinctly so the persister can turn
/// it into a dedicated "already exists" failure instead of a generic one.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Insert violated the unique path constraint.
    #[error("duplicate url path")]
    DuplicatePath,

    /// The transactional session was already committed or rolled back.
    #[error("transactional session is closed")]
    SessionClosed,

    #[error("storage connection error: {0}")]
    Connection(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Read side of url storage, plus the entry point into a unit of work.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUrlRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryUrlRepository`] - In-memory substitute for tests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// Opens a transaction. Every mutation runs inside one; either the whole
    /// unit of work commits or none of it does.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] when no session can be acquired.
    async fn begin(&self) -> StorageResult<Box<dyn UrlTransaction>>;

    /// First record matching the query, in storage-native order.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] on query failure.
    async fn find_one(&self, query: UrlQuery) -> StorageResult<Option<Url>>;

    /// Every record matching the query, in storage-native order.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] on query failure.
    async fn find_many(&self, query: UrlQuery) -> StorageResult<Vec<Url>>;

    /// Record with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] on query failure.
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Url>>;

    /// Deletes the record with the given identifier. Records redirecting to
    /// it keep existing with their redirect reference cleared.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] on query failure.
    async fn delete_by_id(&self, id: i64) -> StorageResult<()>;
}

/// One atomic unit of work against url storage.
///
/// After [`UrlTransaction::commit`] or [`UrlTransaction::rollback`] the
/// session is closed and every further call fails with
/// [`StorageError::SessionClosed`]. Dropping an uncommitted transaction
/// rolls it back.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlTransaction: Send {
    /// Inserts an unpersisted record, returning it with its assigned
    /// identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::DuplicatePath`] when the unique path
    /// constraint is violated, [`StorageError::Backend`] otherwise.
    async fn insert(&mut self, url: &Url) -> StorageResult<Url>;

    /// Flushes the current state of an already persisted record.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] when the record has no identifier
    /// or the flush fails.
    async fn update(&mut self, url: &Url) -> StorageResult<()>;

    /// Records whose stored redirect target is `target_id`.
    async fn find_redirecting_to(&mut self, target_id: i64) -> StorageResult<Vec<Url>>;

    /// Points the record `id` at `target_id`.
    async fn set_redirect_target(&mut self, id: i64, target_id: i64) -> StorageResult<()>;

    /// Commits the unit of work and closes the session.
    async fn commit(&mut self) -> StorageResult<()>;

    /// Rolls the unit of work back and closes the session.
    async fn rollback(&mut self) -> StorageResult<()>;
}
