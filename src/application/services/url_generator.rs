//! Batch registration of urls for a single presenter.

use std::sync::Arc;

use crate::domain::entities::{Destination, Url};
use crate::error::Result;
use crate::infrastructure::cache::UrlCache;

use super::UrlPersister;
use crate::domain::repositories::UrlRepository;

/// Registers a series of urls that all point at one presenter.
///
/// Convenience wrapper around the persister for seeding scenarios such as
/// installing a module's routes.
pub struct UrlGenerator<R: UrlRepository, C: UrlCache> {
    presenter: String,
    persister: Arc<UrlPersister<R, C>>,
}

impl<R: UrlRepository, C: UrlCache> UrlGenerator<R, C> {
    pub fn new(presenter: impl Into<String>, persister: Arc<UrlPersister<R, C>>) -> Self {
        Self {
            presenter: presenter.into(),
            persister,
        }
    }

    /// Switches the presenter subsequent urls are registered under.
    pub fn for_presenter(mut self, presenter: impl Into<String>) -> Self {
        self.presenter = presenter.into();
        self
    }

    /// Registers one url under the current presenter.
    ///
    /// # Errors
    ///
    /// Validation and persistence failures surface unchanged from the
    /// destination parser and the persister.
    pub async fn add_url(
        &self,
        path: &str,
        action: &str,
        internal_id: Option<&str>,
    ) -> Result<Url> {
        let mut url = Url::new(path, Destination::from_parts(&self.presenter, action)?)?;
        url.set_internal_id(internal_id.map(str::to_string));

        self.persister.save(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cache::NullCache;
    use crate::infrastructure::persistence::MemoryUrlRepository;

    #[tokio::test]
    async fn test_add_url_registers_under_the_presenter() {
        let persister = Arc::new(UrlPersister::new(
            Arc::new(MemoryUrlRepository::new()),
            Arc::new(NullCache::new()),
        ));
        let generator = UrlGenerator::new("Article", persister);

        let url = generator.add_url("archive", "default", None).await.unwrap();

        assert!(url.id().is_some());
        assert_eq!(url.presenter(), "Article");
        assert_eq!(url.action(), "default");
    }

    #[tokio::test]
    async fn test_for_presenter_switches_target() {
        let persister = Arc::new(UrlPersister::new(
            Arc::new(MemoryUrlRepository::new()),
            Arc::new(NullCache::new()),
        ));
        let generator = UrlGenerator::new("Article", persister).for_presenter("News");

        let url = generator
            .add_url("news/2026", "list", Some("7"))
            .await
            .unwrap();

        assert_eq!(url.presenter(), "News");
        assert_eq!(url.internal_id(), Some("7"));
    }

    #[tokio::test]
    async fn test_invalid_action_is_rejected_before_storage() {
        let persister = Arc::new(UrlPersister::new(
            Arc::new(MemoryUrlRepository::new()),
            Arc::new(NullCache::new()),
        ));
        let generator = UrlGenerator::new("Article", persister);

        assert!(generator.add_url("archive", "Default", None).await.is_err());
    }
}
