#![allow(dead_code)]

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use url_resolver::prelude::*;

/// Installs a test subscriber honoring `RUST_LOG`; safe to call per test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub type TestFacade = UrlFacade<MemoryUrlRepository, MemoryCache>;

/// A facade wired over in-memory storage and cache.
pub fn create_facade() -> TestFacade {
    UrlFacade::new(
        Arc::new(MemoryUrlRepository::new()),
        Arc::new(MemoryCache::new()),
    )
}

/// Same, but hands the collaborators back for direct manipulation.
pub fn create_facade_with_parts() -> (TestFacade, Arc<MemoryUrlRepository>, Arc<MemoryCache>) {
    let repository = Arc::new(MemoryUrlRepository::new());
    let cache = Arc::new(MemoryCache::new());
    let facade = UrlFacade::new(Arc::clone(&repository), Arc::clone(&cache));

    (facade, repository, cache)
}

pub async fn register(
    facade: &TestFacade,
    path: &str,
    presenter: &str,
    action: &str,
    internal_id: Option<&str>,
) -> Url {
    facade
        .register(path, presenter, action, internal_id)
        .await
        .unwrap()
}
