mod common;

use url_resolver::prelude::*;

#[tokio::test]
async fn test_relink_flattens_the_whole_chain() {
    let facade = common::create_facade();

    let a = common::register(&facade, "a", "Article", "view", None).await;
    let b = common::register(&facade, "b", "Article", "view", None).await;
    let c = common::register(&facade, "c", "Article", "view", None).await;
    let d = common::register(&facade, "d", "Article", "view", None).await;

    // b and c were superseded by a earlier.
    facade.link_urls(&b, &a).await.unwrap();
    facade.link_urls(&c, &a).await.unwrap();

    // Now a itself is superseded by d: every prior redirector is rewritten.
    facade.link_urls(&a, &d).await.unwrap();

    for path in ["a", "b", "c"] {
        let record = facade.get_by_path(path).await.unwrap().unwrap();
        assert_eq!(record.redirect_to_id(), d.id(), "{path} must point at d");
    }

    let d = facade.get_by_path("d").await.unwrap().unwrap();
    assert!(d.redirect_to_id().is_none(), "d stays canonical");

    // Resolving a superseded path lands on d's destination in one read.
    let resolved = facade.resolve_by_path("b").await.unwrap().unwrap();
    assert_eq!(resolved.path(), "d");
}

#[tokio::test]
async fn test_linking_requires_persisted_records() {
    let facade = common::create_facade();

    let persisted = common::register(&facade, "persisted", "Page", "default", None).await;
    let unpersisted = Url::new("floating", Destination::from_parts("Page", "default").unwrap())
        .unwrap();

    assert!(matches!(
        facade.link_urls(&unpersisted, &persisted).await,
        Err(Error::UrlNotPersisted)
    ));
    assert!(matches!(
        facade.link_urls(&persisted, &unpersisted).await,
        Err(Error::UrlNotPersisted)
    ));

    // Nothing was written.
    let record = facade.get_by_path("persisted").await.unwrap().unwrap();
    assert!(record.redirect_to_id().is_none());
}

#[tokio::test]
async fn test_relink_is_atomic_with_lookups() {
    let facade = common::create_facade();

    let old = common::register(&facade, "old", "Article", "view", None).await;
    let new = common::register(&facade, "new", "Article", "view", None).await;

    facade.link_urls(&old, &new).await.unwrap();

    let old = facade
        .get_url(UrlQuery::new().by_path("old").with_redirect_target())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(old.redirect_to_id(), new.id());
    assert_eq!(old.current_path(), "new");
    assert_eq!(old.redirect_to().unwrap().path(), "new");
}
