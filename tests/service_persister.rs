mod common;

use url_resolver::prelude::*;

#[tokio::test]
async fn test_register_then_update() {
    let facade = common::create_facade();

    let mut saved = common::register(&facade, "articles/rust", "Article", "view", None).await;
    let id = saved.id().unwrap();

    saved.set_destination(Destination::from_parts("News", "detail").unwrap());
    saved.set_internal_id(Some("99".to_string()));
    let updated = facade.save_url(&saved).await.unwrap();

    assert_eq!(updated.id(), Some(id));

    let reloaded = facade.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(reloaded.presenter(), "News");
    assert_eq!(reloaded.action(), "detail");
    assert_eq!(reloaded.internal_id(), Some("99"));
}

#[tokio::test]
async fn test_duplicate_path_fails_distinctly() {
    let facade = common::create_facade();

    common::register(&facade, "articles/rust", "Article", "view", None).await;
    let result = facade.register("articles/rust", "News", "detail", None).await;

    match result {
        Err(Error::UrlAlreadyExists { path }) => assert_eq!(path, "articles/rust"),
        other => panic!("expected UrlAlreadyExists, got {other:?}"),
    }
}

#[tokio::test]
async fn test_same_normalized_path_collides() {
    let facade = common::create_facade();

    common::register(&facade, "hello world", "Page", "default", None).await;

    // A different raw spelling normalizing to the same slug is a duplicate.
    let result = facade.register("hello   world", "Page", "default", None).await;
    assert!(matches!(result, Err(Error::UrlAlreadyExists { .. })));
}

#[tokio::test]
async fn test_concurrent_creates_have_exactly_one_winner() {
    let facade = common::create_facade();

    let (first, second) = tokio::join!(
        facade.register("contested", "Page", "default", None),
        facade.register("contested", "Page", "default", None),
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    let failure = if first.is_err() { first } else { second };
    assert!(matches!(failure, Err(Error::UrlAlreadyExists { .. })));
}

#[tokio::test]
async fn test_session_is_usable_after_a_failed_save() {
    let facade = common::create_facade();

    common::register(&facade, "taken", "Page", "default", None).await;
    assert!(facade.register("taken", "Page", "default", None).await.is_err());

    // The failed save rolled back and reset its session; new work is fine.
    let saved = facade.register("free", "Page", "default", None).await.unwrap();
    assert!(saved.id().is_some());
}

#[tokio::test]
async fn test_validation_failures_never_reach_storage() {
    let facade = common::create_facade();

    assert!(matches!(
        facade.register("page", "article", "view", None).await,
        Err(Error::InvalidDestinationFormat { .. })
    ));

    let too_long = "a".repeat(1001);
    assert!(matches!(
        facade.register(&too_long, "Article", "view", None).await,
        Err(Error::Validation { .. })
    ));

    assert!(facade.get_by_path("page").await.unwrap().is_none());
}
