//! Pagination E2E tests.
//!
//! Following continuation tokens walks the same ranking an unpaged search
//! returns, one page at a time.

use pretty_assertions::assert_eq;

use e2e_tests::{hit, ids, search_as, TestHarness, TestEngine};
use fedsearch_engine::EngineError;
use fedsearch_types::{EngineConfig, SearchRequest};

fn engine_with(config: EngineConfig) -> TestEngine {
    let home = (0..5)
        .map(|i| {
            hit(
                "home",
                &format!("home-{}", i),
                &format!("./h{}.txt", i),
                1.0 - i as f32 * 0.2,
            )
        })
        .collect();
    let physics = (0..4)
        .map(|i| {
            hit(
                "physics",
                &format!("physics-{}", i),
                &format!("./p{}.txt", i),
                0.9 - i as f32 * 0.2,
            )
        })
        .collect();
    let shared = vec![hit("grant", "shared-0", "./s0.txt", 0.95)];

    TestHarness::new()
        .with_config(config)
        .personal("home", home)
        .project("physics", physics)
        .share("mount", "grant", "/Shares/s", shared)
        .engine()
        .0
}

/// Pages concatenate to the unpaged ranking.
#[tokio::test]
async fn test_pages_walk_the_full_ranking() {
    let engine = engine_with(EngineConfig::default());

    let everything = search_as(&engine, "einstein", SearchRequest::new("txt"))
        .await
        .unwrap();
    assert_eq!(everything.matches.len(), 10);

    let mut walked = Vec::new();
    let mut token: Option<String> = None;
    let mut pages = 0;
    loop {
        let mut request = SearchRequest::new("txt").with_page_size(3);
        if let Some(t) = token.take() {
            request = request.with_page_token(t);
        }
        let page = search_as(&engine, "einstein", request).await.unwrap();
        assert_eq!(page.total_matches, 10);
        walked.extend(ids(&page));
        pages += 1;
        match page.next_page_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    assert_eq!(pages, 4);
    assert_eq!(walked, ids(&everything));
}

/// The configured default page size applies when the request has none.
#[tokio::test]
async fn test_default_page_size() {
    let engine = engine_with(EngineConfig {
        default_page_size: 4,
        ..EngineConfig::default()
    });

    let page = search_as(&engine, "einstein", SearchRequest::new("txt"))
        .await
        .unwrap();

    assert_eq!(ids(&page), vec!["home-0", "shared-0", "physics-0", "home-1"]);
    assert_eq!(page.next_page_token.as_deref(), Some("4"));
    assert_eq!(page.total_matches, 10);
}

/// A token past the end yields an empty last page.
#[tokio::test]
async fn test_token_past_the_end() {
    let engine = engine_with(EngineConfig::default());

    let page = search_as(
        &engine,
        "einstein",
        SearchRequest::new("txt").with_page_size(5).with_page_token("50"),
    )
    .await
    .unwrap();

    assert!(page.matches.is_empty());
    assert!(page.next_page_token.is_none());
}

/// Tokens not issued by the engine are rejected.
#[tokio::test]
async fn test_malformed_token_is_rejected() {
    let engine = engine_with(EngineConfig::default());

    let err = search_as(
        &engine,
        "einstein",
        SearchRequest::new("txt").with_page_size(5).with_page_token("-1"),
    )
    .await
    .unwrap_err();

    assert_eq!(err, EngineError::InvalidPageToken("-1".to_string()));
}

/// A single space holding more hits than one page still hands out a token.
#[tokio::test]
async fn test_single_space_overflowing_the_page() {
    let hits = (0..6)
        .map(|i| {
            hit(
                "home",
                &format!("h{}", i),
                &format!("./h{}.txt", i),
                1.0 - i as f32 * 0.1,
            )
        })
        .collect();
    let (engine, _) = TestHarness::new().personal("home", hits).engine();

    // 1. First page is full and points at the rest
    let first = search_as(
        &engine,
        "einstein",
        SearchRequest::new("txt").with_page_size(5),
    )
    .await
    .unwrap();
    assert_eq!(ids(&first), vec!["h0", "h1", "h2", "h3", "h4"]);
    assert_eq!(first.total_matches, 6);
    let token = first.next_page_token.expect("a second page should exist");

    // 2. Following the token returns the remainder and ends the walk
    let second = search_as(
        &engine,
        "einstein",
        SearchRequest::new("txt").with_page_size(5).with_page_token(token),
    )
    .await
    .unwrap();
    assert_eq!(ids(&second), vec!["h5"]);
    assert!(second.next_page_token.is_none());
}
