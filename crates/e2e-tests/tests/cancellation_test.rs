//! Cancellation and concurrency E2E tests.

use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use e2e_tests::{hit, ids, TestHarness};
use fedsearch_engine::EngineError;
use fedsearch_types::{EngineConfig, SearchRequest, UserRef};

/// Cancelling mid-flight abandons slow spaces and reports cancellation.
#[tokio::test(start_paused = true)]
async fn test_cancel_aborts_outstanding_searches() {
    let (engine, _) = TestHarness::new()
        .personal("home", vec![hit("home", "a", "./a.txt", 1.0)])
        .project("physics", vec![hit("physics", "b", "./b.txt", 2.0)])
        .slow("physics", Duration::from_secs(3600))
        .engine();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = tokio::time::Instant::now();
    let result = engine
        .search(&cancel, &UserRef::new("einstein"), &SearchRequest::new("txt"))
        .await;

    assert_eq!(result, Err(EngineError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(3600));
}

/// Slow spaces are waited for when nobody cancels.
#[tokio::test(start_paused = true)]
async fn test_slow_space_is_awaited() {
    let (engine, _) = TestHarness::new()
        .personal("home", vec![hit("home", "a", "./a.txt", 1.0)])
        .project("physics", vec![hit("physics", "b", "./b.txt", 2.0)])
        .slow("physics", Duration::from_secs(5))
        .engine();

    let response = engine
        .search(
            &CancellationToken::new(),
            &UserRef::new("einstein"),
            &SearchRequest::new("txt"),
        )
        .await
        .unwrap();

    assert_eq!(ids(&response), vec!["b", "a"]);
}

/// With a concurrency cap of one, spaces run one after another but the
/// result is the same as unbounded.
#[tokio::test(start_paused = true)]
async fn test_concurrency_cap_serializes_spaces() {
    let build = |max_concurrent_spaces| {
        TestHarness::new()
            .with_config(EngineConfig {
                max_concurrent_spaces,
                ..EngineConfig::default()
            })
            .personal("home", vec![hit("home", "a", "./a.txt", 1.0)])
            .project("physics", vec![hit("physics", "b", "./b.txt", 2.0)])
            .project("chemistry", vec![hit("chemistry", "c", "./c.txt", 0.5)])
            .slow("home", Duration::from_secs(1))
            .slow("physics", Duration::from_secs(1))
            .slow("chemistry", Duration::from_secs(1))
            .engine()
            .0
    };

    let run = |engine: e2e_tests::TestEngine| async move {
        let started = tokio::time::Instant::now();
        let response = engine
            .search(
                &CancellationToken::new(),
                &UserRef::new("einstein"),
                &SearchRequest::new("txt"),
            )
            .await
            .unwrap();
        (ids(&response), started.elapsed())
    };

    let (serial_ids, serial_elapsed) = run(build(1)).await;
    let (parallel_ids, parallel_elapsed) = run(build(0)).await;

    assert_eq!(serial_ids, vec!["b", "a", "c"]);
    assert_eq!(serial_ids, parallel_ids);
    assert!(serial_elapsed >= Duration::from_secs(3));
    assert!(parallel_elapsed < Duration::from_secs(2));
}
