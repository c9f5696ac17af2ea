//! Federated search E2E tests.
//!
//! A user with a personal space, a project space and a received share runs
//! one query and gets a single ranked list where shared results appear under
//! the mountpoint they were received through.

use pretty_assertions::assert_eq;

use e2e_tests::{hit, ids, search_as, space_root, TestHarness};
use fedsearch_types::{Reference, SearchRequest};

fn scenario() -> TestHarness {
    TestHarness::new()
        .personal(
            "home",
            vec![
                hit("home", "notes", "./Notes/relativity.md", 1.2),
                hit("home", "draft", "./Drafts/relativity-draft.odt", 0.4),
            ],
        )
        .project(
            "physics",
            vec![hit("physics", "paper", "./Papers/relativity.pdf", 2.5)],
        )
        .share(
            "shared-mount",
            "shared-grant",
            "/Shares/relativity",
            vec![hit("shared-grant", "slides", "./talk/slides.pdf", 1.8)],
        )
}

/// All visible spaces are searched and merged into one ranking.
#[tokio::test]
async fn test_ranks_across_personal_project_and_shared_spaces() {
    // 1. Build the scenario
    let (engine, index) = scenario().engine();

    // 2. Search everything
    let response = search_as(&engine, "einstein", SearchRequest::new("relativity"))
        .await
        .unwrap();

    // 3. One ranked list, best first
    assert_eq!(ids(&response), vec!["paper", "slides", "notes", "draft"]);
    assert_eq!(response.total_matches, 4);
    assert!(response.failed_spaces.is_empty());
    assert!(response.next_page_token.is_none());

    // 4. Grant searched once, through the mountpoint; mountpoint never queried
    let roots: Vec<_> = index.recorded_queries().into_iter().map(|q| q.root).collect();
    assert_eq!(roots.len(), 3);
    assert!(roots.contains(&space_root("shared-grant")));
    assert!(!roots.contains(&space_root("shared-mount")));

    // 5. Every space received the same normalized query
    assert!(index
        .recorded_queries()
        .iter()
        .all(|q| q.query.to_string() == "Name:*relativity*"));
}

/// Shared matches are reported relative to the mountpoint.
#[tokio::test]
async fn test_shared_results_are_rebased_to_the_mountpoint() {
    let (engine, _) = scenario().engine();

    let response = search_as(&engine, "einstein", SearchRequest::new("slides"))
        .await
        .unwrap();

    let slides = response
        .matches
        .iter()
        .find(|m| m.entity.id.opaque_id == "slides")
        .expect("slides should be found");
    assert_eq!(slides.entity.reference.resource_id, space_root("shared-mount"));
    assert_eq!(
        slides.entity.reference.path,
        "./Shares/relativity/talk/slides.pdf"
    );
    assert_eq!(slides.entity.name, "slides.pdf");

    // Non-shared matches keep their own space and path
    let notes = response
        .matches
        .iter()
        .find(|m| m.entity.id.opaque_id == "notes")
        .expect("notes should be found");
    assert_eq!(notes.entity.reference.resource_id, space_root("home"));
    assert_eq!(notes.entity.reference.path, "./Notes/relativity.md");
}

/// A reference pins the search to one space and sub-path.
#[tokio::test]
async fn test_reference_restricts_scope() {
    let (engine, index) = scenario().engine();

    let response = search_as(
        &engine,
        "einstein",
        SearchRequest::new("relativity")
            .with_reference(Reference::new(space_root("home"), "./Notes")),
    )
    .await
    .unwrap();

    assert_eq!(ids(&response), vec!["notes"]);

    let calls = index.recorded_queries();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].root, space_root("home"));
    assert_eq!(calls[0].path, "./Notes");
}

/// Pinning a mountpoint searches its grant and still rebases.
#[tokio::test]
async fn test_reference_to_mountpoint_searches_grant() {
    let (engine, index) = scenario().engine();

    let response = search_as(
        &engine,
        "einstein",
        SearchRequest::new("slides")
            .with_reference(Reference::new(space_root("shared-mount"), "")),
    )
    .await
    .unwrap();

    assert_eq!(ids(&response), vec!["slides"]);
    assert_eq!(
        response.matches[0].entity.reference.resource_id,
        space_root("shared-mount")
    );

    let calls = index.recorded_queries();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].root, space_root("shared-grant"));
}

/// Grants are only reachable through their mountpoint.
#[tokio::test]
async fn test_reference_to_raw_grant_is_not_found() {
    let (engine, index) = scenario().engine();

    let result = search_as(
        &engine,
        "einstein",
        SearchRequest::new("slides")
            .with_reference(Reference::new(space_root("shared-grant"), "")),
    )
    .await;

    assert!(matches!(
        result,
        Err(fedsearch_engine::EngineError::ScopeNotFound(_))
    ));
    assert!(index.recorded_queries().is_empty());
}

/// Field clauses are passed through with canonical field names.
#[tokio::test]
async fn test_field_syntax_reaches_every_space() {
    let (engine, index) = scenario().engine();

    search_as(&engine, "einstein", SearchRequest::new("Foo oo.pdf size:<100"))
        .await
        .unwrap();

    let calls = index.recorded_queries();
    assert_eq!(calls.len(), 3);
    for call in calls {
        assert_eq!(call.query.to_string(), r"Name:*foo\ oo.pdf* Size:<100");
    }
}

/// The same resource reached through two spaces is listed once.
#[tokio::test]
async fn test_duplicate_resources_are_listed_once() {
    let mut in_project = hit("physics", "shared-doc", "./Shared/doc.pdf", 0.7);
    let in_home = hit("home", "shared-doc", "./doc.pdf", 0.9);
    in_project.entity.id = in_home.entity.id.clone();

    let (engine, _) = TestHarness::new()
        .personal("home", vec![in_home])
        .project("physics", vec![in_project])
        .engine();

    let response = search_as(&engine, "einstein", SearchRequest::new("doc"))
        .await
        .unwrap();

    assert_eq!(response.matches.len(), 1);
    assert_eq!(response.matches[0].score, 0.9);
    assert_eq!(
        response.matches[0].entity.reference.resource_id,
        space_root("home")
    );
}
