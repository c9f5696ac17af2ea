//! End-to-end test infrastructure for fedsearch.
//!
//! Provides a shared TestHarness that wires the search engine to in-memory
//! collaborators, plus helpers for building spaces and index hits.

use std::sync::Arc;
use std::time::Duration;

use fedsearch_engine::{MockIndexClient, MockPathResolver, MockSpaceProvider, SearchEngine};
use fedsearch_types::{
    BackendError, EngineConfig, Entity, GrantRef, Match, Reference, ResourceId,
    SearchRequest, SearchResponse, Space, UserRef,
};
use tokio_util::sync::CancellationToken;

pub type TestEngine = SearchEngine<MockSpaceProvider, MockPathResolver, MockIndexClient>;

/// Storage provider every test space lives on.
pub const STORAGE: &str = "storage-1";

/// Root resource id of a space named `name`.
pub fn space_root(name: &str) -> ResourceId {
    ResourceId::new(STORAGE, name, name)
}

/// A scored hit inside `space`, with `path` relative to the space root.
pub fn hit(space: &str, id: &str, path: &str, score: f32) -> Match {
    let name = path.rsplit('/').next().unwrap_or(path);
    Match::new(
        score,
        Entity::new(
            ResourceId::new(STORAGE, space, id),
            Reference::new(space_root(space), path),
            name,
        ),
    )
}

/// Opaque ids of the returned matches, in order.
pub fn ids(response: &SearchResponse) -> Vec<String> {
    response
        .matches
        .iter()
        .map(|m| m.entity.id.opaque_id.clone())
        .collect()
}

/// Builder-style harness for federated search scenarios.
///
/// Spaces, grant paths and index contents are collected first; `engine()`
/// freezes them into a [`SearchEngine`] over mock collaborators.
#[derive(Default)]
pub struct TestHarness {
    spaces: MockSpaceProvider,
    paths: MockPathResolver,
    index: MockIndexClient,
    config: EngineConfig,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn personal(mut self, name: &str, hits: Vec<Match>) -> Self {
        self.spaces = self.spaces.with_space(Space::personal(space_root(name)).with_name(name));
        self.index = self.index.with_hits(space_root(name), hits);
        self
    }

    pub fn project(mut self, name: &str, hits: Vec<Match>) -> Self {
        self.spaces = self.spaces.with_space(Space::project(space_root(name)).with_name(name));
        self.index = self.index.with_hits(space_root(name), hits);
        self
    }

    /// A project space the index has no entries for.
    pub fn unindexed_project(mut self, name: &str) -> Self {
        self.spaces = self.spaces.with_space(Space::project(space_root(name)).with_name(name));
        self
    }

    /// A received share: the grant space (listed, never searched directly),
    /// the mountpoint pointing at it, and the grant's absolute path.
    pub fn share(mut self, mount: &str, grant: &str, grant_path: &str, hits: Vec<Match>) -> Self {
        self.spaces = self
            .spaces
            .with_space(Space::grant(space_root(grant)).with_name(grant))
            .with_space(
                Space::mountpoint(space_root(mount), GrantRef::new(space_root(grant)))
                    .with_name(mount),
            );
        self.paths = self.paths.with_path(space_root(grant), grant_path);
        self.index = self.index.with_hits(space_root(grant), hits);
        self
    }

    /// Make a space's index fail.
    pub fn failing(mut self, name: &str) -> Self {
        self.index = self.index.with_failure(
            space_root(name),
            BackendError::Unavailable(format!("{} index offline", name)),
        );
        self
    }

    /// Make a space's index answer only after `delay`.
    pub fn slow(mut self, name: &str, delay: Duration) -> Self {
        self.index = self.index.with_delay(space_root(name), delay);
        self
    }

    pub fn listing_failure(mut self, error: BackendError) -> Self {
        self.spaces = self.spaces.with_failure(error);
        self
    }

    pub fn path_failure(mut self, error: BackendError) -> Self {
        self.paths = self.paths.with_failure(error);
        self
    }

    /// Build the engine; the index client is returned for call inspection.
    pub fn engine(self) -> (TestEngine, Arc<MockIndexClient>) {
        let index = Arc::new(self.index);
        let engine = SearchEngine::with_config(
            Arc::new(self.spaces),
            Arc::new(self.paths),
            index.clone(),
            self.config,
        );
        (engine, index)
    }
}

/// Run `request` as `user` without cancellation.
pub async fn search_as(
    engine: &TestEngine,
    user: &str,
    request: SearchRequest,
) -> Result<SearchResponse, fedsearch_engine::EngineError> {
    engine
        .search(&CancellationToken::new(), &UserRef::new(user), &request)
        .await
}
