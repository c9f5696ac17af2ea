//! Per-space query execution.
//!
//! Every space in a scope is searched as an independent task. Tasks run
//! concurrently, bounded by a semaphore, and the caller waits for all of
//! them before merging. A failing space only marks its own results as
//! failed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use fedsearch_types::{BackendError, Match, ResourceId};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::query::StructuredQuery;
use crate::scope::ScopedSpace;
use crate::translate::rebase_path;

/// A structured query bound to one index root.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedQuery {
    /// Root whose index is searched
    pub root: ResourceId,

    /// Sub-path below the root, empty for the whole space
    pub path: String,

    pub query: StructuredQuery,

    /// Maximum matches wanted, 0 for the backend default
    pub limit: u32,
}

/// Matches returned by the index for one scoped query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexResponse {
    pub matches: Vec<Match>,

    /// Total matches in the space, independent of `limit`
    pub total_matches: u64,
}

impl IndexResponse {
    pub fn new(matches: Vec<Match>, total_matches: u64) -> Self {
        Self {
            matches,
            total_matches,
        }
    }
}

/// Searches the prebuilt index.
#[async_trait]
pub trait IndexClient: Send + Sync {
    async fn search(&self, query: &ScopedQuery) -> Result<IndexResponse, BackendError>;
}

/// Results from one space.
#[derive(Debug, Clone)]
pub struct SpaceResults {
    /// Which space produced these results
    pub scope: ScopedSpace,

    /// Matches as reported by the index (not yet rebased)
    pub matches: Vec<Match>,

    /// Total matches reported by the index
    pub total_matches: u64,

    /// Set if the search failed
    pub error: Option<BackendError>,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl SpaceResults {
    /// Create successful results.
    pub fn success(scope: ScopedSpace, response: IndexResponse, execution_time_ms: u64) -> Self {
        Self {
            scope,
            matches: response.matches,
            total_matches: response.total_matches,
            error: None,
            execution_time_ms,
        }
    }

    /// Create failed results.
    pub fn failure(scope: ScopedSpace, error: BackendError, execution_time_ms: u64) -> Self {
        Self {
            scope,
            matches: vec![],
            total_matches: 0,
            error: Some(error),
            execution_time_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

async fn search_space<I: IndexClient + ?Sized>(
    index: &I,
    scope: &ScopedSpace,
    query: &StructuredQuery,
    limit: u32,
) -> Result<IndexResponse, BackendError> {
    let scoped = ScopedQuery {
        root: scope.search_root.clone(),
        path: scope.path.clone(),
        query: query.clone(),
        limit,
    };

    match index.search(&scoped).await {
        Ok(response) => Ok(response),
        Err(e) if e.is_not_found() => {
            debug!(root = %scope.search_root, "Index reported no matches");
            Ok(IndexResponse::default())
        }
        Err(e) => Err(e),
    }
}

/// Runs structured queries against the index, one task per space.
pub struct SpaceExecutor<I: IndexClient + 'static> {
    index: Arc<I>,
    max_concurrency: usize,
}

impl<I: IndexClient + 'static> SpaceExecutor<I> {
    /// Create a new executor with unbounded concurrency.
    pub fn new(index: Arc<I>) -> Self {
        Self {
            index,
            max_concurrency: 0,
        }
    }

    /// Cap the number of spaces searched at once (0 = unbounded).
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Search a single space.
    ///
    /// Mountpoints are searched under their grant's root. A "not found" from
    /// the index is an empty result, not an error.
    pub async fn execute_one(
        &self,
        scope: &ScopedSpace,
        query: &StructuredQuery,
        limit: u32,
    ) -> Result<IndexResponse, BackendError> {
        search_space(self.index.as_ref(), scope, query, limit).await
    }

    /// Search every space and wait for all of them.
    ///
    /// Results come back in scope order regardless of completion order. If
    /// `cancel` fires first, outstanding tasks are aborted and nothing is
    /// returned.
    pub async fn execute_all(
        &self,
        scopes: Vec<ScopedSpace>,
        query: &StructuredQuery,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<SpaceResults>, EngineError> {
        let semaphore =
            (self.max_concurrency > 0).then(|| Arc::new(Semaphore::new(self.max_concurrency)));

        let mut tasks = JoinSet::new();
        let mut slots: Vec<Option<SpaceResults>> = vec![None; scopes.len()];

        for (position, scope) in scopes.iter().cloned().enumerate() {
            let index = self.index.clone();
            let query = query.clone();
            let semaphore = semaphore.clone();

            tasks.spawn(async move {
                let _permit = match semaphore {
                    Some(s) => s.acquire_owned().await.ok(),
                    None => None,
                };

                debug!(space = %scope.space.root, root = %scope.search_root, "Searching space");
                let start = Instant::now();
                let result = search_space(index.as_ref(), &scope, &query, limit).await;
                let elapsed = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                let results = match result {
                    Ok(response) => {
                        debug!(
                            space = %scope.space.root,
                            matches = response.matches.len(),
                            total = response.total_matches,
                            elapsed_ms = elapsed,
                            "Space returned results"
                        );
                        SpaceResults::success(scope, response, elapsed)
                    }
                    Err(e) => {
                        warn!(space = %scope.space.root, error = %e, "Space search failed");
                        SpaceResults::failure(scope, e, elapsed)
                    }
                };

                (position, results)
            });
        }

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    debug!("Search cancelled, aborted outstanding space searches");
                    return Err(EngineError::Cancelled);
                }
                next = tasks.join_next() => match next {
                    Some(Ok((position, results))) => slots[position] = Some(results),
                    Some(Err(e)) => warn!(error = %e, "Space search task did not complete"),
                    None => break,
                },
            }
        }

        // A task that panicked leaves its slot empty; report it as failed.
        Ok(slots
            .into_iter()
            .zip(scopes)
            .map(|(slot, scope)| {
                slot.unwrap_or_else(|| {
                    SpaceResults::failure(
                        scope,
                        BackendError::Internal("search task did not complete".to_string()),
                        0,
                    )
                })
            })
            .collect())
    }
}

fn is_within(path: &str, scope: &str) -> bool {
    let path = rebase_path("", path);
    let scope = rebase_path("", scope);
    scope == "." || path == scope || path.starts_with(&format!("{}/", scope))
}

/// Mock index client for testing.
#[derive(Default)]
pub struct MockIndexClient {
    /// Responses by search root
    pub responses: HashMap<ResourceId, IndexResponse>,
    /// Simulated delay by search root
    pub delays: HashMap<ResourceId, Duration>,
    /// Roots that fail
    pub failures: HashMap<ResourceId, BackendError>,
    /// Queries received
    pub calls: Mutex<Vec<ScopedQuery>>,
}

impl MockIndexClient {
    /// Add matches for a root; the reported total is the match count.
    pub fn with_hits(self, root: ResourceId, matches: Vec<Match>) -> Self {
        let total = matches.len() as u64;
        self.with_response(root, IndexResponse::new(matches, total))
    }

    pub fn with_response(mut self, root: ResourceId, response: IndexResponse) -> Self {
        self.responses.insert(root, response);
        self
    }

    pub fn with_delay(mut self, root: ResourceId, delay: Duration) -> Self {
        self.delays.insert(root, delay);
        self
    }

    pub fn with_failure(mut self, root: ResourceId, error: BackendError) -> Self {
        self.failures.insert(root, error);
        self
    }

    /// Queries received so far, in arrival order.
    pub fn recorded_queries(&self) -> Vec<ScopedQuery> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl IndexClient for MockIndexClient {
    async fn search(&self, query: &ScopedQuery) -> Result<IndexResponse, BackendError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(query.clone());
        }

        if let Some(delay) = self.delays.get(&query.root) {
            tokio::time::sleep(*delay).await;
        }

        if let Some(error) = self.failures.get(&query.root) {
            return Err(error.clone());
        }

        let response = self
            .responses
            .get(&query.root)
            .ok_or_else(|| BackendError::NotFound(query.root.to_string()))?;

        let matches: Vec<Match> = response
            .matches
            .iter()
            .filter(|m| query.path.is_empty() || is_within(&m.entity.reference.path, &query.path))
            .cloned()
            .collect();
        let total = if query.path.is_empty() {
            response.total_matches
        } else {
            matches.len() as u64
        };

        let limit = if query.limit == 0 {
            matches.len()
        } else {
            query.limit as usize
        };

        Ok(IndexResponse::new(
            matches.into_iter().take(limit).collect(),
            total,
        ))
    }
}
