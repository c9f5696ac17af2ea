//! The federated search entry point.

use std::sync::Arc;
use std::time::Instant;

use fedsearch_types::{EngineConfig, SearchRequest, SearchResponse, UserRef};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::EngineError;
use crate::executor::{IndexClient, SpaceExecutor};
use crate::merge::merge_page;
use crate::query::QueryNormalizer;
use crate::scope::{PathResolver, SpaceProvider, SpaceResolver};

/// Searches every space a user can see and returns one ranked page.
pub struct SearchEngine<S, P, I>
where
    S: SpaceProvider,
    P: PathResolver,
    I: IndexClient + 'static,
{
    normalizer: QueryNormalizer,
    resolver: SpaceResolver<S, P>,
    executor: SpaceExecutor<I>,
    config: EngineConfig,
}

impl<S, P, I> SearchEngine<S, P, I>
where
    S: SpaceProvider,
    P: PathResolver,
    I: IndexClient + 'static,
{
    /// Create an engine with the default configuration.
    pub fn new(spaces: Arc<S>, paths: Arc<P>, index: Arc<I>) -> Self {
        Self::with_config(spaces, paths, index, EngineConfig::default())
    }

    pub fn with_config(spaces: Arc<S>, paths: Arc<P>, index: Arc<I>, config: EngineConfig) -> Self {
        Self {
            normalizer: QueryNormalizer::new().with_name_field(config.name_field.clone()),
            resolver: SpaceResolver::new(spaces, paths),
            executor: SpaceExecutor::new(index).with_max_concurrency(config.max_concurrent_spaces),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &QueryNormalizer {
        &self.normalizer
    }

    /// Run a search for `user`.
    ///
    /// The query is normalized before any backend is contacted. Cancelling
    /// `cancel` aborts all outstanding work and yields
    /// [`EngineError::Cancelled`].
    pub async fn search(
        &self,
        cancel: &CancellationToken,
        user: &UserRef,
        request: &SearchRequest,
    ) -> Result<SearchResponse, EngineError> {
        let start = Instant::now();

        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let page_size = if request.page_size == 0 {
            self.config.default_page_size
        } else {
            request.page_size
        };

        let offset = match (&request.page_token, page_size) {
            (Some(token), size) if size > 0 => token
                .trim()
                .parse::<usize>()
                .map_err(|_| EngineError::InvalidPageToken(token.clone()))?,
            _ => 0,
        };

        let query = self.normalizer.normalize(&request.query)?;

        let scope = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EngineError::Cancelled),
            scope = self.resolver.resolve(user, request.reference.as_ref(), &request.space_filters) => scope?,
        };

        // A hit ranked below offset + page_size in its own space can never
        // make the requested global page. One extra hit per space tells the
        // merger whether a further page exists.
        let limit = if page_size == 0 {
            0
        } else {
            u32::try_from(offset.saturating_add(page_size as usize).saturating_add(1))
                .unwrap_or(u32::MAX)
        };

        debug!(spaces = scope.len(), limit, query = %query, "Dispatching space searches");

        let spaces = scope.len();
        let results = self
            .executor
            .execute_all(scope, &query, limit, cancel)
            .await?;

        let response = merge_page(results, page_size, offset)?;

        info!(
            user = %user,
            query = %query,
            spaces,
            failed = response.failed_spaces.len(),
            total_matches = response.total_matches,
            returned = response.matches.len(),
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Search complete"
        );

        Ok(response)
    }
}
