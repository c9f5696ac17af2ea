//! # fedsearch-engine
//!
//! Federated search across the storage spaces a user can see.
//!
//! A single request is normalized into a structured query, fanned out to
//! every space in scope (personal, project, and shares received through
//! mountpoints), and the per-space results are merged into one ranked,
//! paginated response with paths rebased to the caller's point of view.
//!
//! ## Core Concepts
//!
//! - **Structured Query**: Field clauses passed through, free text turned into a wildcard name match
//! - **Scope**: The ordered spaces a request searches; grants are only reached through mountpoints
//! - **Rebase**: Prefix and identity rewrite applied to matches found under a mountpoint's grant
//! - **Merge**: Global score ranking with deterministic ties, deduplication and paging
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fedsearch_engine::SearchEngine;
//! use fedsearch_types::{SearchRequest, UserRef};
//! use tokio_util::sync::CancellationToken;
//!
//! let engine = SearchEngine::new(space_provider, path_resolver, index_client);
//! let response = engine
//!     .search(
//!         &CancellationToken::new(),
//!         &UserRef::new("einstein"),
//!         &SearchRequest::new("relativity.pdf").with_page_size(20),
//!     )
//!     .await?;
//! ```
//!
//! ## Modules
//!
//! - [`query`]: Query normalization and escaping
//! - [`scope`]: Space resolution and the space/path collaborator traits
//! - [`executor`]: Per-space search and the index collaborator trait
//! - [`merge`]: Ranking, deduplication and paging
//! - [`translate`]: Path and identity rebasing for mountpoints
//! - [`engine`]: The `SearchEngine` entry point

pub mod engine;
pub mod error;
pub mod executor;
pub mod merge;
pub mod query;
pub mod scope;
pub mod translate;

// Re-export main types at crate root
pub use engine::SearchEngine;
pub use error::{EngineError, ErrorCategory};
pub use executor::{
    IndexClient, IndexResponse, MockIndexClient, ScopedQuery, SpaceExecutor, SpaceResults,
};
pub use merge::{merge, merge_page};
pub use query::{
    escape_term, Clause, FieldClause, Operator, QueryNormalizer, StructuredQuery, TextClause,
};
pub use scope::{
    MockPathResolver, MockSpaceProvider, PathResolver, Rebase, ScopedSpace, SpaceProvider,
    SpaceResolver,
};
pub use translate::{rebase_path, translate};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::engine::SearchEngine;
    pub use crate::error::EngineError;
    pub use crate::executor::IndexClient;
    pub use crate::scope::{PathResolver, SpaceProvider};
}
