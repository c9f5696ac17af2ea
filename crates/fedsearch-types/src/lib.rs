//! # fedsearch-types
//!
//! Shared domain types for federated space search.
//!
//! This crate defines the data structures passed between the search engine,
//! its backend collaborators and front ends:
//! - Resource ids: `storage$space!opaque` identity triples and references
//! - Spaces: personal, project, grant and mountpoint spaces
//! - Search: requests, scored matches and the merged response
//! - Settings: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use fedsearch_types::{ResourceId, SearchRequest};
//!
//! let space: ResourceId = "storage$space!space".parse().unwrap();
//! let request = SearchRequest::new("report.pdf").with_page_size(20);
//! assert_eq!(space.opaque_id, "space");
//! assert_eq!(request.page_size, 20);
//! ```

pub mod config;
pub mod error;
pub mod resource;
pub mod search;
pub mod space;

pub use config::{EngineConfig, Settings};
pub use error::{BackendError, TypesError};
pub use resource::{Reference, ResourceId};
pub use search::{Entity, Match, ResourceType, SearchRequest, SearchResponse};
pub use space::{GrantRef, Space, SpaceType, UserRef};
