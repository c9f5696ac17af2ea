//! Search requests, index matches and the merged response.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resource::{Reference, ResourceId};

/// Kind of resource an index entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    File,
    Folder,
    #[default]
    #[serde(other)]
    Unknown,
}

/// An indexed resource as reported by the index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Entity {
    /// Identity of the resource itself (used for deduplication)
    pub id: ResourceId,

    /// Where the resource lives, relative to a space root
    pub reference: Reference,

    /// File or folder name
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub etag: String,

    /// Size in bytes
    #[serde(default)]
    pub size: u64,

    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,

    #[serde(default)]
    pub mime_type: String,

    #[serde(default)]
    pub resource_type: ResourceType,

    /// Whether the resource sits in the trash
    #[serde(default)]
    pub deleted: bool,
}

impl Entity {
    pub fn new(id: ResourceId, reference: Reference, name: impl Into<String>) -> Self {
        Self {
            id,
            reference,
            name: name.into(),
            ..Default::default()
        }
    }
}

/// One scored search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Relevance score, higher is more relevant
    pub score: f32,

    pub entity: Entity,
}

impl Match {
    pub fn new(score: f32, entity: Entity) -> Self {
        Self { score, entity }
    }
}

/// A search as submitted by a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text query (required, non-empty)
    pub query: String,

    /// Restrict the search to one space, optionally below a sub-path
    #[serde(default)]
    pub reference: Option<Reference>,

    /// Maximum matches to return, 0 for the configured default
    #[serde(default)]
    pub page_size: u32,

    /// Continuation token returned by a previous response
    #[serde(default)]
    pub page_token: Option<String>,

    /// Opaque filters passed through to the space listing
    #[serde(default)]
    pub space_filters: BTreeMap<String, String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }

    pub fn with_space_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.space_filters.insert(key.into(), value.into());
        self
    }
}

/// Ranked, paginated result of a federated search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Sum of matches reported by every space that answered
    pub total_matches: u64,

    /// Matches of the requested page, best first
    pub matches: Vec<Match>,

    /// Token for the next page, if more ranked matches remain
    #[serde(default)]
    pub next_page_token: Option<String>,

    /// Roots of the spaces whose search failed
    #[serde(default)]
    pub failed_spaces: Vec<ResourceId>,
}

impl SearchResponse {
    pub fn has_results(&self) -> bool {
        !self.matches.is_empty()
    }
}
