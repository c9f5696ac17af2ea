//! JSON fixture backend.
//!
//! A fixture file describes the spaces users can see, the absolute paths of
//! granted resources, and the hits each space's index returns. One
//! [`FixtureBackend`] serves all three collaborator traits so the CLI can
//! run the engine without a storage system behind it.
//!
//! ```json
//! {
//!   "spaces": [
//!     { "root": { "storage_id": "s", "space_id": "p", "opaque_id": "p" },
//!       "space_type": "personal", "members": ["einstein"] }
//!   ],
//!   "grant_paths": [],
//!   "hits": [
//!     { "root": { "storage_id": "s", "space_id": "p", "opaque_id": "p" },
//!       "matches": [ { "score": 1.0, "entity": { ... } } ] }
//!   ],
//!   "failing": []
//! }
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use fedsearch_engine::{
    rebase_path, Clause, FieldClause, IndexClient, IndexResponse, Operator, PathResolver,
    ScopedQuery, SpaceProvider, TextClause,
};
use fedsearch_types::{BackendError, Entity, Match, ResourceId, Space, UserRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading a fixture.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Failed to read fixture {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid fixture {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A listed space and the users allowed to see it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSpace {
    #[serde(flatten)]
    pub space: Space,

    /// User ids that see this space; empty means everyone
    #[serde(default)]
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantPath {
    pub id: ResourceId,
    pub path: String,
}

/// Everything one space's index holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureHits {
    pub root: ResourceId,

    #[serde(default)]
    pub matches: Vec<Match>,

    /// Reported total, defaults to the number of matching entries
    #[serde(default)]
    pub total: Option<u64>,
}

/// Contents of a fixture file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub spaces: Vec<FixtureSpace>,

    #[serde(default)]
    pub grant_paths: Vec<GrantPath>,

    #[serde(default)]
    pub hits: Vec<FixtureHits>,

    /// Roots whose index is unreachable
    #[serde(default)]
    pub failing: Vec<ResourceId>,
}

impl Fixture {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| FixtureError::Parse {
            path: display,
            source,
        })
    }
}

/// Space listing, path resolution and index search backed by a [`Fixture`].
pub struct FixtureBackend {
    spaces: Vec<FixtureSpace>,
    grant_paths: HashMap<ResourceId, String>,
    hits: HashMap<ResourceId, FixtureHits>,
    failing: HashSet<ResourceId>,
}

impl FixtureBackend {
    pub fn new(fixture: Fixture) -> Self {
        Self {
            spaces: fixture.spaces,
            grant_paths: fixture
                .grant_paths
                .into_iter()
                .map(|g| (g.id, g.path))
                .collect(),
            hits: fixture
                .hits
                .into_iter()
                .map(|h| (h.root.clone(), h))
                .collect(),
            failing: fixture.failing.into_iter().collect(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        Ok(Self::new(Fixture::load(path)?))
    }
}

#[async_trait]
impl SpaceProvider for FixtureBackend {
    async fn list_spaces(
        &self,
        user: &UserRef,
        filters: &BTreeMap<String, String>,
    ) -> Result<Vec<Space>, BackendError> {
        let wanted_type = filters.get("space_type");
        let spaces: Vec<Space> = self
            .spaces
            .iter()
            .filter(|s| s.members.is_empty() || s.members.contains(&user.opaque_id))
            .filter(|s| wanted_type.map_or(true, |t| s.space.space_type.as_str() == t))
            .map(|s| s.space.clone())
            .collect();

        if spaces.is_empty() {
            return Err(BackendError::NotFound(format!("no spaces for {}", user)));
        }
        Ok(spaces)
    }
}

#[async_trait]
impl PathResolver for FixtureBackend {
    async fn resolve_path(&self, id: &ResourceId) -> Result<String, BackendError> {
        self.grant_paths
            .get(id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl IndexClient for FixtureBackend {
    async fn search(&self, query: &ScopedQuery) -> Result<IndexResponse, BackendError> {
        if self.failing.contains(&query.root) {
            return Err(BackendError::Unavailable(format!(
                "index for {} is unreachable",
                query.root
            )));
        }

        let Some(hits) = self.hits.get(&query.root) else {
            return Err(BackendError::NotFound(query.root.to_string()));
        };

        let mut matches: Vec<Match> = hits
            .matches
            .iter()
            .filter(|m| within(&m.entity.reference.path, &query.path))
            .filter(|m| query.query.clauses.iter().all(|c| clause_matches(c, &m.entity)))
            .cloned()
            .collect();

        let total = hits.total.unwrap_or(matches.len() as u64);
        if query.limit > 0 {
            matches.truncate(query.limit as usize);
        }

        debug!(root = %query.root, returned = matches.len(), total, "Fixture index search");
        Ok(IndexResponse::new(matches, total))
    }
}

fn within(path: &str, scope: &str) -> bool {
    let scope = rebase_path("", scope);
    if scope == "." {
        return true;
    }
    let path = rebase_path("", path);
    path == scope || path.starts_with(&format!("{}/", scope))
}

/// Drop the escaping added during normalization.
fn unescape(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    let mut chars = term.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn clause_matches(clause: &Clause, entity: &Entity) -> bool {
    match clause {
        Clause::Text(TextClause { field, term }) => match field_value(field, entity) {
            Some(value) => value.to_lowercase().contains(&unescape(term)),
            None => true,
        },
        Clause::Field(field) => field_matches(field, entity),
    }
}

fn field_value(field: &str, entity: &Entity) -> Option<String> {
    match field {
        "Name" => Some(entity.name.clone()),
        "MimeType" => Some(entity.mime_type.clone()),
        "Size" => Some(entity.size.to_string()),
        "Etag" => Some(entity.etag.clone()),
        _ => None,
    }
}

/// Numeric comparison when both sides parse, case-insensitive otherwise.
/// Fields the fixture does not model never filter anything out.
fn field_matches(clause: &FieldClause, entity: &Entity) -> bool {
    let Some(actual) = field_value(&clause.field, entity) else {
        return true;
    };
    let expected = unescape(&clause.value);

    if let (Ok(a), Ok(e)) = (actual.parse::<f64>(), expected.parse::<f64>()) {
        return match clause.operator {
            Operator::Match | Operator::Eq => a == e,
            Operator::Lt => a < e,
            Operator::Le => a <= e,
            Operator::Gt => a > e,
            Operator::Ge => a >= e,
        };
    }

    let actual = actual.to_lowercase();
    let expected = expected.to_lowercase();
    match clause.operator {
        Operator::Match => match expected.strip_prefix('*').and_then(|e| e.strip_suffix('*')) {
            Some(inner) => actual.contains(inner),
            None => actual == expected,
        },
        Operator::Eq => actual == expected,
        Operator::Lt => actual < expected,
        Operator::Le => actual <= expected,
        Operator::Gt => actual > expected,
        Operator::Ge => actual >= expected,
    }
}
