//! Space resolution.
//!
//! Decides which spaces a search runs against. Grant spaces are never
//! searched on their own; they are reached through the mountpoint that
//! points at them, and the mountpoint contributes the prefix used to rebase
//! the grant's result paths.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fedsearch_types::{BackendError, Reference, ResourceId, Space, SpaceType, UserRef};
use futures::future::try_join_all;
use tracing::{debug, info, warn};

use crate::error::EngineError;

/// Lists the spaces a user can see.
#[async_trait]
pub trait SpaceProvider: Send + Sync {
    /// List spaces visible to `user`. `filters` is passed through untouched.
    async fn list_spaces(
        &self,
        user: &UserRef,
        filters: &BTreeMap<String, String>,
    ) -> Result<Vec<Space>, BackendError>;
}

/// Resolves the absolute path of a resource.
#[async_trait]
pub trait PathResolver: Send + Sync {
    async fn resolve_path(&self, id: &ResourceId) -> Result<String, BackendError>;
}

/// How results found under a mountpoint's grant are made user-relative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rebase {
    /// Absolute path of the grant root, prepended to grant-relative paths
    pub prefix: String,

    /// Identity the caller knows the share by
    pub mount_root: ResourceId,
}

/// A space ready to be searched.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedSpace {
    /// The space as listed for the user
    pub space: Space,

    /// Root the index query runs against (the grant for mountpoints)
    pub search_root: ResourceId,

    /// Sub-path restricting the search, empty for the whole space
    pub path: String,

    /// Set for mountpoints
    pub rebase: Option<Rebase>,
}

impl ScopedSpace {
    /// Scope for a space searched under its own identity.
    pub fn direct(space: Space) -> Self {
        Self {
            search_root: space.root.clone(),
            space,
            path: String::new(),
            rebase: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Returns true if results need rebasing before they reach the caller.
    pub fn is_rebased(&self) -> bool {
        self.rebase.is_some()
    }
}

/// Produces the ordered list of spaces a request searches.
pub struct SpaceResolver<S: SpaceProvider, P: PathResolver> {
    spaces: Arc<S>,
    paths: Arc<P>,
}

impl<S: SpaceProvider, P: PathResolver> SpaceResolver<S, P> {
    pub fn new(spaces: Arc<S>, paths: Arc<P>) -> Self {
        Self { spaces, paths }
    }

    /// Resolve the search scope for `user`.
    ///
    /// With a `reference`, exactly the referenced space is returned, or
    /// `ScopeNotFound` if the user cannot see it. Without one, every visible
    /// space except raw grants is returned in listing order.
    pub async fn resolve(
        &self,
        user: &UserRef,
        reference: Option<&Reference>,
        filters: &BTreeMap<String, String>,
    ) -> Result<Vec<ScopedSpace>, EngineError> {
        let listed = match self.spaces.list_spaces(user, filters).await {
            Ok(spaces) => spaces,
            Err(e) if e.is_not_found() => {
                debug!(user = %user, "Space listing found no spaces");
                Vec::new()
            }
            Err(e) => {
                warn!(user = %user, error = %e, "Space listing failed");
                return Err(EngineError::BackendUnavailable(e.to_string()));
            }
        };

        let mut seen = HashSet::new();
        let visible: Vec<Space> = listed
            .into_iter()
            .filter(|s| s.is_user_visible())
            .filter(|s| seen.insert(s.root.clone()))
            .collect();

        let (selected, sub_path) = match reference {
            Some(reference) => {
                let space = visible
                    .into_iter()
                    .find(|s| s.root == reference.resource_id)
                    .ok_or_else(|| {
                        EngineError::ScopeNotFound(reference.resource_id.to_string())
                    })?;
                (vec![space], reference.path.clone())
            }
            None => (visible, String::new()),
        };

        let scoped = try_join_all(
            selected
                .into_iter()
                .map(|space| self.scope_space(space, sub_path.clone())),
        )
        .await?;

        let scoped: Vec<ScopedSpace> = scoped.into_iter().flatten().collect();

        info!(
            user = %user,
            spaces = scoped.len(),
            mountpoints = scoped.iter().filter(|s| s.is_rebased()).count(),
            pinned = reference.is_some(),
            "Resolved search scope"
        );

        Ok(scoped)
    }

    async fn scope_space(
        &self,
        space: Space,
        path: String,
    ) -> Result<Option<ScopedSpace>, EngineError> {
        if space.space_type != SpaceType::Mountpoint {
            return Ok(Some(ScopedSpace::direct(space).with_path(path)));
        }

        let Some(grant) = space.grant.clone() else {
            warn!(space = %space.root, "Mountpoint has no grant, skipping");
            return Ok(None);
        };

        let prefix = match grant.path {
            Some(path) => path,
            None => self.paths.resolve_path(&grant.id).await.map_err(|e| {
                warn!(grant = %grant.id, error = %e, "Failed to resolve grant path");
                EngineError::BackendUnavailable(e.to_string())
            })?,
        };

        debug!(mountpoint = %space.root, grant = %grant.id, prefix = %prefix, "Scoped mountpoint");

        Ok(Some(ScopedSpace {
            rebase: Some(Rebase {
                prefix,
                mount_root: space.root.clone(),
            }),
            search_root: grant.id,
            space,
            path,
        }))
    }
}

/// Mock space provider for testing.
#[derive(Default)]
pub struct MockSpaceProvider {
    /// Spaces returned for every user
    pub spaces: Vec<Space>,
    /// Error returned instead of spaces
    pub failure: Option<BackendError>,
    /// Filters received, one entry per call
    pub calls: Mutex<Vec<BTreeMap<String, String>>>,
}

impl MockSpaceProvider {
    pub fn with_space(mut self, space: Space) -> Self {
        self.spaces.push(space);
        self
    }

    pub fn with_failure(mut self, error: BackendError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Filters passed to each `list_spaces` call so far.
    pub fn recorded_filters(&self) -> Vec<BTreeMap<String, String>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SpaceProvider for MockSpaceProvider {
    async fn list_spaces(
        &self,
        _user: &UserRef,
        filters: &BTreeMap<String, String>,
    ) -> Result<Vec<Space>, BackendError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(filters.clone());
        }
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(self.spaces.clone()),
        }
    }
}

/// Mock path resolver for testing.
#[derive(Default)]
pub struct MockPathResolver {
    /// Paths by resource id
    pub paths: HashMap<ResourceId, String>,
    /// Error returned for every lookup
    pub failure: Option<BackendError>,
}

impl MockPathResolver {
    pub fn with_path(mut self, id: ResourceId, path: impl Into<String>) -> Self {
        self.paths.insert(id, path.into());
        self
    }

    pub fn with_failure(mut self, error: BackendError) -> Self {
        self.failure = Some(error);
        self
    }
}

#[async_trait]
impl PathResolver for MockPathResolver {
    async fn resolve_path(&self, id: &ResourceId) -> Result<String, BackendError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.paths
            .get(id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(id.to_string()))
    }
}
