//! Storage spaces and the users that own them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resource::ResourceId;

/// Reference to a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UserRef {
    /// Identity provider that issued the id
    #[serde(default)]
    pub idp: String,

    /// Opaque user id
    pub opaque_id: String,
}

impl UserRef {
    pub fn new(opaque_id: impl Into<String>) -> Self {
        Self {
            idp: String::new(),
            opaque_id: opaque_id.into(),
        }
    }

    pub fn with_idp(mut self, idp: impl Into<String>) -> Self {
        self.idp = idp.into();
        self
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.idp.is_empty() {
            write!(f, "{}", self.opaque_id)
        } else {
            write!(f, "{}@{}", self.opaque_id, self.idp)
        }
    }
}

/// Kind of storage space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceType {
    /// A user's home space
    Personal,
    /// A shared project space
    Project,
    /// Internal share bookkeeping, only reachable through a mountpoint
    Grant,
    /// The receiving user's handle onto a grant
    Mountpoint,
    /// Any space type this crate does not know about
    #[serde(other)]
    Other,
}

impl SpaceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpaceType::Personal => "personal",
            SpaceType::Project => "project",
            SpaceType::Grant => "grant",
            SpaceType::Mountpoint => "mountpoint",
            SpaceType::Other => "other",
        }
    }
}

impl fmt::Display for SpaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The grant a mountpoint points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRef {
    /// Identity of the granted resource (the effective search root)
    pub id: ResourceId,

    /// Path of the granted resource within its owner's space, if the
    /// listing already resolved it
    #[serde(default)]
    pub path: Option<String>,
}

impl GrantRef {
    pub fn new(id: ResourceId) -> Self {
        Self { id, path: None }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// A storage space visible to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Space {
    /// Root resource of the space (also the space identifier)
    pub root: ResourceId,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Kind of space
    pub space_type: SpaceType,

    /// Owner, absent for spaces without a single owner
    #[serde(default)]
    pub owner: Option<UserRef>,

    /// For mountpoints: the grant they point at
    #[serde(default)]
    pub grant: Option<GrantRef>,
}

impl Space {
    pub fn new(root: ResourceId, space_type: SpaceType) -> Self {
        Self {
            root,
            name: String::new(),
            space_type,
            owner: None,
            grant: None,
        }
    }

    pub fn personal(root: ResourceId) -> Self {
        Self::new(root, SpaceType::Personal)
    }

    pub fn project(root: ResourceId) -> Self {
        Self::new(root, SpaceType::Project)
    }

    pub fn grant(root: ResourceId) -> Self {
        Self::new(root, SpaceType::Grant)
    }

    pub fn mountpoint(root: ResourceId, grant: GrantRef) -> Self {
        Self::new(root, SpaceType::Mountpoint).with_grant(grant)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_owner(mut self, owner: UserRef) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_grant(mut self, grant: GrantRef) -> Self {
        self.grant = Some(grant);
        self
    }

    /// Returns true if the space may be searched directly by its viewer.
    pub fn is_user_visible(&self) -> bool {
        self.space_type != SpaceType::Grant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_type_serde() {
        let json = serde_json::to_string(&SpaceType::Mountpoint).unwrap();
        assert_eq!(json, "\"mountpoint\"");

        let parsed: SpaceType = serde_json::from_str("\"virtual\"").unwrap();
        assert_eq!(parsed, SpaceType::Other);
    }

    #[test]
    fn test_grant_is_not_user_visible() {
        let grant = Space::grant(ResourceId::new("s", "sp", "g"));
        let personal = Space::personal(ResourceId::new("s", "p", "p"));
        assert!(!grant.is_user_visible());
        assert!(personal.is_user_visible());
    }

    #[test]
    fn test_user_display() {
        assert_eq!(UserRef::new("einstein").to_string(), "einstein");
        assert_eq!(
            UserRef::new("einstein").with_idp("https://idp").to_string(),
            "einstein@https://idp"
        );
    }
}
