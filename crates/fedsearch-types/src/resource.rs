//! Resource identities and space-relative references.
//!
//! A resource is addressed by a `storage$space!opaque` triple. Storage
//! spaces use the same triple for their root resource, so the textual form
//! doubles as a space identifier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypesError;

const STORAGE_DELIMITER: char = '$';
const SPACE_DELIMITER: char = '!';

/// Identity triple of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ResourceId {
    /// Storage provider holding the resource
    #[serde(default)]
    pub storage_id: String,

    /// Space the resource lives in
    #[serde(default)]
    pub space_id: String,

    /// Opaque id of the resource within its space
    #[serde(default)]
    pub opaque_id: String,
}

impl ResourceId {
    pub fn new(
        storage_id: impl Into<String>,
        space_id: impl Into<String>,
        opaque_id: impl Into<String>,
    ) -> Self {
        Self {
            storage_id: storage_id.into(),
            space_id: space_id.into(),
            opaque_id: opaque_id.into(),
        }
    }

    /// Returns true if no component is set.
    pub fn is_empty(&self) -> bool {
        self.storage_id.is_empty() && self.space_id.is_empty() && self.opaque_id.is_empty()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            self.storage_id, STORAGE_DELIMITER, self.space_id, SPACE_DELIMITER, self.opaque_id
        )
    }
}

impl FromStr for ResourceId {
    type Err = TypesError;

    /// Parse `storage$space!opaque`.
    ///
    /// Missing `$` leaves the storage id empty; missing `!` makes the opaque
    /// id equal to the space id (the id of a space root).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TypesError::InvalidResourceId(
                "resource id must not be empty".to_string(),
            ));
        }

        let (storage_id, rest) = match s.split_once(STORAGE_DELIMITER) {
            Some((storage, rest)) => (storage, rest),
            None => ("", s),
        };

        let (space_id, opaque_id) = match rest.split_once(SPACE_DELIMITER) {
            Some((space, opaque)) => (space, opaque),
            None => (rest, rest),
        };

        if space_id.is_empty() {
            return Err(TypesError::InvalidResourceId(format!(
                "missing space id in '{}'",
                s
            )));
        }

        Ok(Self::new(storage_id, space_id, opaque_id))
    }
}

/// A space-scoped reference: the space root plus a path relative to it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reference {
    /// Root of the space the path is relative to
    pub resource_id: ResourceId,

    /// Path relative to the root, in `./a/b` form (empty for the root itself)
    #[serde(default)]
    pub path: String,
}

impl Reference {
    pub fn new(resource_id: ResourceId, path: impl Into<String>) -> Self {
        Self {
            resource_id,
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let id = ResourceId::new("storageid", "personalspace", "personalspace");
        let text = id.to_string();
        assert_eq!(text, "storageid$personalspace!personalspace");
        assert_eq!(text.parse::<ResourceId>().unwrap(), id);
    }

    #[test]
    fn test_parse_without_storage() {
        let id: ResourceId = "spaceid!node".parse().unwrap();
        assert_eq!(id.storage_id, "");
        assert_eq!(id.space_id, "spaceid");
        assert_eq!(id.opaque_id, "node");
    }

    #[test]
    fn test_parse_space_root_shorthand() {
        let id: ResourceId = "storage$spaceid".parse().unwrap();
        assert_eq!(id.space_id, "spaceid");
        assert_eq!(id.opaque_id, "spaceid");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!("".parse::<ResourceId>().is_err());
        assert!("   ".parse::<ResourceId>().is_err());
        assert!("storage$!node".parse::<ResourceId>().is_err());
    }
}
