//! Rewrites grant-relative matches into the caller's view of a mountpoint.
//!
//! Pure functions only; nothing here performs I/O.

use fedsearch_types::Match;

use crate::scope::Rebase;

/// Prepend `prefix` to a space-relative path.
///
/// Both sides may use `./`, `/` or bare relative forms; the result is always
/// `./`-rooted, or `.` for the root itself.
pub fn rebase_path(prefix: &str, path: &str) -> String {
    let joined: Vec<&str> = [prefix, path]
        .into_iter()
        .flat_map(|part| part.split('/'))
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();

    if joined.is_empty() {
        ".".to_string()
    } else {
        format!("./{}", joined.join("/"))
    }
}

/// Translate a match found in a space into the response the caller sees.
///
/// Without a rebase the match is returned unchanged. With one, the
/// reference path gets the grant prefix and the reference root becomes the
/// mountpoint's identity. The entity's own id is left alone.
pub fn translate(mut m: Match, rebase: Option<&Rebase>) -> Match {
    let Some(rebase) = rebase else {
        return m;
    };

    m.entity.reference.path = rebase_path(&rebase.prefix, &m.entity.reference.path);
    m.entity.reference.resource_id = rebase.mount_root.clone();
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedsearch_types::{Entity, Reference, ResourceId};

    fn grant_root() -> ResourceId {
        ResourceId::new("storageproviderid", "spaceid", "otherspacegrant")
    }

    fn mount_root() -> ResourceId {
        ResourceId::new("storageproviderid", "spaceid", "otherspacemountpoint")
    }

    fn shared_match() -> Match {
        Match::new(
            2.0,
            Entity::new(
                ResourceId::new("storageproviderid", "", "grant-shared-id"),
                Reference::new(grant_root(), "./to/Shared.pdf"),
                "Shared.pdf",
            ),
        )
    }

    #[test]
    fn test_rebase_path_forms() {
        assert_eq!(rebase_path("/grant/path", "./to/Shared.pdf"), "./grant/path/to/Shared.pdf");
        assert_eq!(rebase_path("./grant/path/", "to/Shared.pdf"), "./grant/path/to/Shared.pdf");
        assert_eq!(rebase_path("/grant/path", "."), "./grant/path");
        assert_eq!(rebase_path("/grant/path", ""), "./grant/path");
        assert_eq!(rebase_path("/", "./a.txt"), "./a.txt");
        assert_eq!(rebase_path("", ""), ".");
    }

    #[test]
    fn test_without_rebase_is_unchanged() {
        let m = shared_match();
        assert_eq!(translate(m.clone(), None), m);
    }

    #[test]
    fn test_rebases_path_and_identity() {
        let rebase = Rebase {
            prefix: "/grant/path".to_string(),
            mount_root: mount_root(),
        };

        let translated = translate(shared_match(), Some(&rebase));

        assert_eq!(translated.entity.reference.path, "./grant/path/to/Shared.pdf");
        assert_eq!(translated.entity.reference.resource_id, mount_root());
        assert_eq!(translated.entity.id.opaque_id, "grant-shared-id");
        assert_eq!(translated.entity.name, "Shared.pdf");
        assert_eq!(translated.score, 2.0);
    }
}
