//! Release identity checks.
//!
//! A `(url, sha256)` pair names exactly one immutable artifact, and a
//! `name@version` names exactly one such pair. A new release therefore needs
//! a new url, digest and version together.

use crate::formula::Formula;

/// The identity triple of one published release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub name: String,
    pub version: String,
    pub url: String,
    pub sha256: String,
}

impl Release {
    pub fn of(formula: &Formula) -> Self {
        Self {
            name: formula.name.clone(),
            version: formula.version.clone(),
            url: formula.url.clone(),
            sha256: formula.sha256.to_string(),
        }
    }

    pub fn label(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityConflict {
    /// Same version, different artifact.
    #[error(
        "{name}@{version} is already recorded as {recorded_url} (sha256 {recorded_sha256}); \
         a changed artifact needs a new version"
    )]
    ArtifactChanged {
        name: String,
        version: String,
        recorded_url: String,
        recorded_sha256: String,
    },

    /// New version, same artifact (same sha256, any url).
    #[error(
        "{name}@{version} reuses the artifact of {name}@{recorded_version} ({url}); \
         a new version needs a new url and sha256"
    )]
    VersionReused {
        name: String,
        version: String,
        recorded_version: String,
        url: String,
    },

    /// The url was recorded with another digest.
    #[error("{url} is pinned to sha256 {sha256} by {label} but was recorded with {recorded_sha256} by {recorded_label}")]
    UrlRepointed {
        url: String,
        label: String,
        sha256: String,
        recorded_label: String,
        recorded_sha256: String,
    },
}

/// Check `formula` against releases recorded earlier (install history or
/// other formula files).
pub fn check_release_identity(formula: &Formula, known: &[Release]) -> Result<(), IdentityConflict> {
    let candidate = Release::of(formula);
    for recorded in known {
        if let Some(conflict) = conflict_between(&candidate, recorded) {
            return Err(conflict);
        }
    }
    Ok(())
}

fn conflict_between(candidate: &Release, recorded: &Release) -> Option<IdentityConflict> {
    let same_name = candidate.name == recorded.name;
    let same_version = same_name && candidate.version == recorded.version;
    let same_url = candidate.url == recorded.url;
    let same_sha = candidate.sha256 == recorded.sha256;

    if same_version {
        if same_url && same_sha {
            return None;
        }
        return Some(IdentityConflict::ArtifactChanged {
            name: candidate.name.clone(),
            version: candidate.version.clone(),
            recorded_url: recorded.url.clone(),
            recorded_sha256: recorded.sha256.clone(),
        });
    }
    // The digest names the content, whatever url serves it.
    if same_name && same_sha {
        return Some(IdentityConflict::VersionReused {
            name: candidate.name.clone(),
            version: candidate.version.clone(),
            recorded_version: recorded.version.clone(),
            url: candidate.url.clone(),
        });
    }
    if same_url && !same_sha {
        return Some(IdentityConflict::UrlRepointed {
            url: candidate.url.clone(),
            label: candidate.label(),
            sha256: candidate.sha256.clone(),
            recorded_label: recorded.label(),
            recorded_sha256: recorded.sha256.clone(),
        });
    }
    None
}

/// Check a set of formulae against each other. Each formula is compared with
/// the ones before it, so the first of two conflicting files is the reference.
pub fn audit_formulae(formulae: &[Formula]) -> Vec<IdentityConflict> {
    let mut seen: Vec<Release> = Vec::with_capacity(formulae.len());
    let mut conflicts = Vec::new();
    for formula in formulae {
        if let Err(conflict) = check_release_identity(formula, &seen) {
            tracing::debug!(formula = %formula.label(), "identity conflict: {}", conflict);
            conflicts.push(conflict);
        }
        seen.push(Release::of(formula));
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::sha256_bytes;
    use crate::formula::fixtures::{single_binary, PYGMY_SHA256};

    const URL_020: &str =
        "https://github.com/fubarhouse/pygmy-go/releases/download/v0.2.0/pygmy-go-darwin";
    const URL_021: &str =
        "https://github.com/fubarhouse/pygmy-go/releases/download/v0.2.1/pygmy-go-darwin";

    fn pygmy(version: &str, url: &str, sha256: &str) -> Formula {
        single_binary("pygmy-go", version, url, sha256, "pygmy-go-darwin", "pygmy")
    }

    #[test]
    fn identical_release_is_fine() {
        let f = pygmy("v0.2.0", URL_020, PYGMY_SHA256);
        assert_eq!(check_release_identity(&f, &[Release::of(&f)]), Ok(()));
        assert_eq!(check_release_identity(&f, &[]), Ok(()));
    }

    #[test]
    fn proper_new_release_is_fine() {
        let old = pygmy("v0.2.0", URL_020, PYGMY_SHA256);
        let new = pygmy("v0.2.1", URL_021, &sha256_bytes(b"v0.2.1"));
        assert_eq!(check_release_identity(&new, &[Release::of(&old)]), Ok(()));
    }

    #[test]
    fn version_bump_without_new_artifact_is_rejected() {
        let old = pygmy("v0.2.0", URL_020, PYGMY_SHA256);
        let bumped = pygmy("v0.2.1", URL_020, PYGMY_SHA256);
        assert_eq!(
            check_release_identity(&bumped, &[Release::of(&old)]),
            Err(IdentityConflict::VersionReused {
                name: "pygmy-go".into(),
                version: "v0.2.1".into(),
                recorded_version: "v0.2.0".into(),
                url: URL_020.into(),
            })
        );
    }

    #[test]
    fn version_bump_served_from_mirror_is_rejected() {
        let old = pygmy("v0.2.0", URL_020, PYGMY_SHA256);
        let mirror = "https://mirror.example.com/pygmy-go/v0.2.1/pygmy-go-darwin";
        let bumped = pygmy("v0.2.1", mirror, PYGMY_SHA256);
        assert_eq!(
            check_release_identity(&bumped, &[Release::of(&old)]),
            Err(IdentityConflict::VersionReused {
                name: "pygmy-go".into(),
                version: "v0.2.1".into(),
                recorded_version: "v0.2.0".into(),
                url: mirror.into(),
            })
        );
    }

    #[test]
    fn changed_artifact_under_same_version_is_rejected() {
        let old = pygmy("v0.2.0", URL_020, PYGMY_SHA256);
        let other_sha = sha256_bytes(b"rebuilt");
        let rebuilt = pygmy("v0.2.0", URL_020, &other_sha);
        let err = check_release_identity(&rebuilt, &[Release::of(&old)]).unwrap_err();
        assert!(matches!(err, IdentityConflict::ArtifactChanged { .. }));
        assert!(err.to_string().contains("pygmy-go@v0.2.0"));

        let moved = pygmy("v0.2.0", URL_021, PYGMY_SHA256);
        assert!(matches!(
            check_release_identity(&moved, &[Release::of(&old)]),
            Err(IdentityConflict::ArtifactChanged { .. })
        ));
    }

    #[test]
    fn repointed_url_is_rejected_across_packages() {
        let pygmy_old = pygmy("v0.2.0", URL_020, PYGMY_SHA256);
        let other = single_binary("fork", "1.0", URL_020, &sha256_bytes(b"fork"), "x", "x");
        assert!(matches!(
            check_release_identity(&other, &[Release::of(&pygmy_old)]),
            Err(IdentityConflict::UrlRepointed { .. })
        ));
    }

    #[test]
    fn audit_reports_each_conflicting_file() {
        let formulae = vec![
            pygmy("v0.2.0", URL_020, PYGMY_SHA256),
            pygmy("v0.2.1", URL_021, &sha256_bytes(b"v0.2.1")),
            pygmy("v0.2.2", URL_021, &sha256_bytes(b"v0.2.1")),
            pygmy("v0.2.0", URL_020, PYGMY_SHA256),
        ];
        let conflicts = audit_formulae(&formulae);
        assert_eq!(conflicts.len(), 1);
        assert!(matches!(
            &conflicts[0],
            IdentityConflict::VersionReused { version, recorded_version, .. }
                if version == "v0.2.2" && recorded_version == "v0.2.1"
        ));
    }
}
