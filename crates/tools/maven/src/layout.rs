//! Maven repository layout.

use gqli_core::ArtifactIdentity;
use std::path::PathBuf;

/// Path segments of `identity` below a repository root:
/// `<group path>/<artifactId>/<version>/<file name>`.
#[must_use]
pub fn segments(identity: &ArtifactIdentity) -> Vec<String> {
    identity
        .group_id
        .split('.')
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .chain([
            identity.artifact_id.clone(),
            identity.version.clone(),
            identity.file_name(),
        ])
        .collect()
}

/// Relative filesystem path of `identity` inside a repository.
#[must_use]
pub fn layout_path(identity: &ArtifactIdentity) -> PathBuf {
    segments(identity).iter().collect()
}

/// Relative URL path of `identity` inside a remote repository.
#[must_use]
pub fn url_path(identity: &ArtifactIdentity) -> String {
    segments(identity).join("/")
}

/// Join a repository base URL and a relative artifact path.
#[must_use]
pub fn artifact_url(base: &str, relative: &str) -> String {
    format!("{}/{relative}", base.trim_end_matches('/'))
}
