//! Artifact coordinates and resolution results.

use std::fmt;
use std::path::{Path, PathBuf};

/// Version suffix marking a mutable (snapshot) artifact.
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Coordinates of a single remote file.
///
/// Two identities with identical fields refer to the same bytes (unless the
/// version is a snapshot, see [`ArtifactIdentity::is_snapshot`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactIdentity {
    /// Group the artifact is published under (e.g. `com.example.plugins`).
    pub group_id: String,
    /// Artifact name within the group.
    pub artifact_id: String,
    /// Variant qualifier, empty when the artifact has none.
    pub classifier: String,
    /// File extension (e.g. `zip`, `exe`).
    pub extension: String,
    /// Version string.
    pub version: String,
}

impl ArtifactIdentity {
    /// Create a new identity.
    #[must_use]
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        classifier: impl Into<String>,
        extension: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            classifier: classifier.into(),
            extension: extension.into(),
            version: version.into(),
        }
    }

    /// Whether the version denotes mutable bytes.
    #[must_use]
    pub fn is_snapshot(&self) -> bool {
        self.version.ends_with(SNAPSHOT_SUFFIX)
    }

    /// File name under which the artifact is stored in a repository:
    /// `<artifactId>-<version>[-<classifier>].<extension>`.
    #[must_use]
    pub fn file_name(&self) -> String {
        let mut name = format!("{}-{}", self.artifact_id, self.version);
        if !self.classifier.is_empty() {
            name.push('-');
            name.push_str(&self.classifier);
        }
        if !self.extension.is_empty() {
            name.push('.');
            name.push_str(&self.extension);
        }
        name
    }
}

impl fmt::Display for ArtifactIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.extension)?;
        if !self.classifier.is_empty() {
            write!(f, ":{}", self.classifier)?;
        }
        write!(f, ":{}", self.version)
    }
}

/// An artifact whose bytes are present on local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    /// The requested coordinates.
    pub identity: ArtifactIdentity,
    /// Local file holding the artifact's bytes.
    pub path: PathBuf,
    /// Whether the bytes may change between builds.
    pub snapshot: bool,
}

impl ResolvedArtifact {
    /// Create a resolved artifact, deriving the snapshot flag from the version.
    #[must_use]
    pub fn new(identity: ArtifactIdentity, path: PathBuf) -> Self {
        let snapshot = identity.is_snapshot();
        Self {
            identity,
            path,
            snapshot,
        }
    }

    /// Local file holding the artifact's bytes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_coordinate_notation() {
        let id = ArtifactIdentity::new("com.example", "plugin", "node-12.13.0-linux", "exe", "1.0");
        assert_eq!(id.to_string(), "com.example:plugin:exe:node-12.13.0-linux:1.0");

        let plain = ArtifactIdentity::new("com.example", "plugin", "", "jar", "1.0");
        assert_eq!(plain.to_string(), "com.example:plugin:jar:1.0");
    }

    #[test]
    fn test_file_name() {
        let id = ArtifactIdentity::new("g", "plugin", "graphql-inspector-2.9.0", "zip", "1.2.0");
        assert_eq!(id.file_name(), "plugin-1.2.0-graphql-inspector-2.9.0.zip");

        let plain = ArtifactIdentity::new("g", "plugin", "", "pom", "1.2.0");
        assert_eq!(plain.file_name(), "plugin-1.2.0.pom");
    }

    #[test]
    fn test_snapshot_detection() {
        assert!(ArtifactIdentity::new("g", "a", "", "zip", "1.0-SNAPSHOT").is_snapshot());
        assert!(!ArtifactIdentity::new("g", "a", "", "zip", "1.0").is_snapshot());
        assert!(!ArtifactIdentity::new("g", "a", "", "zip", "SNAPSHOT-1.0").is_snapshot());
    }

    #[test]
    fn test_resolved_artifact_inherits_snapshot_flag() {
        let id = ArtifactIdentity::new("g", "a", "", "zip", "2.0-SNAPSHOT");
        let resolved = ResolvedArtifact::new(id, PathBuf::from("/repo/a.zip"));
        assert!(resolved.snapshot);
        assert_eq!(resolved.path(), Path::new("/repo/a.zip"));
    }
}
