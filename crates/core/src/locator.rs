//! Artifact resolution through an injected repository client.
//!
//! [`RepositoryClient`] is the seam to the code that actually knows a
//! repository protocol (see the `gqli-tools-maven` crate). [`ArtifactLocator`]
//! sequences calls to it, serializing them per local repository root, and
//! collapses every client failure into [`Error::ResolutionFailure`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use thiserror::Error;
use tracing::debug;

use crate::artifact::{ArtifactIdentity, ResolvedArtifact};
use crate::locks::PathLocks;
use crate::{Error, Result};

/// Key used for clients that do not expose a local root.
const SHARED_RESOLUTION_KEY: &str = "<shared>";

static RESOLUTION_LOCKS: LazyLock<PathLocks> = LazyLock::new(PathLocks::new);

/// A remote repository artifacts may be fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteRepository {
    /// Short identifier used in diagnostics (e.g. `central`).
    pub id: String,
    /// Base URL (`https://...` or `file://...`).
    pub url: String,
}

impl RemoteRepository {
    /// Create a repository entry.
    #[must_use]
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }

    /// Maven Central.
    #[must_use]
    pub fn central() -> Self {
        Self::new("central", "https://repo.maven.apache.org/maven2")
    }
}

/// Failures reported by a repository client.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// No repository had the artifact.
    #[error("Artifact {artifact} not found in repositories: {}", attempted.join(", "))]
    NotFound {
        /// The requested artifact.
        artifact: String,
        /// Repository ids that were tried.
        attempted: Vec<String>,
    },

    /// A transfer failed (network error, unexpected status).
    #[error("Failed to transfer {url}: {message}")]
    Transfer {
        /// The URL being fetched.
        url: String,
        /// Description of the failure.
        message: String,
    },

    /// Downloaded bytes do not match the published checksum.
    #[error("Checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The URL that was downloaded.
        url: String,
        /// The published checksum.
        expected: String,
        /// The checksum of the received bytes.
        actual: String,
    },

    /// A repository URL could not be used.
    #[error("Invalid repository URL '{url}': {message}")]
    InvalidRepository {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        message: String,
    },

    /// Local filesystem failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The path being read or written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl RepositoryError {
    /// Create an I/O error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Resolves artifacts into files on local disk.
///
/// Implementations need not be thread-safe internally: [`ArtifactLocator`]
/// never calls [`RepositoryClient::resolve`] concurrently for the same
/// [`RepositoryClient::local_root`].
pub trait RepositoryClient: Send + Sync {
    /// Resolve `identity` from `repositories`, downloading it if needed.
    ///
    /// # Errors
    ///
    /// Returns a [`RepositoryError`] when no repository yields the file.
    fn resolve(
        &self,
        identity: &ArtifactIdentity,
        repositories: &[RemoteRepository],
    ) -> std::result::Result<PathBuf, RepositoryError>;

    /// Directory this client writes downloads into, if any.
    fn local_root(&self) -> Option<&Path> {
        None
    }
}

/// Serializing front-end to a [`RepositoryClient`].
#[derive(Clone)]
pub struct ArtifactLocator {
    client: Arc<dyn RepositoryClient>,
}

impl std::fmt::Debug for ArtifactLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactLocator")
            .field("local_root", &self.client.local_root())
            .finish_non_exhaustive()
    }
}

impl ArtifactLocator {
    /// Wrap a repository client.
    #[must_use]
    pub fn new(client: Arc<dyn RepositoryClient>) -> Self {
        Self { client }
    }

    /// Resolve `identity` into a local file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResolutionFailure`] carrying the identity and the
    /// client's error.
    pub fn resolve(
        &self,
        identity: &ArtifactIdentity,
        repositories: &[RemoteRepository],
    ) -> Result<ResolvedArtifact> {
        let key = self
            .client
            .local_root()
            .map_or_else(|| PathBuf::from(SHARED_RESOLUTION_KEY), Path::to_path_buf);

        debug!(%identity, repositories = repositories.len(), "Resolving artifact");
        let path = RESOLUTION_LOCKS
            .with_lock(&key, || self.client.resolve(identity, repositories))
            .map_err(|source| Error::resolution(identity, source))?;
        debug!(%identity, ?path, "Resolved artifact");

        Ok(ResolvedArtifact::new(identity.clone(), path))
    }
}
