//! Extract-once cache for tool archives.
//!
//! An archive is unpacked into a uniquely named temporary sibling of its final
//! directory and then renamed into place. Rename either publishes the fully
//! populated directory in one step or fails because another extractor got there
//! first, so the final directory is never observable half-written and its mere
//! existence proves the extraction completed.
//!
//! Layout:
//! ```text
//! <cache root>/
//! ├── plugin-1.0.0-graphql-inspector-2.9.0-3f9a1c04be21/   # published
//! └── .plugin-1.0.0-graphql-inspector-2.9.0-3f9a1c04be21.<uuid>.tmp/  # orphan of a lost race
//! ```
//!
//! Release archives are extracted next to the archive in the local repository
//! so every build on the machine shares them. Snapshot archives (and all
//! archives when [`DestinationPolicy::extract_to_build_dir`] is set) are
//! extracted under the build directory instead.

use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::artifact::{ArtifactIdentity, ResolvedArtifact};
use crate::extract::ArchiveExtractor;
use crate::locks::PathLocks;
use crate::platform::PermissionSpec;
use crate::{Error, Result};

static EXTRACTION_LOCKS: LazyLock<PathLocks> = LazyLock::new(PathLocks::new);

/// Hex characters of the identity digest appended to directory names.
const DIGEST_LEN: usize = 12;

/// Where extracted archives are placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationPolicy {
    build_dir: PathBuf,
    extract_to_build_dir: bool,
}

impl DestinationPolicy {
    /// Extract release archives next to the archive, snapshots under `build_dir`.
    #[must_use]
    pub fn new(build_dir: impl Into<PathBuf>) -> Self {
        Self {
            build_dir: build_dir.into(),
            extract_to_build_dir: false,
        }
    }

    /// Always extract under the build directory.
    #[must_use]
    pub fn with_extract_to_build_dir(mut self, enabled: bool) -> Self {
        self.extract_to_build_dir = enabled;
        self
    }

    /// Per-build output directory.
    #[must_use]
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Whether every archive is extracted under the build directory.
    #[must_use]
    pub fn extract_to_build_dir(&self) -> bool {
        self.extract_to_build_dir
    }

    /// The directory `archive` is extracted into.
    #[must_use]
    pub fn target_for(&self, archive: &ResolvedArtifact) -> PathBuf {
        let name = directory_name(&archive.identity);
        if self.extract_to_build_dir || archive.snapshot {
            self.build_dir.join(name)
        } else {
            match archive.path.parent() {
                Some(parent) => parent.join(name),
                None => PathBuf::from(name),
            }
        }
    }
}

/// Deterministic cache directory name for an identity.
///
/// The readable `<artifactId>-<version>-<classifier>` prefix is followed by a
/// digest of the length-prefixed fields, so tuples that happen to join to the
/// same string (`("a-b", "c")` vs `("a", "b-c")`) still get distinct names.
#[must_use]
pub fn directory_name(identity: &ArtifactIdentity) -> String {
    let mut hasher = Sha256::new();
    for field in [&identity.artifact_id, &identity.version, &identity.classifier] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    let digest = hex::encode(hasher.finalize());

    let mut readable = vec![identity.artifact_id.as_str(), identity.version.as_str()];
    if !identity.classifier.is_empty() {
        readable.push(identity.classifier.as_str());
    }
    format!(
        "{}-{}",
        sanitize(&readable.join("-")),
        &digest[..DIGEST_LEN]
    )
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Cache that extracts each archive identity exactly once.
#[derive(Clone)]
pub struct ExtractionCache {
    extractor: Arc<dyn ArchiveExtractor>,
    permissions: PermissionSpec,
}

impl std::fmt::Debug for ExtractionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionCache")
            .field("permissions", &self.permissions)
            .finish_non_exhaustive()
    }
}

impl ExtractionCache {
    /// Create a cache using `extractor`, applying `permissions` to every
    /// extracted entry.
    #[must_use]
    pub fn new(extractor: Arc<dyn ArchiveExtractor>, permissions: PermissionSpec) -> Self {
        Self {
            extractor,
            permissions,
        }
    }

    /// Ensure `archive` is extracted and return its directory.
    ///
    /// Safe to call concurrently from threads and from separate processes
    /// sharing the cache directory. Once the directory exists it is returned
    /// without touching the archive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExtractionFailure`] when the temporary directory cannot
    /// be created, the archive cannot be unpacked, or the final rename fails
    /// for a reason other than another extractor having won.
    pub fn materialize(
        &self,
        archive: &ResolvedArtifact,
        policy: &DestinationPolicy,
    ) -> Result<PathBuf> {
        let final_dir = policy.target_for(archive);
        let cache_root = final_dir
            .parent()
            .map_or_else(PathBuf::new, Path::to_path_buf);

        EXTRACTION_LOCKS.with_lock(&cache_root, || {
            if final_dir.is_dir() {
                debug!(path = ?final_dir, "Reusing extracted archive");
                return Ok(final_dir.clone());
            }
            self.extract_and_publish(archive, &final_dir)?;
            Ok(final_dir.clone())
        })
    }

    fn extract_and_publish(&self, archive: &ResolvedArtifact, final_dir: &Path) -> Result<()> {
        let temp_dir = temp_sibling(final_dir);
        let archive_path = archive.path();

        self.permissions
            .create_dir_all(&temp_dir)
            .map_err(|e| Error::extraction(archive_path, "create temporary directory", e))?;

        debug!(archive = ?archive_path, path = ?temp_dir, "Extracting archive");
        self.extractor
            .extract_all(archive_path, &temp_dir)
            .map_err(|e| Error::extraction(archive_path, "unpack archive", e))?;

        self.permissions
            .apply_recursive(&temp_dir)
            .map_err(|e| Error::extraction(archive_path, "set permissions", e))?;

        trace!(from = ?temp_dir, to = ?final_dir, "Publishing extracted archive");
        match std::fs::rename(&temp_dir, final_dir) {
            Ok(()) => {
                debug!(path = ?final_dir, "Extracted archive");
                Ok(())
            }
            Err(e) if is_lost_race(&e, final_dir) => {
                // Another extractor published first; its directory is complete.
                debug!(path = ?final_dir, orphan = ?temp_dir, "Directory already created");
                Ok(())
            }
            Err(e) => Err(Error::extraction(archive_path, "move extracted directory", e)),
        }
    }
}

/// A fresh, collision-free sibling of `final_dir`.
fn temp_sibling(final_dir: &Path) -> PathBuf {
    let name = final_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("extract");
    final_dir.with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4()))
}

/// Whether a failed rename means `final_dir` was already published.
///
/// POSIX reports an occupied directory target as `ENOTEMPTY` (or `EEXIST`);
/// Windows refuses to replace a directory with an access error, so there the
/// target's presence is checked directly.
fn is_lost_race(err: &io::Error, final_dir: &Path) -> bool {
    match err.kind() {
        io::ErrorKind::AlreadyExists | io::ErrorKind::DirectoryNotEmpty => true,
        io::ErrorKind::PermissionDenied => cfg!(windows) && final_dir.is_dir(),
        _ => false,
    }
}
