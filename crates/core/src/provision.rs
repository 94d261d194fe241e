//! Acquisition of the pinned runtime and tool installation.
//!
//! Both artifacts are published as classified variants of one coordinate:
//!
//! | Artifact | Classifier | Extension |
//! |----------|------------|-----------|
//! | runtime  | `node-<runtime version>-<platform short name>` | `exe` |
//! | tool     | `graphql-inspector-<tool version>` | `zip` |

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::artifact::ArtifactIdentity;
use crate::cache::{DestinationPolicy, ExtractionCache};
use crate::config::Settings;
use crate::extract::{ArchiveExtractor, StandardExtractor};
use crate::locator::{ArtifactLocator, RemoteRepository, RepositoryClient};
use crate::platform::PlatformFamily;
use crate::{Error, Result};

/// Location of the tool's entry script inside an installation directory.
pub const TOOL_ENTRYPOINT: [&str; 4] = [
    "graphql-inspector",
    "node_modules",
    "@graphql-inspector/cli",
    "index.js",
];

/// Which runtime and tool versions to provision, and where they are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Group id of the published bundle.
    pub group_id: String,
    /// Artifact id of the published bundle.
    pub artifact_id: String,
    /// Version of the published bundle.
    pub version: String,
    /// Runtime version embedded in the runtime classifier.
    pub runtime_version: String,
    /// Tool version embedded in the archive classifier.
    pub tool_version: String,
}

impl Toolchain {
    /// The toolchain described by `settings`.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            group_id: settings.plugin.group_id.clone(),
            artifact_id: settings.plugin.artifact_id.clone(),
            version: settings.plugin.version.clone(),
            runtime_version: settings.runtime_version.clone(),
            tool_version: settings.tool_version.clone(),
        }
    }

    /// Identity of the runtime binary for `platform`.
    #[must_use]
    pub fn runtime_identity(&self, platform: PlatformFamily) -> ArtifactIdentity {
        ArtifactIdentity::new(
            &self.group_id,
            &self.artifact_id,
            format!("node-{}-{}", self.runtime_version, platform.short_name()),
            "exe",
            &self.version,
        )
    }

    /// Identity of the tool archive.
    #[must_use]
    pub fn tool_identity(&self) -> ArtifactIdentity {
        ArtifactIdentity::new(
            &self.group_id,
            &self.artifact_id,
            format!("graphql-inspector-{}", self.tool_version),
            "zip",
            &self.version,
        )
    }
}

/// Facade resolving the runtime and materializing the tool.
///
/// Cheap to clone and safe to share between threads.
#[derive(Debug, Clone)]
pub struct Provisioner {
    locator: ArtifactLocator,
    cache: ExtractionCache,
    platform: PlatformFamily,
    toolchain: Toolchain,
    repositories: Vec<RemoteRepository>,
    policy: DestinationPolicy,
}

impl Provisioner {
    /// Create a provisioner from its collaborators.
    #[must_use]
    pub fn new(
        client: Arc<dyn RepositoryClient>,
        extractor: Arc<dyn ArchiveExtractor>,
        platform: PlatformFamily,
        toolchain: Toolchain,
        repositories: Vec<RemoteRepository>,
        policy: DestinationPolicy,
    ) -> Self {
        Self {
            locator: ArtifactLocator::new(client),
            cache: ExtractionCache::new(extractor, platform.permission_policy()),
            platform,
            toolchain,
            repositories,
            policy,
        }
    }

    /// Create a provisioner for a project, detecting the host platform.
    ///
    /// # Errors
    ///
    /// Fails when the host platform is missing or unsupported.
    pub fn for_project(
        settings: &Settings,
        project_dir: &Path,
        client: Arc<dyn RepositoryClient>,
    ) -> Result<Self> {
        let platform = PlatformFamily::current()?;
        let policy = DestinationPolicy::new(settings.build_dir_in(project_dir))
            .with_extract_to_build_dir(settings.extract_to_build_dir);
        Ok(Self::new(
            client,
            Arc::new(StandardExtractor),
            platform,
            Toolchain::from_settings(settings),
            settings.repositories.clone(),
            policy,
        ))
    }

    /// The platform the runtime is provisioned for.
    #[must_use]
    pub fn platform(&self) -> PlatformFamily {
        self.platform
    }

    /// Resolve the runtime binary and make it executable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResolutionFailure`] when the runtime cannot be
    /// resolved and [`Error::PermissionDenied`] when it cannot be made
    /// executable.
    pub fn runtime_path(&self) -> Result<PathBuf> {
        let identity = self.toolchain.runtime_identity(self.platform);
        debug!(%identity, "Resolving runtime artifact");

        let resolved = self.locator.resolve(&identity, &self.repositories)?;
        make_executable(&resolved.path)?;

        debug!(path = ?resolved.path, "Resolved runtime artifact");
        Ok(resolved.path)
    }

    /// Resolve the tool archive and return its extracted directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResolutionFailure`] or [`Error::ExtractionFailure`].
    pub fn tool_installation_dir(&self) -> Result<PathBuf> {
        let identity = self.toolchain.tool_identity();
        debug!(%identity, "Resolving graphql-inspector artifact");

        let resolved = self.locator.resolve(&identity, &self.repositories)?;
        let dir = self.cache.materialize(&resolved, &self.policy)?;

        info!(path = ?dir, version = %self.toolchain.tool_version, "graphql-inspector ready");
        Ok(dir)
    }

    /// Path of the tool's entry script, materializing the tool if needed.
    ///
    /// # Errors
    ///
    /// See [`Provisioner::tool_installation_dir`].
    pub fn tool_entrypoint(&self) -> Result<PathBuf> {
        Ok(entrypoint_in(&self.tool_installation_dir()?))
    }
}

/// The entry script below an installation directory.
#[must_use]
pub fn entrypoint_in(installation_dir: &Path) -> PathBuf {
    TOOL_ENTRYPOINT
        .iter()
        .fold(installation_dir.to_path_buf(), |path, part| path.join(part))
}

/// Grant execute permission to everybody (no-op on Windows).
///
/// # Errors
///
/// Returns [`Error::PermissionDenied`] when the filesystem refuses.
pub fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let denied = |source| Error::PermissionDenied {
            path: path.to_path_buf(),
            source,
        };
        let mut permissions = std::fs::metadata(path).map_err(denied)?.permissions();
        let mode = permissions.mode();
        if mode & 0o111 != 0o111 {
            permissions.set_mode(mode | 0o111);
            std::fs::set_permissions(path, permissions).map_err(denied)?;
        }
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
