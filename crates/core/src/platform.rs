//! Host platform classification.
//!
//! Maps a host identifier such as `"Linux 5.15"` or `"Mac OS X 12.1"` onto one of
//! the supported [`PlatformFamily`] values. Each family carries the short name
//! used in runtime artifact classifiers and the permission policy applied to
//! cache directories, so that several users or build agents sharing a cache
//! volume can all read and execute its contents.

use std::io;
use std::path::Path;
use std::sync::OnceLock;

use tracing::trace;
use walkdir::WalkDir;

use crate::{Error, Result};

/// Environment variable overriding the detected host identifier.
pub const OS_NAME_ENV: &str = "GQLI_OS_NAME";

/// Supported platform families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformFamily {
    /// Linux distributions.
    Linux,
    /// macOS.
    MacOs,
    /// Microsoft Windows.
    Windows,
}

/// Permission bits applied to cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionSpec {
    /// Leave permissions to the platform defaults.
    Inherit,
    /// Set these POSIX mode bits explicitly.
    Mode(u32),
}

struct FamilyInfo {
    family: PlatformFamily,
    prefix: &'static str,
    short_name: &'static str,
    permissions: PermissionSpec,
}

static FAMILIES: [FamilyInfo; 3] = [
    FamilyInfo {
        family: PlatformFamily::Linux,
        prefix: "linux",
        short_name: "linux",
        permissions: PermissionSpec::GLOBAL,
    },
    FamilyInfo {
        family: PlatformFamily::MacOs,
        prefix: "mac os x",
        short_name: "mac_os_x",
        permissions: PermissionSpec::GLOBAL,
    },
    FamilyInfo {
        family: PlatformFamily::Windows,
        prefix: "windows",
        short_name: "windows",
        permissions: PermissionSpec::Inherit,
    },
];

impl PlatformFamily {
    fn info(self) -> &'static FamilyInfo {
        match self {
            Self::Linux => &FAMILIES[0],
            Self::MacOs => &FAMILIES[1],
            Self::Windows => &FAMILIES[2],
        }
    }

    /// Short name used in artifact classifiers (`linux`, `mac_os_x`, `windows`).
    #[must_use]
    pub fn short_name(self) -> &'static str {
        self.info().short_name
    }

    /// Permission policy for directories created in the cache.
    #[must_use]
    pub fn permission_policy(self) -> PermissionSpec {
        self.info().permissions
    }

    /// The family of the running host, detected once per process.
    ///
    /// # Errors
    ///
    /// Fails when the host identifier is missing or unsupported.
    pub fn current() -> Result<Self> {
        static CURRENT: OnceLock<PlatformFamily> = OnceLock::new();
        if let Some(family) = CURRENT.get() {
            return Ok(*family);
        }
        let family = detect(host_os_name().as_deref())?;
        Ok(*CURRENT.get_or_init(|| family))
    }
}

impl std::fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Classify a host identifier by case-insensitive prefix.
///
/// # Errors
///
/// Returns [`Error::UnsupportedPlatform`] when no family prefix matches.
pub fn classify(os_name: &str) -> Result<PlatformFamily> {
    let lowered = os_name.to_lowercase();
    FAMILIES
        .iter()
        .find(|info| lowered.starts_with(info.prefix))
        .map(|info| info.family)
        .ok_or_else(|| Error::UnsupportedPlatform {
            os_name: os_name.to_string(),
        })
}

/// Classify an optional host identifier.
///
/// # Errors
///
/// Returns [`Error::MissingPlatformInfo`] when the identifier is absent or blank.
pub fn detect(os_name: Option<&str>) -> Result<PlatformFamily> {
    match os_name.map(str::trim) {
        None | Some("") => Err(Error::MissingPlatformInfo),
        Some(name) => classify(name),
    }
}

/// The host identifier: [`OS_NAME_ENV`] when set, else derived from the
/// compile target. An empty override yields `None`.
#[must_use]
pub fn host_os_name() -> Option<String> {
    if let Ok(name) = std::env::var(OS_NAME_ENV) {
        return if name.trim().is_empty() {
            None
        } else {
            Some(name)
        };
    }

    let name = match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "Mac OS X",
        "windows" => "Windows",
        other => other,
    };
    Some(name.to_string())
}

impl PermissionSpec {
    /// Read, write and execute for owner, group and other.
    pub const GLOBAL: Self = Self::Mode(0o777);

    /// Create `path` and any missing parents.
    ///
    /// Newly created directories get the mode bits (subject to the umask);
    /// use [`PermissionSpec::apply_recursive`] to force them afterwards.
    ///
    /// # Errors
    ///
    /// Propagates directory creation failures.
    pub fn create_dir_all(self, path: &Path) -> io::Result<()> {
        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        if let Self::Mode(mode) = self {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode);
        }
        builder.create(path)
    }

    /// Apply the mode bits to a single path.
    ///
    /// # Errors
    ///
    /// Propagates `chmod` failures.
    pub fn apply(self, path: &Path) -> io::Result<()> {
        match self {
            Self::Inherit => Ok(()),
            #[cfg(unix)]
            Self::Mode(mode) => {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            }
            #[cfg(not(unix))]
            Self::Mode(_) => {
                let _ = path;
                Ok(())
            }
        }
    }

    /// Apply the mode bits to `root` and every entry below it.
    ///
    /// Symbolic links are not followed.
    ///
    /// # Errors
    ///
    /// Propagates traversal and `chmod` failures.
    pub fn apply_recursive(self, root: &Path) -> io::Result<()> {
        if self == Self::Inherit {
            return Ok(());
        }
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(io::Error::from)?;
            if entry.path_is_symlink() {
                continue;
            }
            trace!(path = ?entry.path(), "Applying cache permissions");
            self.apply(entry.path())?;
        }
        Ok(())
    }
}
