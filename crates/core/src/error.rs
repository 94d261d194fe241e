//! Error types for artifact acquisition and extraction.

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::artifact::ArtifactIdentity;
use crate::extract::ExtractError;
use crate::locator::RepositoryError;

/// Result type for gqli-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while provisioning the runtime and tool artifacts.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The host identifier does not belong to a supported platform family.
    #[error("Unsupported platform '{os_name}'")]
    #[diagnostic(
        code(gqli::platform::unsupported),
        help("Supported platforms are Linux, Mac OS X and Windows")
    )]
    UnsupportedPlatform {
        /// The identifier that failed to classify.
        os_name: String,
    },

    /// No host identifier was available to classify.
    #[error("No platform identifier available for this host")]
    #[diagnostic(
        code(gqli::platform::missing),
        help("Set GQLI_OS_NAME to the host operating system name")
    )]
    MissingPlatformInfo,

    /// No configured repository yielded the artifact.
    #[error("Failed to resolve artifact {identity}")]
    #[diagnostic(
        code(gqli::resolve::failed),
        help("Check the configured repositories and network access")
    )]
    ResolutionFailure {
        /// The artifact that could not be resolved.
        identity: Box<ArtifactIdentity>,
        /// The repository client's failure.
        #[source]
        source: RepositoryError,
    },

    /// The archive could not be extracted into the cache.
    #[error("Failed to {operation} while extracting {}", archive.display())]
    #[diagnostic(
        code(gqli::extract::failed),
        help("The archive may be corrupt or the cache directory may not be writable")
    )]
    ExtractionFailure {
        /// The archive being extracted.
        archive: PathBuf,
        /// The step that failed (e.g. "create temp directory", "unpack archive").
        operation: String,
        /// The underlying failure.
        #[source]
        source: ExtractError,
    },

    /// The filesystem refused to make a file executable.
    #[error("Unable to make file executable: {}", path.display())]
    #[diagnostic(
        code(gqli::fs::permission_denied),
        help("Check that the local repository is writable by the current user")
    )]
    PermissionDenied {
        /// The file that could not be made executable.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    #[diagnostic(code(gqli::config))]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },

    /// I/O error outside of the extraction protocol
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(gqli::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "write", "create")
        operation: String,
    },
}

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create a resolution failure for `identity`.
    #[must_use]
    pub fn resolution(identity: &ArtifactIdentity, source: RepositoryError) -> Self {
        Self::ResolutionFailure {
            identity: Box::new(identity.clone()),
            source,
        }
    }

    /// Create an extraction failure for `archive`.
    #[must_use]
    pub fn extraction(
        archive: impl AsRef<Path>,
        operation: impl Into<String>,
        source: impl Into<ExtractError>,
    ) -> Self {
        Self::ExtractionFailure {
            archive: archive.as_ref().to_path_buf(),
            operation: operation.into(),
            source: source.into(),
        }
    }
}
