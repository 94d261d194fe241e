//! Artifact acquisition and extraction cache for gqli.
//!
//! This crate provisions the two things needed to run graphql-inspector:
//! - A pinned node runtime, resolved per host platform and made executable
//! - A pinned graphql-inspector distribution, extracted once per version
//!
//! # Overview
//!
//! ```text
//! Provisioner ──► ArtifactLocator ──► RepositoryClient (injected)
//!      │
//!      └────────► ExtractionCache ──► ArchiveExtractor
//! ```
//!
//! The [`ExtractionCache`] is safe to share between threads and between
//! processes using the same cache directory: archives are unpacked into a
//! private temporary directory and published with a single atomic rename.
//!
//! # Example
//!
//! ```ignore
//! use gqli_core::{Provisioner, Settings};
//!
//! let settings = Settings::load(&project_dir)?;
//! let provisioner = Provisioner::for_project(&settings, &project_dir, client)?;
//! let node = provisioner.runtime_path()?;
//! let cli = provisioner.tool_entrypoint()?;
//! ```

pub mod artifact;
pub mod cache;
pub mod config;
mod error;
pub mod extract;
pub mod locator;
mod locks;
pub mod paths;
pub mod platform;
pub mod provision;

pub use artifact::{ArtifactIdentity, ResolvedArtifact};
pub use cache::{DestinationPolicy, ExtractionCache, directory_name};
pub use config::Settings;
pub use error::{Error, Result};
pub use extract::{ArchiveExtractor, ExtractError, StandardExtractor};
pub use locator::{ArtifactLocator, RemoteRepository, RepositoryClient, RepositoryError};
pub use platform::{PermissionSpec, PlatformFamily, classify};
pub use provision::{Provisioner, Toolchain};
