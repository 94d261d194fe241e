//! Maven repository client for gqli.
//!
//! Resolves artifacts into a local repository laid out the Maven way,
//! downloading them from an ordered list of remotes when needed. Supports:
//! - `http://` and `https://` remotes through a blocking `reqwest` client
//! - `file://` remotes, copied from disk
//! - Optional `.sha256` checksum verification
//!
//! Release artifacts found in the local repository are served without any
//! network access; snapshot artifacts are always refreshed.

mod layout;
mod transfer;

pub use layout::{artifact_url, layout_path, url_path};
pub use transfer::parse_checksum;

use gqli_core::{ArtifactIdentity, RemoteRepository, RepositoryClient, RepositoryError};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome of asking one remote for an artifact.
enum Fetched {
    Stored,
    Missing,
}

/// [`RepositoryClient`] backed by a Maven-layout local repository.
#[derive(Debug, Clone)]
pub struct MavenRepositoryClient {
    local_repository: PathBuf,
    http: Client,
}

impl MavenRepositoryClient {
    /// Create a client storing artifacts below `local_repository`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Transfer`] when the HTTP client cannot be
    /// initialized (TLS backend failure).
    pub fn new(
        local_repository: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Result<Self, RepositoryError> {
        let http = Client::builder()
            .user_agent(concat!("gqli/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| RepositoryError::Transfer {
                url: String::new(),
                message: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            local_repository: local_repository.into(),
            http,
        })
    }

    /// The local repository root.
    #[must_use]
    pub fn local_repository(&self) -> &Path {
        &self.local_repository
    }

    /// Where `identity` is stored in the local repository.
    #[must_use]
    pub fn local_path(&self, identity: &ArtifactIdentity) -> PathBuf {
        self.local_repository.join(layout_path(identity))
    }

    fn fetch(
        &self,
        repository: &RemoteRepository,
        identity: &ArtifactIdentity,
        destination: &Path,
    ) -> Result<Fetched, RepositoryError> {
        let base = reqwest::Url::parse(&repository.url).map_err(|e| {
            RepositoryError::InvalidRepository {
                url: repository.url.clone(),
                message: e.to_string(),
            }
        })?;

        match base.scheme() {
            "file" => {
                let root = base
                    .to_file_path()
                    .map_err(|()| RepositoryError::InvalidRepository {
                        url: repository.url.clone(),
                        message: "not a local path".to_string(),
                    })?;
                Self::copy_file(&root.join(layout_path(identity)), destination)
            }
            "http" | "https" => {
                let url = artifact_url(&repository.url, &url_path(identity));
                self.download(&url, destination)
            }
            other => Err(RepositoryError::InvalidRepository {
                url: repository.url.clone(),
                message: format!("unsupported scheme '{other}'"),
            }),
        }
    }

    fn copy_file(source: &Path, destination: &Path) -> Result<Fetched, RepositoryError> {
        if !source.is_file() {
            return Ok(Fetched::Missing);
        }
        let checksum_path = PathBuf::from(format!("{}.sha256", source.display()));
        let expected = std::fs::read_to_string(&checksum_path)
            .ok()
            .and_then(|content| parse_checksum(&content));

        let file = std::fs::File::open(source).map_err(|e| RepositoryError::io(source, e))?;
        transfer::store(
            file,
            destination,
            &source.display().to_string(),
            expected.as_deref(),
        )?;
        Ok(Fetched::Stored)
    }

    fn download(&self, url: &str, destination: &Path) -> Result<Fetched, RepositoryError> {
        debug!(%url, "Downloading artifact");
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|e| RepositoryError::Transfer {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Fetched::Missing);
        }
        if !response.status().is_success() {
            return Err(RepositoryError::Transfer {
                url: url.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let expected = self.published_checksum(url);
        transfer::store(response, destination, url, expected.as_deref())?;
        Ok(Fetched::Stored)
    }

    /// The checksum published next to `url`, if any.
    fn published_checksum(&self, url: &str) -> Option<String> {
        let checksum_url = format!("{url}.sha256");
        let response = match self.http.get(&checksum_url).send() {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!(url = %checksum_url, status = %response.status(), "No checksum available");
                return None;
            }
            Err(e) => {
                debug!(url = %checksum_url, error = %e, "Failed to fetch checksum");
                return None;
            }
        };
        response
            .text()
            .ok()
            .and_then(|content| parse_checksum(&content))
    }
}

impl RepositoryClient for MavenRepositoryClient {
    fn resolve(
        &self,
        identity: &ArtifactIdentity,
        repositories: &[RemoteRepository],
    ) -> Result<PathBuf, RepositoryError> {
        let local = self.local_path(identity);
        let snapshot = identity.is_snapshot();

        if !snapshot && local.is_file() {
            debug!(%identity, path = ?local, "Found in local repository");
            return Ok(local);
        }

        let mut attempted = Vec::with_capacity(repositories.len());
        let mut last_error = None;
        for repository in repositories {
            attempted.push(repository.id.clone());
            match self.fetch(repository, identity, &local) {
                Ok(Fetched::Stored) => {
                    info!(%identity, repository = %repository.id, "Downloaded artifact");
                    return Ok(local);
                }
                Ok(Fetched::Missing) => {
                    debug!(%identity, repository = %repository.id, "Artifact not in repository");
                }
                Err(e) => {
                    warn!(%identity, repository = %repository.id, error = %e, "Repository failed");
                    last_error = Some(e);
                }
            }
        }

        if snapshot && local.is_file() {
            warn!(%identity, path = ?local, "Using stale local snapshot");
            return Ok(local);
        }

        Err(last_error.unwrap_or_else(|| RepositoryError::NotFound {
            artifact: identity.to_string(),
            attempted,
        }))
    }

    fn local_root(&self) -> Option<&Path> {
        Some(&self.local_repository)
    }
}
