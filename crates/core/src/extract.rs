//! Archive extraction.
//!
//! The extraction cache treats [`ArchiveExtractor::extract_all`] as a primitive
//! that fills one private directory; atomicity across attempts is handled by
//! the cache itself. [`StandardExtractor`] handles zip and gzip-compressed tar
//! archives.

use flate2::read::GzDecoder;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tar::Archive;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Errors from an extraction collaborator.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Filesystem failure while reading the archive or writing entries.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The zip container is corrupt or unsupported.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The archive format could not be determined from the file name.
    #[error("Unsupported archive format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Extracts an archive into a directory.
pub trait ArchiveExtractor: Send + Sync {
    /// Extract every entry of `archive` below `target`.
    ///
    /// `target` exists and is empty when this is called.
    ///
    /// # Errors
    ///
    /// Any failure leaves `target` in an unspecified state.
    fn extract_all(&self, archive: &Path, target: &Path) -> Result<(), ExtractError>;
}

/// Archive container formats understood by [`StandardExtractor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// PKZIP archive (`.zip`).
    Zip,
    /// Gzip-compressed tarball (`.tar.gz`, `.tgz`).
    TarGz,
}

impl ArchiveFormat {
    /// Detect the format from a file name.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        if name.ends_with(".zip") {
            Some(Self::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else {
            None
        }
    }
}

/// Extractor dispatching on the archive's file extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardExtractor;

impl ArchiveExtractor for StandardExtractor {
    fn extract_all(&self, archive: &Path, target: &Path) -> Result<(), ExtractError> {
        match ArchiveFormat::from_path(archive) {
            Some(ArchiveFormat::Zip) => extract_zip(archive, target),
            Some(ArchiveFormat::TarGz) => extract_tar_gz(archive, target),
            None => Err(ExtractError::UnsupportedFormat(archive.to_path_buf())),
        }
    }
}

/// Extract a zip archive below `target`.
///
/// Entries whose names would escape `target` are skipped.
///
/// # Errors
///
/// Fails on corrupt archives and filesystem errors.
pub fn extract_zip(archive_path: &Path, target: &Path) -> Result<(), ExtractError> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    debug!(archive = ?archive_path, ?target, entries = archive.len(), "Extracting zip archive");

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        let Some(relative) = entry.enclosed_name() else {
            warn!(name = entry.name(), "Skipping zip entry outside extraction root");
            continue;
        };
        let outpath = target.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath)?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&outpath)?;
        io::copy(&mut entry, &mut out)?;
        trace!(path = ?outpath, "Extracted zip entry");

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))?;
        }
    }

    Ok(())
}

/// Extract a gzip-compressed tarball below `target`.
///
/// # Errors
///
/// Fails on corrupt archives and filesystem errors.
pub fn extract_tar_gz(archive_path: &Path, target: &Path) -> Result<(), ExtractError> {
    debug!(archive = ?archive_path, ?target, "Extracting tar.gz archive");
    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);
    archive.unpack(target)?;
    Ok(())
}
