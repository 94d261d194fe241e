//! Writing downloaded bytes into the local repository.

use gqli_core::RepositoryError;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writer that hashes everything passing through it.
struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Parse a published `.sha256` file: the first whitespace-separated token.
#[must_use]
pub fn parse_checksum(content: &str) -> Option<String> {
    content
        .split_whitespace()
        .next()
        .filter(|token| token.len() == 64 && token.chars().all(|c| c.is_ascii_hexdigit()))
        .map(str::to_ascii_lowercase)
}

/// Copy `reader` into `destination` through a temporary sibling file.
///
/// The destination only ever appears complete: bytes land in
/// `.<name>.<uuid>.part` first and are renamed into place after the optional
/// checksum matched.
///
/// # Errors
///
/// Returns [`RepositoryError::ChecksumMismatch`] when `expected` differs from
/// the received bytes, or [`RepositoryError::Io`] on filesystem failures.
pub fn store(
    mut reader: impl Read,
    destination: &Path,
    source_url: &str,
    expected: Option<&str>,
) -> Result<(), RepositoryError> {
    let parent = destination.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| RepositoryError::io(parent, e))?;

    let temp = temp_sibling(destination);
    let result = write_verified(&mut reader, &temp, source_url, expected).and_then(|()| {
        std::fs::rename(&temp, destination).map_err(|e| RepositoryError::io(destination, e))
    });
    if result.is_err() {
        let _ = std::fs::remove_file(&temp);
    }
    result
}

fn write_verified(
    reader: &mut impl Read,
    temp: &Path,
    source_url: &str,
    expected: Option<&str>,
) -> Result<(), RepositoryError> {
    let file = File::create(temp).map_err(|e| RepositoryError::io(temp, e))?;
    let mut writer = HashingWriter {
        inner: file,
        hasher: Sha256::new(),
    };
    let bytes = io::copy(reader, &mut writer).map_err(|e| RepositoryError::Transfer {
        url: source_url.to_string(),
        message: e.to_string(),
    })?;
    writer.flush().map_err(|e| RepositoryError::io(temp, e))?;

    let actual = hex::encode(writer.hasher.finalize());
    match expected {
        Some(expected) if !expected.eq_ignore_ascii_case(&actual) => {
            Err(RepositoryError::ChecksumMismatch {
                url: source_url.to_string(),
                expected: expected.to_string(),
                actual,
            })
        }
        Some(_) => {
            debug!(url = %source_url, bytes, "Checksum verified");
            Ok(())
        }
        None => {
            debug!(url = %source_url, bytes, "No checksum published");
            Ok(())
        }
    }
}

fn temp_sibling(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map_or_else(|| "artifact".into(), |n| n.to_string_lossy());
    destination.with_file_name(format!(".{name}.{}.part", uuid::Uuid::new_v4().simple()))
}
