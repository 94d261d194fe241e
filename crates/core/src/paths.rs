//! Default locations for gqli data.
//!
//! All functions support environment variable overrides for testing and CI:
//! - `GQLI_LOCAL_REPOSITORY` - Override the local artifact repository

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable overriding the local repository location.
pub const LOCAL_REPOSITORY_ENV: &str = "GQLI_LOCAL_REPOSITORY";

/// Name of the optional project configuration file.
pub const CONFIG_FILE_NAME: &str = "gqli.toml";

/// Get the local repository that downloaded artifacts are stored in.
///
/// Resolution order:
/// 1. `GQLI_LOCAL_REPOSITORY` environment variable
/// 2. `~/.m2/repository`, shared with Maven builds on the same machine
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn local_repository() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(LOCAL_REPOSITORY_ENV)
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| Error::configuration("Could not determine home directory"))?;

    Ok(home.join(".m2").join("repository"))
}

/// The configuration file for a project directory.
#[must_use]
pub fn config_file(project_dir: &Path) -> PathBuf {
    project_dir.join(CONFIG_FILE_NAME)
}
