//! Project configuration.
//!
//! Settings are read from an optional `gqli.toml` in the project directory.
//! Every key has a default, so a project without the file provisions the
//! pinned toolchain from Maven Central.
//!
//! ```toml
//! runtime-version = "12.13.0"
//! tool-version = "2.9.0"
//! extract-to-build-dir = false
//!
//! [[repositories]]
//! id = "internal"
//! url = "https://nexus.example.com/repository/maven-public"
//!
//! [validate]
//! fail-on-breaking = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::locator::RemoteRepository;
use crate::paths;
use crate::{Error, Result};

/// Pinned runtime (node) version.
pub const DEFAULT_RUNTIME_VERSION: &str = "12.13.0";

/// Pinned graphql-inspector version.
pub const DEFAULT_TOOL_VERSION: &str = "2.9.0";

/// Group the toolchain artifacts are published under.
pub const DEFAULT_GROUP_ID: &str = "com.github.ybroeker.maven.plugins";

/// Artifact the toolchain artifacts are attached to as classified variants.
pub const DEFAULT_ARTIFACT_ID: &str = "graphql-inspector-maven-plugin";

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Settings {
    /// Coordinates the runtime and tool archives are published under.
    pub plugin: PluginCoordinates,
    /// Runtime version embedded in the runtime classifier.
    pub runtime_version: String,
    /// Tool version embedded in the archive classifier.
    pub tool_version: String,
    /// Remote repositories, tried in order.
    pub repositories: Vec<RemoteRepository>,
    /// Local repository override (defaults to [`paths::local_repository`]).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_repository: Option<PathBuf>,
    /// Per-build output directory, relative to the project directory.
    pub build_dir: PathBuf,
    /// Extract release archives into the build directory too.
    pub extract_to_build_dir: bool,
    /// Timeout for a single HTTP transfer, in seconds.
    pub http_timeout_secs: u64,
    /// Settings for the `validate` command.
    pub validate: ValidateSettings,
}

/// Coordinates shared by the runtime and tool artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct PluginCoordinates {
    /// Group id.
    pub group_id: String,
    /// Artifact id.
    pub artifact_id: String,
    /// Version of the published toolchain bundle.
    pub version: String,
}

/// Settings for schema validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ValidateSettings {
    /// Skip validation entirely.
    pub skip: bool,
    /// Fail the run when breaking changes are reported.
    pub fail_on_breaking: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            plugin: PluginCoordinates::default(),
            runtime_version: DEFAULT_RUNTIME_VERSION.to_string(),
            tool_version: DEFAULT_TOOL_VERSION.to_string(),
            repositories: vec![RemoteRepository::central()],
            local_repository: None,
            build_dir: PathBuf::from("target"),
            extract_to_build_dir: false,
            http_timeout_secs: 300,
            validate: ValidateSettings::default(),
        }
    }
}

impl Default for PluginCoordinates {
    fn default() -> Self {
        Self {
            group_id: DEFAULT_GROUP_ID.to_string(),
            artifact_id: DEFAULT_ARTIFACT_ID.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for ValidateSettings {
    fn default() -> Self {
        Self {
            skip: false,
            fail_on_breaking: true,
        }
    }
}

impl Settings {
    /// Load settings for `project_dir`, falling back to defaults when the
    /// project has no configuration file.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be read, parsed or validated.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = paths::config_file(project_dir);
        if !path.is_file() {
            debug!(?path, "No configuration file, using defaults");
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(&path).map_err(|e| Error::io(e, &path, "read"))?;
        let settings = Self::parse(&content).map_err(|e| match e {
            Error::Configuration { message } => {
                Error::configuration(format!("{}: {message}", path.display()))
            }
            other => other,
        })?;
        debug!(?path, "Loaded configuration");
        Ok(settings)
    }

    /// Parse and validate settings from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] on syntax errors, unknown keys or
    /// invalid values.
    pub fn parse(content: &str) -> Result<Self> {
        let settings: Self =
            toml::from_str(content).map_err(|e| Error::configuration(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check the settings for values that cannot work.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("plugin.group-id", &self.plugin.group_id),
            ("plugin.artifact-id", &self.plugin.artifact_id),
            ("plugin.version", &self.plugin.version),
            ("runtime-version", &self.runtime_version),
            ("tool-version", &self.tool_version),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(Error::configuration(format!("'{key}' must not be empty")));
            }
            if !is_path_segment(value) {
                return Err(Error::configuration(format!(
                    "'{key}' must not contain path separators or '..': {value}"
                )));
            }
        }
        for repository in &self.repositories {
            if repository.id.trim().is_empty() || repository.url.trim().is_empty() {
                return Err(Error::configuration(
                    "repositories need both an 'id' and a 'url'",
                ));
            }
        }
        if self.http_timeout_secs == 0 {
            return Err(Error::configuration("'http-timeout-secs' must be positive"));
        }
        Ok(())
    }

    /// The local repository, honouring the override.
    ///
    /// # Errors
    ///
    /// Fails when no override is configured and the home directory is unknown.
    pub fn local_repository(&self) -> Result<PathBuf> {
        match &self.local_repository {
            Some(path) => Ok(path.clone()),
            None => paths::local_repository(),
        }
    }

    /// The build directory resolved against `project_dir`.
    #[must_use]
    pub fn build_dir_in(&self, project_dir: &Path) -> PathBuf {
        if self.build_dir.is_absolute() {
            self.build_dir.clone()
        } else {
            project_dir.join(&self.build_dir)
        }
    }

    /// Timeout for a single HTTP transfer.
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Coordinates end up in repository paths and URLs.
fn is_path_segment(value: &str) -> bool {
    !value.contains(['/', '\\']) && !value.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.runtime_version, "12.13.0");
        assert_eq!(settings.tool_version, "2.9.0");
        assert_eq!(settings.repositories, vec![RemoteRepository::central()]);
        assert!(!settings.extract_to_build_dir);
        assert!(settings.validate.fail_on_breaking);
        assert!(!settings.validate.skip);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_file_keeps_defaults() {
        let settings = Settings::parse(
            r#"
            tool-version = "3.0.0"
            extract-to-build-dir = true

            [validate]
            fail-on-breaking = false
            "#,
        )
        .unwrap();

        assert_eq!(settings.tool_version, "3.0.0");
        assert_eq!(settings.runtime_version, DEFAULT_RUNTIME_VERSION);
        assert!(settings.extract_to_build_dir);
        assert!(!settings.validate.fail_on_breaking);
        assert_eq!(settings.plugin.group_id, DEFAULT_GROUP_ID);
    }

    #[test]
    fn test_parse_repositories() {
        let settings = Settings::parse(
            r#"
            [[repositories]]
            id = "mirror"
            url = "file:///srv/maven"
            "#,
        )
        .unwrap();
        assert_eq!(
            settings.repositories,
            vec![RemoteRepository::new("mirror", "file:///srv/maven")]
        );
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = Settings::parse("tool-verison = \"3.0.0\"").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_empty_version_is_rejected() {
        let err = Settings::parse("runtime-version = \"\"").unwrap_err();
        assert!(err.to_string().contains("runtime-version"));
    }

    #[test]
    fn test_coordinates_escaping_the_repository_are_rejected() {
        for config in [
            "tool-version = \"../x\"",
            "runtime-version = \"12/13\"",
            "[plugin]\nartifact-id = \"a\\\\b\"",
            "[plugin]\nversion = \"..\"",
        ] {
            let err = Settings::parse(config).unwrap_err();
            assert!(err.to_string().contains("path separators"), "{config}: {err}");
        }
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        assert!(Settings::parse("http-timeout-secs = 0").is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        assert_eq!(Settings::load(temp.path()).unwrap(), Settings::default());
    }

    #[test]
    fn test_load_reports_file_path() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("gqli.toml"), "build-dir = 42").unwrap();

        let err = Settings::load(temp.path()).unwrap_err();
        assert!(err.to_string().contains("gqli.toml"));
    }

    #[test]
    fn test_build_dir_resolution() {
        let settings = Settings::default();
        assert_eq!(
            settings.build_dir_in(Path::new("/project")),
            PathBuf::from("/project/target")
        );

        let absolute = Settings {
            build_dir: PathBuf::from("/out"),
            ..Settings::default()
        };
        assert_eq!(absolute.build_dir_in(Path::new("/project")), PathBuf::from("/out"));
    }

    #[test]
    fn test_local_repository_override() {
        let settings = Settings {
            local_repository: Some(PathBuf::from("/srv/m2")),
            ..Settings::default()
        };
        assert_eq!(settings.local_repository().unwrap(), PathBuf::from("/srv/m2"));
    }
}
