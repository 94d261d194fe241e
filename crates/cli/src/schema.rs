//! Schema arguments for `validate`.
//!
//! Remote schema files are downloaded to a temporary file because
//! graphql-inspector treats plain URLs as introspection endpoints.

use std::io;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

const SCHEMA_EXTENSIONS: &[&str] = &[".graphql", ".graphqls", ".gql"];

/// A schema argument ready to be passed to graphql-inspector.
///
/// Holds the downloaded file, if any, so it outlives the tool run.
#[derive(Debug)]
pub struct SchemaArg {
    value: String,
    _download: Option<NamedTempFile>,
}

impl SchemaArg {
    /// An argument passed through unchanged.
    pub fn verbatim(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _download: None,
        }
    }

    /// The argument as rendered on the command line.
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

/// Whether `schema` is an `http(s)` URL of a static schema file.
pub fn is_remote_schema_file(schema: &str) -> bool {
    let is_http = schema.starts_with("http://") || schema.starts_with("https://");
    is_http && SCHEMA_EXTENSIONS.iter().any(|ext| schema.ends_with(ext))
}

/// Resolve a schema argument, downloading remote schema files.
///
/// Download failures are logged and the URL is passed through unchanged.
pub fn resolve(schema: &str, timeout: Duration) -> SchemaArg {
    if !is_remote_schema_file(schema) {
        return SchemaArg::verbatim(schema);
    }
    match download(schema, timeout) {
        Ok(file) => {
            let value = render_path(file.path());
            debug!(url = %schema, path = %value, "Downloaded schema");
            SchemaArg {
                value,
                _download: Some(file),
            }
        }
        Err(e) => {
            warn!(url = %schema, error = %e, "Failed to download schema, passing URL through");
            SchemaArg::verbatim(schema)
        }
    }
}

fn download(url: &str, timeout: Duration) -> io::Result<NamedTempFile> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("gqli/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(io::Error::other)?;
    let mut response = client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(io::Error::other)?;

    let mut file = tempfile::Builder::new()
        .prefix("schema.")
        .suffix(".graphql")
        .tempfile()?;
    io::copy(&mut response, &mut file)?;
    Ok(file)
}

/// Render a path with forward slashes, the form node expects on every host.
pub fn render_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
