//! Running graphql-inspector under the provisioned runtime.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

use crate::errors::{CliError, CliResult};
use crate::schema::render_path;

/// A fully assembled graphql-inspector command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The runtime binary.
    pub program: PathBuf,
    /// Entry script followed by the tool arguments.
    pub args: Vec<String>,
    /// Working directory of the child process.
    pub working_dir: PathBuf,
}

impl Invocation {
    /// `<runtime> <entrypoint> <args...>`, paths rendered with forward slashes.
    pub fn new(
        runtime: &Path,
        entrypoint: &Path,
        tool_args: impl IntoIterator<Item = String>,
        working_dir: &Path,
    ) -> Self {
        let mut args = vec![render_path(entrypoint)];
        args.extend(tool_args);
        Self {
            program: PathBuf::from(render_path(runtime)),
            args,
            working_dir: working_dir.to_path_buf(),
        }
    }

    /// Run to completion, capturing stdout and stderr.
    pub fn run(&self) -> CliResult<Captured> {
        debug!(program = ?self.program, args = ?self.args, "Running graphql-inspector");

        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| CliError::launch_failed(&self.program, e))?;

        Ok(Captured {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
            success: output.status.success(),
        })
    }
}

/// Output of a finished graphql-inspector run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub stdout: String,
    pub stderr: String,
    /// Exit code; `None` when terminated by a signal.
    pub status: Option<i32>,
    pub success: bool,
}
