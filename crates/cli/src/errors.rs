//! CLI error types reported through miette
//!
//! Every variant ends the process with exit code 1.

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific error types with enhanced diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// graphql-inspector reported breaking changes.
    #[error("Breaking changes in GraphQL schema found!")]
    #[diagnostic(
        code(gqli::cli::validation_failed),
        help("Review the reported changes, or pass --no-fail to only report them")
    )]
    ValidationFailed {
        /// Exit status of graphql-inspector, if it exited normally.
        status: Option<i32>,
    },

    /// graphql-inspector could not be started or its output not collected.
    #[error("Error trying to run graphql-inspector ({})", program.display())]
    #[diagnostic(
        code(gqli::cli::launch_failed),
        help("Check that the provisioned runtime is executable on this host")
    )]
    LaunchFailed {
        /// The program that was launched.
        program: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The runtime or tool could not be provisioned.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Provision(#[from] gqli_core::Error),

    /// The repository client could not be set up.
    #[error("Failed to set up the artifact repository client")]
    #[diagnostic(code(gqli::cli::repository))]
    Repository {
        /// The client's failure.
        #[source]
        source: gqli_core::RepositoryError,
    },

    /// Invalid or unusable configuration.
    #[error("Invalid configuration: {message}")]
    #[diagnostic(
        code(gqli::cli::config),
        help("Check gqli.toml and the GQLI_* environment variables")
    )]
    Config {
        /// Description of the problem.
        message: String,
    },
}

impl CliError {
    pub fn launch_failed(program: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LaunchFailed {
            program: program.into(),
            source,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;
