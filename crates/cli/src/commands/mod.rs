pub mod print_args;
pub mod validate;

use gqli_core::{Provisioner, Settings};
use gqli_tools_maven::MavenRepositoryClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::cli::Cli;
use crate::errors::{CliError, CliResult};

#[derive(Debug, Clone)]
pub enum Command {
    PrintArgs,
    Validate {
        old_schema: String,
        new_schema: String,
        no_fail: bool,
        skip: bool,
    },
}

/// Project directory and effective settings for one invocation.
#[derive(Debug, Clone)]
pub struct Context {
    pub project_dir: PathBuf,
    pub settings: Settings,
}

impl Context {
    /// Load `gqli.toml` from the project directory and apply flag overrides.
    pub fn load(cli: &Cli) -> CliResult<Self> {
        let project_dir = absolute(&cli.project_dir)?;
        let mut settings = Settings::load(&project_dir).map_err(|e| match e {
            gqli_core::Error::Configuration { message } => CliError::config(message),
            other => CliError::Provision(other),
        })?;

        if let Some(local) = &cli.local_repository {
            settings.local_repository = Some(absolute(local)?);
        }
        if cli.extract_to_build_dir {
            settings.extract_to_build_dir = true;
        }

        debug!(?project_dir, ?settings, "Effective settings");
        Ok(Self {
            project_dir,
            settings,
        })
    }

    /// Provisioner backed by the Maven repository client.
    pub fn provisioner(&self) -> CliResult<Provisioner> {
        let local_repository = self.settings.local_repository()?;
        let client = MavenRepositoryClient::new(local_repository, self.settings.http_timeout())
            .map_err(|source| CliError::Repository { source })?;
        Ok(Provisioner::for_project(
            &self.settings,
            &self.project_dir,
            Arc::new(client),
        )?)
    }
}

fn absolute(path: &Path) -> CliResult<PathBuf> {
    std::path::absolute(path)
        .map_err(|e| CliError::config(format!("cannot resolve {}: {e}", path.display())))
}

/// Run `command`, returning what should be printed to stdout.
pub fn execute(command: Command, context: &Context) -> CliResult<Option<String>> {
    match command {
        Command::PrintArgs => print_args::execute(context).map(Some),
        Command::Validate {
            old_schema,
            new_schema,
            no_fail,
            skip,
        } => {
            let options = validate::Options {
                old_schema,
                new_schema,
                no_fail,
                skip,
            };
            validate::execute(context, &options).map(|()| None)
        }
    }
}
