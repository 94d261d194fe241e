use crate::commands::Command;
use crate::tracing::{LogLevel, TracingFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gqli")]
#[command(about = "Provision a pinned graphql-inspector and check GraphQL schemas for breaking changes")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "info",
        env = "GQLI_LOG_LEVEL",
        value_enum
    )]
    pub level: LogLevel,

    #[arg(
        long,
        global = true,
        help = "Log output format",
        default_value = "compact",
        env = "GQLI_LOG_FORMAT",
        value_enum
    )]
    pub log_format: TracingFormat,

    #[arg(long, global = true, help = "Output logs in JSON format")]
    pub json: bool,

    #[arg(
        short = 'C',
        long,
        global = true,
        help = "Project directory (where gqli.toml lives)",
        default_value = ".",
        env = "GQLI_PROJECT_DIR"
    )]
    pub project_dir: PathBuf,

    #[arg(
        long,
        global = true,
        help = "Local repository artifacts are stored in",
        env = "GQLI_LOCAL_REPOSITORY"
    )]
    pub local_repository: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Always extract graphql-inspector into the build directory",
        env = "GQLI_EXTRACT_TO_BUILD_DIR"
    )]
    pub extract_to_build_dir: bool,
}

impl Cli {
    /// The effective log format; `--json` wins over `--log-format`.
    pub fn tracing_format(&self) -> TracingFormat {
        if self.json {
            TracingFormat::Json
        } else {
            self.log_format
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Provision runtime and tool, then print their paths")]
    PrintArgs,
    #[command(about = "Report breaking changes between two GraphQL schemas")]
    Validate {
        #[arg(long, help = "Schema to compare against", env = "GQLI_OLD_SCHEMA")]
        old_schema: String,
        #[arg(long, help = "Schema to check", env = "GQLI_NEW_SCHEMA")]
        new_schema: String,
        #[arg(long, help = "Report breaking changes without failing")]
        no_fail: bool,
        #[arg(long, help = "Skip validation", env = "GQLI_SKIP")]
        skip: bool,
    },
}

impl From<Commands> for Command {
    fn from(cmd: Commands) -> Self {
        match cmd {
            Commands::PrintArgs => Self::PrintArgs,
            Commands::Validate {
                old_schema,
                new_schema,
                no_fail,
                skip,
            } => Self::Validate {
                old_schema,
                new_schema,
                no_fail,
                skip,
            },
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
