mod cli;
mod commands;
mod errors;
mod launcher;
mod report;
mod schema;
mod tracing;

use crate::cli::parse;
use crate::commands::{Command, Context};
use crate::tracing::TracingConfig;
use ::tracing::instrument;

#[allow(clippy::print_stderr)]
fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    if let Err(error) = run_main() {
        eprintln!("{error:?}");
        std::process::exit(1);
    }
}

fn run_main() -> miette::Result<()> {
    let cli = parse();

    crate::tracing::init_tracing(TracingConfig {
        format: cli.tracing_format(),
        level: cli.level.into(),
    })?;

    let context = Context::load(&cli)?;
    let command: Command = cli.command.into();
    run_command(command, &context)
}

#[instrument(skip(context))]
#[allow(clippy::print_stdout)]
fn run_command(command: Command, context: &Context) -> miette::Result<()> {
    if let Some(output) = commands::execute(command, context)? {
        println!("{output}");
    }
    Ok(())
}
