use tracing::{debug, info, instrument};

use super::Context;
use crate::errors::{CliError, CliResult};
use crate::launcher::{Captured, Invocation};
use crate::{report, schema};

const DIFF_COMMAND: &str = "diff";

#[derive(Debug, Clone)]
pub struct Options {
    pub old_schema: String,
    pub new_schema: String,
    pub no_fail: bool,
    pub skip: bool,
}

/// Run `graphql-inspector diff` and report its findings.
#[instrument(skip(context))]
pub fn execute(context: &Context, options: &Options) -> CliResult<()> {
    let settings = &context.settings.validate;
    if options.skip || settings.skip {
        info!("Skipping plugin execution");
        return Ok(());
    }
    let fail_on_breaking = settings.fail_on_breaking && !options.no_fail;

    let provisioner = context.provisioner()?;
    let runtime = provisioner.runtime_path()?;
    let entrypoint = provisioner.tool_entrypoint()?;

    let timeout = context.settings.http_timeout();
    let old_schema = schema::resolve(&options.old_schema, timeout);
    let new_schema = schema::resolve(&options.new_schema, timeout);

    let invocation = Invocation::new(
        &runtime,
        &entrypoint,
        [
            DIFF_COMMAND.to_string(),
            old_schema.as_str().to_string(),
            new_schema.as_str().to_string(),
        ],
        &context.project_dir,
    );
    let captured = invocation.run()?;

    report::report_stdout(&captured.stdout);
    report::report_stderr(&captured.stderr);
    evaluate(&captured, fail_on_breaking)
}

/// Turn the exit status into the command result.
pub fn evaluate(captured: &Captured, fail_on_breaking: bool) -> CliResult<()> {
    if captured.success {
        return Ok(());
    }
    debug!(status = ?captured.status, "graphql-inspector exit status");
    if fail_on_breaking {
        Err(CliError::ValidationFailed {
            status: captured.status,
        })
    } else {
        Ok(())
    }
}
