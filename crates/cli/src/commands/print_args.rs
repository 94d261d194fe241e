use tracing::instrument;

use super::Context;
use crate::errors::CliResult;

/// Provision both artifacts and render their paths as `key=value` lines.
#[instrument(skip(context))]
pub fn execute(context: &Context) -> CliResult<String> {
    let provisioner = context.provisioner()?;
    let runtime = provisioner.runtime_path()?;
    let entrypoint = provisioner.tool_entrypoint()?;

    Ok(format!(
        "nodeExecutable={}\ngraphqlInspectorBin={}",
        runtime.display(),
        entrypoint.display()
    ))
}
