//! Running one provisioning step as a child process.

use std::process::Command;

use bootpy_core::{ProvisionError, Result};

/// Run `cmd` with inherited stdio and fail on a non-zero exit.
///
/// The child prints its own diagnostics; the error only names the step.
pub fn run_step(step: &'static str, cmd: &mut Command) -> Result<()> {
    tracing::debug!("{}: {}", step, describe(cmd));
    let status = cmd.status().map_err(|source| ProvisionError::Spawn {
        step,
        program: cmd.get_program().to_string_lossy().into_owned(),
        source,
    })?;
    if status.success() {
        Ok(())
    } else {
        Err(ProvisionError::CommandFailed { step, status })
    }
}

/// Human-readable command line, for logs only.
pub fn describe(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|a| a.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
