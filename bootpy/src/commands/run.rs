//! The wrapper flow: ensure the environment, then hand over to the package.

use std::ffi::OsString;

use anyhow::{Context, Result};
use bootpy_core::config::ProvisionConfig;
use bootpy_env::{delegate, Provisioner};

/// Provision (if needed) and run the package with `args`. Returns its exit code.
pub fn run(config: &ProvisionConfig, args: &[OsString]) -> Result<i32> {
    let provisioned = Provisioner::new(config)
        .ensure()
        .with_context(|| format!("Failed to provision {}", config.env_dir.display()))?;
    tracing::debug!(
        "Interpreter `{}` ({}), created: {}",
        provisioned.interpreter.display(),
        provisioned.interpreter.source(),
        provisioned.created
    );

    let mut cmd = delegate::command(config, &provisioned.activation, args)?;
    let code = delegate::run(&mut cmd)
        .with_context(|| format!("Failed to run `{}`", config.module))?;
    Ok(code)
}
