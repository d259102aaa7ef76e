//! `bootpy-admin provision` / `bootpy-admin reprovision`

use anyhow::{Context, Result};
use bootpy_core::config::ProvisionConfig;
use bootpy_env::{Provisioned, Provisioner};

pub fn cmd_provision(config: &ProvisionConfig) -> Result<()> {
    let provisioned = Provisioner::new(config)
        .ensure()
        .with_context(|| format!("Failed to provision {}", config.env_dir.display()))?;
    report(config, &provisioned);
    Ok(())
}

pub fn cmd_reprovision(config: &ProvisionConfig) -> Result<()> {
    let provisioned = Provisioner::new(config)
        .reprovision()
        .with_context(|| format!("Failed to reprovision {}", config.env_dir.display()))?;
    report(config, &provisioned);
    Ok(())
}

fn report(config: &ProvisionConfig, provisioned: &Provisioned) {
    if provisioned.created {
        eprintln!(
            "✓ Provisioned {} with {} ({})",
            config.env_dir.display(),
            config.package.requirement(),
            provisioned.interpreter.display()
        );
    } else {
        eprintln!("{}: no work to do", config.env_dir.display());
    }
}
