//! bootpy CLI library, shared by the `bootpy` and `bootpy-admin` binaries.

mod cli;
mod commands;
mod observability;

use std::ffi::OsString;

use anyhow::{Context, Result};
use bootpy_core::config::ProvisionConfig;
use clap::Parser;
use cli::{AdminCli, AdminCommand};

/// Resolve configuration from the environment and the optional lock file.
fn load_config() -> Result<ProvisionConfig> {
    ProvisionConfig::from_env()
        .and_then(ProvisionConfig::with_lock_file)
        .context("Failed to resolve configuration")
}

/// The wrapper: provision if needed, then delegate with `args` forwarded verbatim.
///
/// Returns the exit code of the delegated process.
pub fn run_wrapper(args: Vec<OsString>) -> Result<i32> {
    observability::init_tracing();
    let config = load_config()?;
    commands::run::run(&config, &args)
}

/// `bootpy-admin`: parse the command line and dispatch.
pub fn run_admin() -> Result<()> {
    let cli = AdminCli::parse();
    observability::init_tracing();
    let config = ProvisionConfig::from_env()
        .and_then(|config| cli.overrides.resolve(config))
        .context("Failed to resolve configuration")?;

    match cli.command {
        AdminCommand::Status { json } => commands::status::cmd_status(&config, json),
        AdminCommand::Provision => commands::provision::cmd_provision(&config),
        AdminCommand::Reprovision => commands::provision::cmd_reprovision(&config),
        AdminCommand::Clean { dry_run, force } => {
            commands::clean::cmd_clean(&config, dry_run, force)
        }
    }
}
