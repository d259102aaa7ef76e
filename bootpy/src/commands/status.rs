//! `bootpy-admin status`

use std::path::PathBuf;

use anyhow::Result;
use bootpy_core::config::{InstallerKind, ProvisionConfig};
use bootpy_env::{InterpreterSource, PathProbe, Provisioner};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct StatusReport {
    env_dir: PathBuf,
    project_dir: PathBuf,
    lock_file: Option<PathBuf>,
    interpreter: String,
    interpreter_source: InterpreterSource,
    requirement: String,
    pinned: bool,
    module: String,
    installer: InstallerKind,
    state: &'static str,
    marker: Option<MarkerReport>,
}

#[derive(Debug, Serialize)]
struct MarkerReport {
    requirement: String,
    interpreter: String,
    installer: String,
    completed_at: String,
}

fn build_report<P: PathProbe>(provisioner: &Provisioner<'_, P>) -> StatusReport {
    let config = provisioner.config();
    let interpreter = provisioner.interpreter();
    let state = provisioner.state();
    StatusReport {
        env_dir: config.env_dir.clone(),
        project_dir: config.project_dir.clone(),
        lock_file: config.lock_file.clone(),
        interpreter: interpreter.display(),
        interpreter_source: interpreter.source(),
        requirement: config.package.requirement(),
        pinned: config.package.is_pinned(),
        module: config.module.clone(),
        installer: config.installer.clone(),
        state: state.label(),
        marker: state.marker().map(|m| MarkerReport {
            requirement: m.requirement.clone(),
            interpreter: m.interpreter.clone(),
            installer: m.installer.clone(),
            completed_at: m.completed_at_rfc3339(),
        }),
    }
}

pub fn cmd_status(config: &ProvisionConfig, json: bool) -> Result<()> {
    let report = build_report(&Provisioner::new(config));
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Environment:  {} ({})", report.env_dir.display(), report.state);
    println!("Project:      {}", report.project_dir.display());
    println!(
        "Interpreter:  {} ({})",
        report.interpreter, report.interpreter_source
    );
    println!(
        "Package:      {}{}",
        report.requirement,
        if report.pinned { "" } else { " (unpinned)" }
    );
    println!("Module:       {}", report.module);
    println!("Installer:    {}", config.installer.name());
    if let Some(lock) = &report.lock_file {
        println!("Lock file:    {}", lock.display());
    }
    if let Some(marker) = &report.marker {
        println!();
        println!("Provisioned {} with {}", marker.completed_at, marker.requirement);
        println!("  interpreter: {}, installer: {}", marker.interpreter, marker.installer);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootpy_env::marker::{self, CompletionMarker};
    use std::collections::HashMap;

    struct NoPython;

    impl PathProbe for NoPython {
        fn find(&self, _name: &str) -> Option<PathBuf> {
            None
        }
    }

    #[test]
    fn test_report_for_provisioned_env() {
        let dir = tempfile::tempdir().unwrap();
        let vars: HashMap<String, String> = [
            ("BOOTPY_ENV_DIR", "venv"),
            ("BOOTPY_PACKAGE_REV", "0.7.5"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let cfg = ProvisionConfig::from_lookup(&vars, dir.path()).unwrap();

        let report = build_report(&Provisioner::with_probe(&cfg, NoPython));
        assert_eq!(report.state, "absent");
        assert_eq!(report.interpreter, "python3");
        assert_eq!(report.interpreter_source, InterpreterSource::Fallback);
        assert!(report.pinned);

        std::fs::create_dir_all(&cfg.env_dir).unwrap();
        marker::write(
            &cfg.env_dir,
            &CompletionMarker::new(&cfg.package.requirement(), "python3", "ensurepip"),
        )
        .unwrap();
        let report = build_report(&Provisioner::with_probe(&cfg, NoPython));
        assert_eq!(report.state, "provisioned");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["interpreter_source"], "fallback");
        assert_eq!(json["installer"]["kind"], "ensurepip");
        assert_eq!(
            json["marker"]["requirement"],
            "git+https://github.com/cute-engineering/cutekit.git@0.7.5"
        );
    }
}
