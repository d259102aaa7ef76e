//! Build the isolated environment for the target package, exactly once.
//!
//! Sequence under the provisioning lock:
//! marker check → (remove leftovers) → `python -m venv` → installer bootstrap
//! → `pip install` → marker. The marker is written last, so an interrupted
//! run leaves an environment the next run recognises as incomplete.
//!
//! Only directories that look like a virtual environment (`pyvenv.cfg` or a
//! completion marker present) are ever removed. Anything else at the
//! environment path is reported as [`ProvisionError::ForeignEnvDir`].

use std::path::Path;
use std::process::Command;

use bootpy_core::config::ProvisionConfig;
use bootpy_core::{ProvisionError, Result};
use tracing::{debug, warn};

use crate::activation::Activation;
use crate::command::run_step;
use crate::installer;
use crate::interpreter::{resolve_interpreter, Interpreter, PathProbe, SearchPath};
use crate::lock::EnvLock;
use crate::marker::{self, CompletionMarker, EnvState};
use crate::progress;

const PYVENV_CFG: &str = "pyvenv.cfg";

/// Result of [`Provisioner::ensure`].
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub interpreter: Interpreter,
    pub activation: Activation,
    /// `true` when this call created the environment.
    pub created: bool,
}

pub struct Provisioner<'a, P = SearchPath> {
    config: &'a ProvisionConfig,
    probe: P,
}

impl<'a> Provisioner<'a, SearchPath> {
    pub fn new(config: &'a ProvisionConfig) -> Self {
        Self::with_probe(config, SearchPath)
    }
}

impl<'a, P: PathProbe> Provisioner<'a, P> {
    pub fn with_probe(config: &'a ProvisionConfig, probe: P) -> Self {
        Self { config, probe }
    }

    pub fn config(&self) -> &ProvisionConfig {
        self.config
    }

    pub fn interpreter(&self) -> Interpreter {
        resolve_interpreter(&self.config.interpreter, &self.probe)
    }

    /// Current state of the environment, without taking the lock.
    pub fn state(&self) -> EnvState {
        marker::inspect(&self.config.env_dir, &self.config.package.requirement())
    }

    /// Make sure a complete environment exists; create it if not.
    pub fn ensure(&self) -> Result<Provisioned> {
        let interpreter = self.interpreter();
        let _lock = EnvLock::acquire(&self.config.lock_path())?;
        let created = self.ensure_locked(&interpreter)?;
        Ok(Provisioned {
            activation: Activation::new(&self.config.env_dir)?,
            interpreter,
            created,
        })
    }

    /// Drop the existing environment and build it again.
    pub fn reprovision(&self) -> Result<Provisioned> {
        let interpreter = self.interpreter();
        let _lock = EnvLock::acquire(&self.config.lock_path())?;
        self.create(&interpreter)?;
        Ok(Provisioned {
            activation: Activation::new(&self.config.env_dir)?,
            interpreter,
            created: true,
        })
    }

    /// Remove the environment directory. Returns `false` if there was nothing to remove.
    pub fn clean(&self) -> Result<bool> {
        let _lock = EnvLock::acquire(&self.config.lock_path())?;
        if !self.config.env_dir.exists() {
            return Ok(false);
        }
        check_replaceable(&self.config.env_dir)?;
        remove_env_dir(&self.config.env_dir)?;
        Ok(true)
    }

    fn ensure_locked(&self, interpreter: &Interpreter) -> Result<bool> {
        let env_dir = &self.config.env_dir;
        match marker::inspect(env_dir, &self.config.package.requirement()) {
            EnvState::Provisioned(m) => {
                debug!(
                    "Environment {} already provisioned ({})",
                    env_dir.display(),
                    m.completed_at_rfc3339()
                );
                return Ok(false);
            }
            EnvState::Absent => {}
            EnvState::Incomplete => {
                warn!(
                    "Environment {} has no completion marker (interrupted install?); recreating",
                    env_dir.display()
                );
            }
            EnvState::Stale(m) => {
                warn!(
                    "Environment {} was provisioned for `{}`; recreating for `{}`",
                    env_dir.display(),
                    m.requirement,
                    self.config.package.requirement()
                );
            }
        }
        self.create(interpreter)?;
        Ok(true)
    }

    fn create(&self, interpreter: &Interpreter) -> Result<()> {
        let env_dir = &self.config.env_dir;
        progress!("Creating virtual environment...");

        if let Some(parent) = env_dir.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ProvisionError::io(format!("Failed to create {}", parent.display()), e)
            })?;
        }
        clear_env_dir(env_dir)?;
        run_step(
            "create virtual environment",
            Command::new(interpreter.program())
                .args(["-m", "venv", "--without-pip"])
                .arg(env_dir),
        )?;

        let activation = Activation::new(env_dir)?;
        installer::bootstrap_installer(&self.config.installer, &activation)?;
        installer::install_package(&self.config.package, &activation)?;

        marker::write(
            env_dir,
            &CompletionMarker::new(
                &self.config.package.requirement(),
                &interpreter.display(),
                self.config.installer.name(),
            ),
        )?;
        progress!("Virtual environment created.");
        Ok(())
    }
}

/// Whether `env_dir` holds something this crate may delete.
///
/// Absent paths and empty directories pass; otherwise `pyvenv.cfg` or the
/// completion marker must be present.
fn check_replaceable(env_dir: &Path) -> Result<()> {
    let meta = match std::fs::symlink_metadata(env_dir) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(ProvisionError::io(
                format!("Failed to inspect {}", env_dir.display()),
                e,
            ))
        }
    };
    if !meta.is_dir() {
        return Err(ProvisionError::ForeignEnvDir(env_dir.to_path_buf()));
    }
    let mut entries = std::fs::read_dir(env_dir)
        .map_err(|e| ProvisionError::io(format!("Failed to read {}", env_dir.display()), e))?;
    if entries.next().is_none()
        || env_dir.join(PYVENV_CFG).is_file()
        || marker::marker_path(env_dir).is_file()
    {
        Ok(())
    } else {
        Err(ProvisionError::ForeignEnvDir(env_dir.to_path_buf()))
    }
}

/// Make room for `python -m venv`: drop a previous environment, refuse anything else.
fn clear_env_dir(env_dir: &Path) -> Result<()> {
    check_replaceable(env_dir)?;
    remove_env_dir(env_dir)
}

fn remove_env_dir(env_dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(env_dir) {
        Ok(()) => {
            debug!("Removed {}", env_dir.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ProvisionError::io(
            format!("Failed to remove {}", env_dir.display()),
            e,
        )),
    }
}
