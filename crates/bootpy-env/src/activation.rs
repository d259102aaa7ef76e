//! Activation as a value.
//!
//! Instead of sourcing `bin/activate` into the current process, the variables
//! it would set are computed once and applied to each child command.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use bootpy_core::{ProvisionError, Result};

#[cfg(windows)]
const BIN_DIR: &str = "Scripts";
#[cfg(not(windows))]
const BIN_DIR: &str = "bin";

#[cfg(windows)]
const PYTHON_EXE: &str = "python.exe";
#[cfg(not(windows))]
const PYTHON_EXE: &str = "python";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    root: PathBuf,
    bin_dir: PathBuf,
    search_path: OsString,
}

impl Activation {
    /// Activation for `root`, prepending its bin directory to the inherited `PATH`.
    pub fn new(root: &Path) -> Result<Self> {
        Self::with_search_path(root, std::env::var_os("PATH").as_deref())
    }

    pub fn with_search_path(root: &Path, inherited: Option<&OsStr>) -> Result<Self> {
        let bin_dir = root.join(BIN_DIR);
        let mut entries = vec![bin_dir.clone()];
        if let Some(inherited) = inherited {
            entries.extend(std::env::split_paths(inherited));
        }
        let search_path =
            std::env::join_paths(entries).map_err(|e| ProvisionError::InvalidConfig {
                key: bootpy_core::config::env_keys::paths::BOOTPY_ENV_DIR,
                reason: format!("`{}` cannot be placed on PATH: {}", bin_dir.display(), e),
            })?;
        Ok(Self {
            root: root.to_path_buf(),
            bin_dir,
            search_path,
        })
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// The environment's own interpreter.
    pub fn python(&self) -> PathBuf {
        self.bin_dir.join(PYTHON_EXE)
    }

    /// `PATH` value with the environment first.
    pub fn search_path(&self) -> &OsStr {
        &self.search_path
    }

    /// Apply `VIRTUAL_ENV`, `PATH` and unset `PYTHONHOME` on `cmd`.
    pub fn apply<'c>(&self, cmd: &'c mut Command) -> &'c mut Command {
        cmd.env("VIRTUAL_ENV", &self.root)
            .env("PATH", &self.search_path)
            .env_remove("PYTHONHOME")
    }

    /// A command running the environment's interpreter, already activated.
    pub fn python_command(&self) -> Command {
        let mut cmd = Command::new(self.python());
        self.apply(&mut cmd);
        cmd
    }
}
