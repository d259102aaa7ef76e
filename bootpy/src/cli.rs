use std::path::PathBuf;

use bootpy_core::config::{InstallerKind, ProvisionConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// bootpy-admin - inspect and manage the environment bootpy provisions
#[derive(Parser, Debug)]
#[command(name = "bootpy-admin")]
#[command(author, version, about, long_about = None)]
pub struct AdminCli {
    #[command(flatten)]
    pub overrides: ConfigOverrides,

    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// Show resolved configuration, chosen interpreter and environment state
    Status {
        /// Print as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Provision the environment if needed, without running the package
    Provision,

    /// Remove the environment and provision it again
    Reprovision,

    /// Remove the environment directory
    Clean {
        /// Only show what would be removed
        #[arg(long, default_value = "false")]
        dry_run: bool,

        /// Skip the confirmation prompt
        #[arg(long, short = 'f', default_value = "false")]
        force: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstallerArg {
    Ensurepip,
    GetPip,
}

/// Flags that take precedence over BOOTPY_* variables and the lock file.
#[derive(Args, Debug, Default)]
pub struct ConfigOverrides {
    /// Interpreter used to create the environment (overrides BOOTPY_PYTHON)
    #[arg(long, global = true, value_name = "PROGRAM")]
    pub python: Option<String>,

    /// Environment root (overrides BOOTPY_ENV_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub env_dir: Option<PathBuf>,

    /// Project directory (overrides BOOTPY_PROJECT_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// Package git URL (overrides BOOTPY_PACKAGE_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub package_url: Option<String>,

    /// Package revision to pin (overrides BOOTPY_PACKAGE_REV)
    #[arg(long, global = true, value_name = "REV")]
    pub package_rev: Option<String>,

    /// Installer bootstrap strategy (overrides BOOTPY_INSTALLER)
    #[arg(long, global = true, value_enum)]
    pub installer: Option<InstallerArg>,
}

impl ConfigOverrides {
    /// Layer the flags and the lock file over `config`.
    ///
    /// The default lock file is looked up in the project directory the flags
    /// select, and the flags are applied again afterwards so they win over it.
    pub fn resolve(&self, mut config: ProvisionConfig) -> bootpy_core::Result<ProvisionConfig> {
        self.apply(&mut config);
        config.relocate_default_lock_file();
        let mut config = config.with_lock_file()?;
        self.apply(&mut config);
        Ok(config)
    }

    pub fn apply(&self, config: &mut ProvisionConfig) {
        if let Some(python) = self.python.as_ref().filter(|p| !p.is_empty()) {
            config.interpreter.override_program = Some(python.clone());
        }
        if let Some(dir) = &self.env_dir {
            config.env_dir = absolute(dir);
        }
        if let Some(dir) = &self.project_dir {
            config.project_dir = absolute(dir);
        }
        if let Some(url) = &self.package_url {
            config.package.url = url.clone();
        }
        if let Some(rev) = &self.package_rev {
            config.package.rev = Some(rev.clone());
        }
        match (self.installer, &config.installer) {
            (Some(InstallerArg::Ensurepip), _) => config.installer = InstallerKind::Ensurepip,
            (Some(InstallerArg::GetPip), InstallerKind::Ensurepip) => {
                config.installer = InstallerKind::GetPip {
                    url: bootpy_core::config::schema::DEFAULT_GET_PIP_URL.to_string(),
                    sha256: None,
                }
            }
            (Some(InstallerArg::GetPip), InstallerKind::GetPip { .. }) | (None, _) => {}
        }
    }
}

fn absolute(path: &std::path::Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
