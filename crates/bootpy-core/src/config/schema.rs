//! Configuration structs, grouped by concern.
//!
//! Loaded once at startup from the environment (plus `.env`) and passed down
//! explicitly.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::env_keys::{installer as inst_keys, interpreter as interp_keys, observability as obv_keys};
use super::env_keys::{package as pkg_keys, paths as path_keys};
use super::loader::{env_bool, env_optional, env_or, EnvLookup};
use crate::error::{ProvisionError, Result};

pub const DEFAULT_PREFERRED_PYTHON: &str = "python3.11";
pub const DEFAULT_FALLBACK_PYTHON: &str = "python3";
pub const DEFAULT_PACKAGE_URL: &str = "https://github.com/cute-engineering/cutekit.git";
pub const DEFAULT_MODULE: &str = "cutekit";
pub const DEFAULT_MODULE_PATH_VAR: &str = "PYTHONPATH";
pub const DEFAULT_GET_PIP_URL: &str = "https://bootstrap.pypa.io/get-pip.py";
pub const DEFAULT_LOCK_FILE_NAME: &str = "bootpy.lock.json";

/// How the interpreter that creates the environment is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterpreterConfig {
    /// Used unconditionally when set.
    pub override_program: Option<String>,
    pub preferred: String,
    pub fallback: String,
}

/// Where the target package comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageSource {
    pub url: String,
    /// Pinned revision (tag, branch or commit). `None` installs the latest revision.
    pub rev: Option<String>,
}

impl PackageSource {
    /// The pip requirement string, e.g. `git+https://host/repo.git@v1.0`.
    pub fn requirement(&self) -> String {
        let base = if self.url.starts_with("git+") {
            self.url.clone()
        } else {
            format!("git+{}", self.url)
        };
        match &self.rev {
            Some(rev) => format!("{}@{}", base, rev),
            None => base,
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.rev.is_some()
    }
}

/// Strategy used to put pip into a fresh environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum InstallerKind {
    /// `python -m ensurepip --upgrade`, no network.
    Ensurepip,
    /// Download and run the get-pip bootstrap script.
    GetPip { url: String, sha256: Option<String> },
}

impl InstallerKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ensurepip => "ensurepip",
            Self::GetPip { .. } => "get-pip",
        }
    }
}

/// Everything the provisioner needs, resolved once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionConfig {
    pub interpreter: InterpreterConfig,
    /// Root of the isolated environment.
    pub env_dir: PathBuf,
    /// Working directory and module search path of the delegated process.
    pub project_dir: PathBuf,
    pub package: PackageSource,
    /// Module run with `python -m`.
    pub module: String,
    /// Variable that receives `project_dir` (normally `PYTHONPATH`).
    pub module_path_var: String,
    pub installer: InstallerKind,
    /// Lock file pinning package revision and bootstrap checksum, if any.
    pub lock_file: Option<PathBuf>,
    /// Whether `lock_file` was named explicitly (a missing explicit file is an error).
    #[serde(skip)]
    pub lock_file_explicit: bool,
}

impl ProvisionConfig {
    /// Resolve from the process environment layered over `<cwd>/.env`.
    pub fn from_env() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| ProvisionError::io("Failed to read current directory", e))?;
        let env = super::loader::load_dotenv(&cwd);
        Self::from_lookup(&env, &cwd)
    }

    /// Resolve from an arbitrary variable source; relative paths are taken against `cwd`.
    pub fn from_lookup(env: &impl EnvLookup, cwd: &Path) -> Result<Self> {
        let interpreter = InterpreterConfig {
            override_program: env_optional(
                env,
                interp_keys::BOOTPY_PYTHON,
                interp_keys::PYTHON_ALIASES,
            ),
            preferred: env_or(env, interp_keys::BOOTPY_PREFERRED_PYTHON, &[], || {
                DEFAULT_PREFERRED_PYTHON.to_string()
            }),
            fallback: env_or(env, interp_keys::BOOTPY_FALLBACK_PYTHON, &[], || {
                DEFAULT_FALLBACK_PYTHON.to_string()
            }),
        };

        let env_dir = env_optional(env, path_keys::BOOTPY_ENV_DIR, &[])
            .map(|p| absolutize(cwd, Path::new(&p)))
            .unwrap_or_else(|| default_env_dir(cwd));

        let project_dir = env_optional(env, path_keys::BOOTPY_PROJECT_DIR, &[])
            .map(|p| absolutize(cwd, Path::new(&p)))
            .unwrap_or_else(|| cwd.to_path_buf());

        let package = PackageSource {
            url: env_or(env, pkg_keys::BOOTPY_PACKAGE_URL, &[], || {
                DEFAULT_PACKAGE_URL.to_string()
            }),
            rev: env_optional(env, pkg_keys::BOOTPY_PACKAGE_REV, &[]),
        };

        let module = env_or(env, pkg_keys::BOOTPY_MODULE, &[], || DEFAULT_MODULE.to_string());
        let module_path_var = env_or(env, pkg_keys::BOOTPY_MODULE_PATH_VAR, &[], || {
            DEFAULT_MODULE_PATH_VAR.to_string()
        });
        if module_path_var.contains('=') {
            return Err(ProvisionError::InvalidConfig {
                key: pkg_keys::BOOTPY_MODULE_PATH_VAR,
                reason: format!("`{}` is not a valid variable name", module_path_var),
            });
        }

        let installer = parse_installer(
            env_optional(env, inst_keys::BOOTPY_INSTALLER, &[]).as_deref(),
            env_or(env, inst_keys::BOOTPY_GET_PIP_URL, &[], || {
                DEFAULT_GET_PIP_URL.to_string()
            }),
            env_optional(env, inst_keys::BOOTPY_GET_PIP_SHA256, &[]),
        )?;

        let (lock_file, lock_file_explicit) =
            match env_optional(env, path_keys::BOOTPY_LOCK_FILE, &[]) {
                Some(p) => (Some(absolutize(cwd, Path::new(&p))), true),
                None => (default_lock_file(&project_dir), false),
            };

        Ok(Self {
            interpreter,
            env_dir,
            project_dir,
            package,
            module,
            module_path_var,
            installer,
            lock_file,
            lock_file_explicit,
        })
    }

    /// Look the default lock file up again after `project_dir` changed.
    ///
    /// An explicitly named lock file is kept as is.
    pub fn relocate_default_lock_file(&mut self) {
        if !self.lock_file_explicit {
            self.lock_file = default_lock_file(&self.project_dir);
        }
    }

    /// Sibling file holding the advisory provisioning lock.
    ///
    /// Lives outside `env_dir` so an incomplete environment can be removed
    /// while the lock is held.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .env_dir
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "venv".into());
        name.push(".lock");
        self.env_dir.with_file_name(name)
    }
}

fn parse_installer(kind: Option<&str>, url: String, sha256: Option<String>) -> Result<InstallerKind> {
    match kind.map(str::to_ascii_lowercase).as_deref() {
        None | Some("ensurepip") => Ok(InstallerKind::Ensurepip),
        Some("get-pip") | Some("get_pip") | Some("getpip") => {
            Ok(InstallerKind::GetPip { url, sha256 })
        }
        Some(other) => Err(ProvisionError::InvalidConfig {
            key: inst_keys::BOOTPY_INSTALLER,
            reason: format!("unknown installer `{}` (expected `ensurepip` or `get-pip`)", other),
        }),
    }
}

fn default_lock_file(project_dir: &Path) -> Option<PathBuf> {
    let candidate = project_dir.join(DEFAULT_LOCK_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

fn default_env_dir(cwd: &Path) -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("bootpy"))
        .unwrap_or_else(|| cwd.join(".bootpy"))
        .join("venv")
}

/// Logging configuration: quiet, log_level, log_json.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
}

impl ObservabilityConfig {
    /// Read once per process from the environment and `.env`.
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| {
            let env = std::env::current_dir()
                .map(|cwd| super::loader::load_dotenv(&cwd))
                .unwrap_or_default();
            Self::from_lookup(&env)
        })
    }

    pub fn from_lookup(env: &impl EnvLookup) -> Self {
        Self {
            quiet: env_bool(env, obv_keys::BOOTPY_QUIET, &[], false),
            log_level: env_or(env, obv_keys::BOOTPY_LOG_LEVEL, &[], || {
                "bootpy=warn".to_string()
            }),
            log_json: env_bool(env, obv_keys::BOOTPY_LOG_JSON, &[], false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let cwd = tempfile::tempdir().unwrap();
        let cfg = ProvisionConfig::from_lookup(&vars(&[]), cwd.path()).unwrap();
        assert_eq!(cfg.interpreter.override_program, None);
        assert_eq!(cfg.interpreter.preferred, "python3.11");
        assert_eq!(cfg.interpreter.fallback, "python3");
        assert_eq!(cfg.project_dir, cwd.path());
        assert_eq!(cfg.module, "cutekit");
        assert_eq!(cfg.module_path_var, "PYTHONPATH");
        assert_eq!(cfg.installer, InstallerKind::Ensurepip);
        assert_eq!(cfg.lock_file, None);
        assert!(cfg.env_dir.ends_with("venv"));
    }

    #[test]
    fn test_relative_paths_resolve_against_cwd() {
        let cwd = tempfile::tempdir().unwrap();
        let cfg = ProvisionConfig::from_lookup(
            &vars(&[("BOOTPY_ENV_DIR", "tools/venv"), ("BOOTPY_PROJECT_DIR", "proj")]),
            cwd.path(),
        )
        .unwrap();
        assert_eq!(cfg.env_dir, cwd.path().join("tools/venv"));
        assert_eq!(cfg.project_dir, cwd.path().join("proj"));
        assert_eq!(cfg.lock_path(), cwd.path().join("tools/venv.lock"));
    }

    #[test]
    fn test_legacy_python_alias() {
        let cwd = tempfile::tempdir().unwrap();
        let cfg = ProvisionConfig::from_lookup(&vars(&[("CUTEKIT_PYTHON", "python3.12")]), cwd.path())
            .unwrap();
        assert_eq!(cfg.interpreter.override_program.as_deref(), Some("python3.12"));

        let cfg = ProvisionConfig::from_lookup(
            &vars(&[("CUTEKIT_PYTHON", "python3.12"), ("BOOTPY_PYTHON", "/opt/py")]),
            cwd.path(),
        )
        .unwrap();
        assert_eq!(cfg.interpreter.override_program.as_deref(), Some("/opt/py"));
    }

    #[test]
    fn test_installer_parsing() {
        let cwd = tempfile::tempdir().unwrap();
        let cfg = ProvisionConfig::from_lookup(
            &vars(&[("BOOTPY_INSTALLER", "get-pip"), ("BOOTPY_GET_PIP_SHA256", "abc")]),
            cwd.path(),
        )
        .unwrap();
        assert_eq!(
            cfg.installer,
            InstallerKind::GetPip {
                url: DEFAULT_GET_PIP_URL.to_string(),
                sha256: Some("abc".to_string()),
            }
        );

        let err = ProvisionConfig::from_lookup(&vars(&[("BOOTPY_INSTALLER", "conda")]), cwd.path())
            .unwrap_err();
        assert!(matches!(err, ProvisionError::InvalidConfig { .. }));
    }

    #[test]
    fn test_default_lock_file_only_when_present() {
        let cwd = tempfile::tempdir().unwrap();
        std::fs::write(cwd.path().join(DEFAULT_LOCK_FILE_NAME), "{}").unwrap();
        let cfg = ProvisionConfig::from_lookup(&vars(&[]), cwd.path()).unwrap();
        assert_eq!(cfg.lock_file, Some(cwd.path().join(DEFAULT_LOCK_FILE_NAME)));
        assert!(!cfg.lock_file_explicit);
    }

    #[test]
    fn test_requirement_rendering() {
        let mut src = PackageSource {
            url: "https://github.com/cute-engineering/cutekit.git".to_string(),
            rev: None,
        };
        assert_eq!(
            src.requirement(),
            "git+https://github.com/cute-engineering/cutekit.git"
        );
        src.rev = Some("0.7.5".to_string());
        assert_eq!(
            src.requirement(),
            "git+https://github.com/cute-engineering/cutekit.git@0.7.5"
        );
        src.url = "git+ssh://git@host/repo.git".to_string();
        assert_eq!(src.requirement(), "git+ssh://git@host/repo.git@0.7.5");
    }

    #[test]
    fn test_observability_defaults() {
        let cfg = ObservabilityConfig::from_lookup(&vars(&[("BOOTPY_QUIET", "1")]));
        assert!(cfg.quiet);
        assert_eq!(cfg.log_level, "bootpy=warn");
        assert!(!cfg.log_json);
    }
}
