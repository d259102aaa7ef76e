//! `bootpy.lock.json`: pins the package revision and the installer bootstrap checksum.
//!
//! ```json
//! {
//!   "package": { "url": "https://github.com/cute-engineering/cutekit.git", "rev": "0.7.5" },
//!   "installer": { "sha256": "…" }
//! }
//! ```
//!
//! Values present in the lock file take precedence over the environment.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{InstallerKind, ProvisionConfig};
use crate::error::{ProvisionError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LockFile {
    #[serde(default)]
    pub package: Option<LockedPackage>,
    #[serde(default)]
    pub installer: Option<LockedInstaller>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LockedPackage {
    #[serde(default)]
    pub url: Option<String>,
    pub rev: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LockedInstaller {
    #[serde(default)]
    pub url: Option<String>,
    pub sha256: String,
}

impl LockFile {
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ProvisionError::InvalidLockFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(path, &content)
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let lock: Self =
            serde_json::from_str(content).map_err(|e| ProvisionError::InvalidLockFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        if let Some(pkg) = &lock.package {
            if pkg.rev.trim().is_empty() {
                return Err(ProvisionError::InvalidLockFile {
                    path: path.to_path_buf(),
                    reason: "package.rev must not be empty".to_string(),
                });
            }
        }
        if let Some(inst) = &lock.installer {
            if inst.sha256.trim().is_empty() {
                return Err(ProvisionError::InvalidLockFile {
                    path: path.to_path_buf(),
                    reason: "installer.sha256 must not be empty".to_string(),
                });
            }
        }
        Ok(lock)
    }

    /// Overlay the pinned values onto `config`.
    ///
    /// A locked installer always means the get-pip bootstrap: a checksum has
    /// nothing to verify under `ensurepip`.
    pub fn apply(&self, config: &mut ProvisionConfig) {
        if let Some(pkg) = &self.package {
            if let Some(url) = &pkg.url {
                config.package.url = url.clone();
            }
            config.package.rev = Some(pkg.rev.clone());
        }
        if let Some(inst) = &self.installer {
            let url = match (&inst.url, &config.installer) {
                (Some(url), _) => url.clone(),
                (None, InstallerKind::GetPip { url, .. }) => url.clone(),
                (None, InstallerKind::Ensurepip) => {
                    crate::config::schema::DEFAULT_GET_PIP_URL.to_string()
                }
            };
            config.installer = InstallerKind::GetPip {
                url,
                sha256: Some(inst.sha256.clone()),
            };
        }
    }
}

impl ProvisionConfig {
    /// Apply the configured lock file, if any.
    ///
    /// A missing lock file is only an error when it was named explicitly.
    pub fn with_lock_file(mut self) -> Result<Self> {
        let Some(path) = self.lock_file.clone() else {
            return Ok(self);
        };
        if !path.exists() && !self.lock_file_explicit {
            tracing::debug!("Lock file {} vanished, ignoring", path.display());
            return Ok(self);
        }
        let lock = LockFile::read(&path)?;
        tracing::debug!("Applying lock file {}", path.display());
        lock.apply(&mut self);
        Ok(self)
    }
}
