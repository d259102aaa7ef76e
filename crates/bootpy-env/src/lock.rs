//! Cross-process advisory lock around environment creation.

use std::fs::{File, OpenOptions, TryLockError};
use std::path::{Path, PathBuf};

use bootpy_core::{ProvisionError, Result};
use tracing::{debug, info, warn};

/// Exclusive lock on a file, released when dropped (including on error paths).
#[derive(Debug)]
#[must_use]
pub struct EnvLock {
    file: File,
    path: PathBuf,
}

impl EnvLock {
    /// Block until the lock at `path` is held. Parent directories are created.
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = Self::open(path)?;
        match file.try_lock() {
            Ok(()) => debug!("Acquired lock {}", path.display()),
            Err(TryLockError::WouldBlock) => {
                info!(
                    "Waiting for another bootpy process to finish provisioning ({})",
                    path.display()
                );
                file.lock().map_err(|source| ProvisionError::Lock {
                    path: path.to_path_buf(),
                    source,
                })?;
                debug!("Acquired lock {}", path.display());
            }
            Err(TryLockError::Error(source)) => {
                return Err(ProvisionError::Lock {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Take the lock only if it is free right now.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>> {
        let file = Self::open(path)?;
        match file.try_lock() {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(TryLockError::WouldBlock) => Ok(None),
            Err(TryLockError::Error(source)) => Err(ProvisionError::Lock {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn open(path: &Path) -> Result<File> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ProvisionError::io(format!("Failed to create {}", parent.display()), e)
            })?;
        }
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| ProvisionError::Lock {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl Drop for EnvLock {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            warn!("Failed to release lock {}: {}", self.path.display(), err);
        } else {
            debug!("Released lock {}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_waits_for_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("venv.lock");

        let held = EnvLock::acquire(&path).unwrap();
        assert!(path.exists());
        assert!(EnvLock::try_acquire(&path).unwrap().is_none());

        drop(held);
        let again = EnvLock::try_acquire(&path).unwrap();
        assert!(again.is_some());
    }

    #[test]
    fn test_lock_under_a_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let err = EnvLock::acquire(&blocker.join("venv.lock")).unwrap_err();
        assert!(matches!(err, ProvisionError::Io { .. }));
    }
}
