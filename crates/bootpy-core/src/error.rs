//! Failure classes of the provisioning sequence.
//!
//! Every variant is fatal: the wrapper stops before delegating. The delegated
//! process's own exit status is never turned into an error.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

pub type Result<T, E = ProvisionError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Failed to start `{program}` ({step}): {source}")]
    Spawn {
        step: &'static str,
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{step} failed ({status})")]
    CommandFailed {
        step: &'static str,
        status: ExitStatus,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to lock `{}`: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid lock file `{}`: {reason}", path.display())]
    InvalidLockFile { path: PathBuf, reason: String },

    #[error(
        "Refusing to replace `{}`: it is not an environment created by bootpy (no pyvenv.cfg)",
        .0.display()
    )]
    ForeignEnvDir(PathBuf),

    #[error("Project directory `{}` does not exist", .0.display())]
    MissingProjectDir(PathBuf),

    #[error("Invalid value for {key}: {reason}")]
    InvalidConfig { key: &'static str, reason: String },
}

impl ProvisionError {
    /// Wrap an I/O error with a short description of what was being attempted.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
