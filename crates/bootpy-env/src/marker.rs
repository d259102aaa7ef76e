//! Completion marker: written only after the whole install sequence succeeded.
//!
//! The marker, not the presence of the environment directory, decides whether
//! provisioning can be skipped.

use std::io::Write;
use std::path::{Path, PathBuf};

use bootpy_core::{ProvisionError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const MARKER_FILE: &str = ".bootpy-complete";

/// Bumped when the environment layout produced by bootpy changes.
pub const MARKER_FORMAT: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMarker {
    pub format: u32,
    /// The pip requirement that was installed.
    pub requirement: String,
    pub interpreter: String,
    pub installer: String,
    pub completed_at: DateTime<Utc>,
}

impl CompletionMarker {
    pub fn new(requirement: &str, interpreter: &str, installer: &str) -> Self {
        Self {
            format: MARKER_FORMAT,
            requirement: requirement.to_string(),
            interpreter: interpreter.to_string(),
            installer: installer.to_string(),
            completed_at: Utc::now(),
        }
    }

    pub fn completed_at_rfc3339(&self) -> String {
        self.completed_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// What the environment directory currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvState {
    /// Marker present and matching the requested requirement.
    Provisioned(CompletionMarker),
    /// Marker present but recorded for another requirement or format.
    Stale(CompletionMarker),
    /// Directory present, marker missing or unreadable (interrupted install).
    Incomplete,
    /// Nothing there yet.
    Absent,
}

impl EnvState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Provisioned(_) => "provisioned",
            Self::Stale(_) => "stale",
            Self::Incomplete => "incomplete",
            Self::Absent => "absent",
        }
    }

    pub fn is_provisioned(&self) -> bool {
        matches!(self, Self::Provisioned(_))
    }

    pub fn marker(&self) -> Option<&CompletionMarker> {
        match self {
            Self::Provisioned(m) | Self::Stale(m) => Some(m),
            Self::Incomplete | Self::Absent => None,
        }
    }
}

pub fn marker_path(env_dir: &Path) -> PathBuf {
    env_dir.join(MARKER_FILE)
}

/// Classify `env_dir` against the requirement about to be installed.
pub fn inspect(env_dir: &Path, requirement: &str) -> EnvState {
    if !env_dir.exists() {
        return EnvState::Absent;
    }
    let path = marker_path(env_dir);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(_) => return EnvState::Incomplete,
    };
    match serde_json::from_str::<CompletionMarker>(&content) {
        Ok(m) if m.format == MARKER_FORMAT && m.requirement == requirement => {
            EnvState::Provisioned(m)
        }
        Ok(m) => EnvState::Stale(m),
        Err(e) => {
            tracing::warn!("Ignoring unreadable marker {}: {}", path.display(), e);
            EnvState::Incomplete
        }
    }
}

/// Write the marker atomically (temp file in the same directory, then rename).
pub fn write(env_dir: &Path, marker: &CompletionMarker) -> Result<()> {
    let path = marker_path(env_dir);
    let json = serde_json::to_string_pretty(marker)
        .map_err(|e| ProvisionError::io("Failed to serialize completion marker", e.into()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(env_dir)
        .map_err(|e| ProvisionError::io(format!("Failed to create temp file in {}", env_dir.display()), e))?;
    tmp.write_all(json.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| ProvisionError::io("Failed to write completion marker", e))?;
    tmp.persist(&path)
        .map_err(|e| ProvisionError::io(format!("Failed to write {}", path.display()), e.error))?;
    tracing::debug!("Wrote completion marker {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQ: &str = "git+https://github.com/cute-engineering/cutekit.git";

    #[test]
    fn test_absent_then_incomplete_then_provisioned() {
        let dir = tempfile::tempdir().unwrap();
        let env_dir = dir.path().join("venv");
        assert_eq!(inspect(&env_dir, REQ), EnvState::Absent);

        std::fs::create_dir_all(env_dir.join("bin")).unwrap();
        assert_eq!(inspect(&env_dir, REQ), EnvState::Incomplete);

        let marker = CompletionMarker::new(REQ, "python3", "ensurepip");
        write(&env_dir, &marker).unwrap();
        let state = inspect(&env_dir, REQ);
        assert!(state.is_provisioned());
        assert_eq!(state.marker(), Some(&marker));
    }

    #[test]
    fn test_other_requirement_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let marker = CompletionMarker::new(REQ, "python3", "ensurepip");
        write(dir.path(), &marker).unwrap();
        let state = inspect(dir.path(), &format!("{}@0.7.5", REQ));
        assert_eq!(state.label(), "stale");
    }

    #[test]
    fn test_old_format_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let mut marker = CompletionMarker::new(REQ, "python3", "ensurepip");
        marker.format = MARKER_FORMAT + 1;
        write(dir.path(), &marker).unwrap();
        assert_eq!(inspect(dir.path(), REQ).label(), "stale");
    }

    #[test]
    fn test_corrupt_marker_is_incomplete() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(marker_path(dir.path()), "{ truncated").unwrap();
        assert_eq!(inspect(dir.path(), REQ), EnvState::Incomplete);
    }
}
