//! Interpreter resolution: override → preferred versioned binary → generic fallback.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;

use bootpy_core::config::InterpreterConfig;
use serde::Serialize;

/// Looks a program name up on the search path.
pub trait PathProbe {
    fn find(&self, name: &str) -> Option<PathBuf>;
}

/// Probe backed by `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchPath;

impl PathProbe for SearchPath {
    fn find(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }
}

/// Which rule picked the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpreterSource {
    Override,
    Preferred,
    Fallback,
}

impl fmt::Display for InterpreterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Override => "override",
            Self::Preferred => "preferred",
            Self::Fallback => "fallback",
        })
    }
}

/// The interpreter used to create the environment. Chosen once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    program: OsString,
    source: InterpreterSource,
}

impl Interpreter {
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn source(&self) -> InterpreterSource {
        self.source
    }

    pub fn display(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

/// Resolve the interpreter reference.
///
/// A non-empty override is taken as-is, without checking that it exists or
/// is executable. Otherwise the preferred name is used if the probe finds it,
/// else the fallback name (also unchecked: a missing fallback fails at spawn).
pub fn resolve_interpreter(config: &InterpreterConfig, probe: &impl PathProbe) -> Interpreter {
    if let Some(program) = config.override_program.as_deref().filter(|p| !p.is_empty()) {
        tracing::debug!("Using interpreter override `{}`", program);
        return Interpreter {
            program: program.into(),
            source: InterpreterSource::Override,
        };
    }
    if let Some(path) = probe.find(&config.preferred) {
        tracing::debug!("Found `{}` at {}", config.preferred, path.display());
        return Interpreter {
            program: config.preferred.clone().into(),
            source: InterpreterSource::Preferred,
        };
    }
    tracing::debug!(
        "`{}` not on PATH, falling back to `{}`",
        config.preferred,
        config.fallback
    );
    Interpreter {
        program: config.fallback.clone().into(),
        source: InterpreterSource::Fallback,
    }
}
