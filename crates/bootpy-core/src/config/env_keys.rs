//! Environment variable keys and aliases.
//!
//! The primary variable is always `BOOTPY_*`; aliases keep the variables of
//! the shell bootstrap this tool replaces working.

/// Interpreter selection
pub mod interpreter {
    /// Override: any non-empty value is used as-is, without validation.
    pub const BOOTPY_PYTHON: &str = "BOOTPY_PYTHON";
    pub const PYTHON_ALIASES: &[&str] = &["CUTEKIT_PYTHON"];

    pub const BOOTPY_PREFERRED_PYTHON: &str = "BOOTPY_PREFERRED_PYTHON";
    pub const BOOTPY_FALLBACK_PYTHON: &str = "BOOTPY_FALLBACK_PYTHON";
}

/// Environment root, project directory, lock file
pub mod paths {
    pub const BOOTPY_ENV_DIR: &str = "BOOTPY_ENV_DIR";
    pub const BOOTPY_PROJECT_DIR: &str = "BOOTPY_PROJECT_DIR";
    pub const BOOTPY_LOCK_FILE: &str = "BOOTPY_LOCK_FILE";
}

/// Target package and how it is run
pub mod package {
    pub const BOOTPY_PACKAGE_URL: &str = "BOOTPY_PACKAGE_URL";
    pub const BOOTPY_PACKAGE_REV: &str = "BOOTPY_PACKAGE_REV";
    pub const BOOTPY_MODULE: &str = "BOOTPY_MODULE";
    pub const BOOTPY_MODULE_PATH_VAR: &str = "BOOTPY_MODULE_PATH_VAR";
}

/// Package installer bootstrap
pub mod installer {
    /// `ensurepip` (default) or `get-pip`.
    pub const BOOTPY_INSTALLER: &str = "BOOTPY_INSTALLER";
    pub const BOOTPY_GET_PIP_URL: &str = "BOOTPY_GET_PIP_URL";
    pub const BOOTPY_GET_PIP_SHA256: &str = "BOOTPY_GET_PIP_SHA256";
}

/// Logging
pub mod observability {
    pub const BOOTPY_QUIET: &str = "BOOTPY_QUIET";
    pub const BOOTPY_LOG_LEVEL: &str = "BOOTPY_LOG_LEVEL";
    pub const BOOTPY_LOG_JSON: &str = "BOOTPY_LOG_JSON";
}
