//! Hand over to the package: `python -m <module> <args...>` inside the environment.

use std::ffi::OsString;
use std::process::{Command, ExitStatus};

use bootpy_core::config::ProvisionConfig;
use bootpy_core::{ProvisionError, Result};

use crate::activation::Activation;
use crate::command::describe;

/// Build the delegated command. Arguments are passed through untouched.
///
/// The project directory becomes the working directory and the value of the
/// module search path variable; only its existence is checked.
pub fn command(
    config: &ProvisionConfig,
    activation: &Activation,
    args: &[OsString],
) -> Result<Command> {
    if !config.project_dir.is_dir() {
        return Err(ProvisionError::MissingProjectDir(config.project_dir.clone()));
    }
    let mut cmd = activation.python_command();
    cmd.arg("-m")
        .arg(&config.module)
        .args(args)
        .current_dir(&config.project_dir)
        .env(&config.module_path_var, &config.project_dir);
    Ok(cmd)
}

/// Run the delegated command with inherited stdio and return the exit code to propagate.
pub fn run(cmd: &mut Command) -> Result<i32> {
    tracing::debug!("Delegating: {}", describe(cmd));
    let status = cmd.status().map_err(|source| ProvisionError::Spawn {
        step: "run package",
        program: cmd.get_program().to_string_lossy().into_owned(),
        source,
    })?;
    let code = exit_code(status);
    tracing::debug!("Delegated process exited with {}", code);
    Ok(code)
}

/// Exit code to report for `status`; death by signal `S` maps to `128 + S` like a shell.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootpy_core::config::{InstallerKind, InterpreterConfig, PackageSource};
    use std::ffi::OsStr;
    use std::path::Path;

    fn config(project_dir: &Path) -> ProvisionConfig {
        ProvisionConfig {
            interpreter: InterpreterConfig {
                override_program: None,
                preferred: "python3.11".to_string(),
                fallback: "python3".to_string(),
            },
            env_dir: project_dir.join("venv"),
            project_dir: project_dir.to_path_buf(),
            package: PackageSource {
                url: "https://example.com/tool.git".to_string(),
                rev: None,
            },
            module: "cutekit".to_string(),
            module_path_var: "PYTHONPATH".to_string(),
            installer: InstallerKind::Ensurepip,
            lock_file: None,
            lock_file_explicit: false,
        }
    }

    #[test]
    fn test_command_forwards_args_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let act = Activation::new(&cfg.env_dir).unwrap();
        let args: Vec<OsString> = ["build", "--target=host", "a b", "$HOME", "*", ""]
            .iter()
            .map(OsString::from)
            .collect();

        let cmd = command(&cfg, &act, &args).unwrap();
        let got: Vec<&OsStr> = cmd.get_args().collect();
        let mut expected: Vec<&OsStr> = vec![OsStr::new("-m"), OsStr::new("cutekit")];
        expected.extend(args.iter().map(OsString::as_os_str));
        assert_eq!(got, expected);
        assert_eq!(cmd.get_current_dir(), Some(dir.path()));
        assert!(cmd
            .get_envs()
            .any(|(k, v)| k == "PYTHONPATH" && v == Some(dir.path().as_os_str())));
    }

    #[test]
    fn test_missing_project_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir.path().join("missing"));
        let act = Activation::new(&cfg.env_dir).unwrap();
        let err = command(&cfg, &act, &[]).unwrap_err();
        assert!(matches!(err, ProvisionError::MissingProjectDir(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_code_transparency() {
        for code in [0, 1, 127] {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", &format!("exit {}", code)]);
            assert_eq!(run(&mut cmd).unwrap(), code);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_maps_to_128_plus() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "kill -TERM $$"]);
        assert_eq!(run(&mut cmd).unwrap(), 128 + 15);
    }
}
