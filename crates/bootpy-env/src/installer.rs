//! Put pip into a fresh environment, then install the target package with it.

use std::io::{Read, Write};
use std::time::Duration;

use bootpy_core::config::{InstallerKind, PackageSource};
use bootpy_core::{ProvisionError, Result};
use sha2::{Digest, Sha256};

use crate::activation::Activation;
use crate::command::run_step;

/// Upper bound on the bootstrap script size (get-pip.py is ~2.5 MB).
const MAX_BOOTSTRAP_BYTES: u64 = 64 * 1024 * 1024;

/// Install pip into the environment described by `activation`.
pub fn bootstrap_installer(kind: &InstallerKind, activation: &Activation) -> Result<()> {
    match kind {
        InstallerKind::Ensurepip => run_step(
            "bootstrap package installer",
            activation
                .python_command()
                .args(["-m", "ensurepip", "--upgrade"]),
        ),
        InstallerKind::GetPip { url, sha256 } => {
            let script = download(url)?;
            match sha256 {
                Some(expected) => verify_sha256(url, &script, expected)?,
                None => tracing::warn!(
                    "No checksum configured for {}; installer integrity will not be verified",
                    url
                ),
            }
            let mut file = tempfile::Builder::new()
                .prefix("get-pip-")
                .suffix(".py")
                .tempfile()
                .map_err(|e| ProvisionError::io("Failed to create temp file for get-pip", e))?;
            file.write_all(&script)
                .and_then(|()| file.flush())
                .map_err(|e| ProvisionError::io("Failed to write get-pip script", e))?;
            run_step(
                "bootstrap package installer",
                activation.python_command().arg(file.path()),
            )
        }
    }
}

/// `python -m pip install <requirement>` inside the environment.
pub fn install_package(source: &PackageSource, activation: &Activation) -> Result<()> {
    let requirement = source.requirement();
    if !source.is_pinned() {
        tracing::warn!(
            "Package source {} is not pinned; installing its latest revision",
            source.url
        );
    }
    run_step(
        "install package",
        activation
            .python_command()
            .args(["-m", "pip", "install"])
            .arg(&requirement),
    )
}

fn make_agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(10))
        .timeout_read(Duration::from_secs(60))
        .build()
}

fn download(url: &str) -> Result<Vec<u8>> {
    tracing::debug!("Downloading {}", url);
    let response = make_agent().get(url).call().map_err(|e| match &e {
        ureq::Error::Status(code, _) => ProvisionError::Download {
            url: url.to_string(),
            reason: format!("HTTP {}", code),
        },
        ureq::Error::Transport(_) => ProvisionError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        },
    })?;
    let mut body = Vec::new();
    response
        .into_reader()
        .take(MAX_BOOTSTRAP_BYTES)
        .read_to_end(&mut body)
        .map_err(|e| ProvisionError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
    Ok(body)
}

/// Check `data` against `expected`, given either as bare hex or as `sha256:<hex>`.
pub fn verify_sha256(url: &str, data: &[u8], expected: &str) -> Result<()> {
    let expected = expected.trim();
    let expected_hex = match expected.split_once(':') {
        Some((algo, hex)) if algo.eq_ignore_ascii_case("sha256") => hex,
        Some((algo, _)) => {
            return Err(ProvisionError::InvalidConfig {
                key: bootpy_core::config::env_keys::installer::BOOTPY_GET_PIP_SHA256,
                reason: format!("unsupported checksum algorithm `{}`", algo),
            })
        }
        None => expected,
    };
    let actual = hex::encode(Sha256::digest(data));
    if actual.eq_ignore_ascii_case(expected_hex) {
        Ok(())
    } else {
        Err(ProvisionError::ChecksumMismatch {
            url: url.to_string(),
            expected: expected_hex.to_lowercase(),
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // sha256("hello")
    const HELLO: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn test_verify_bare_and_prefixed_hex() {
        verify_sha256("u", b"hello", HELLO).unwrap();
        verify_sha256("u", b"hello", &format!("sha256:{}", HELLO.to_uppercase())).unwrap();
    }

    #[test]
    fn test_mismatch_is_fatal() {
        let err = verify_sha256("https://example.com/get-pip.py", b"tampered", HELLO).unwrap_err();
        match err {
            ProvisionError::ChecksumMismatch { expected, actual, .. } => {
                assert_eq!(expected, HELLO);
                assert_ne!(actual, HELLO);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let err = verify_sha256("u", b"hello", "md5:5d41402abc4b2a76b9719d911017c592").unwrap_err();
        assert!(matches!(err, ProvisionError::InvalidConfig { .. }));
    }

    #[test]
    fn test_unreachable_url_is_download_error() {
        let err = download("http://127.0.0.1:9/get-pip.py").unwrap_err();
        assert!(matches!(err, ProvisionError::Download { .. }));
    }
}
