//! `bootpy-admin clean`: remove the provisioned environment.

use anyhow::{Context, Result};
use bootpy_core::config::ProvisionConfig;
use bootpy_env::Provisioner;
use std::fs;
use std::path::Path;

pub fn cmd_clean(config: &ProvisionConfig, dry_run: bool, force: bool) -> Result<()> {
    let env_dir = &config.env_dir;
    if !env_dir.exists() {
        eprintln!("No environment found at {}", env_dir.display());
        return Ok(());
    }

    let size = dir_size(env_dir);
    eprintln!("🗂  Environment {} ({})", env_dir.display(), format_size(size));

    if dry_run {
        eprintln!("(Dry run: nothing removed. Remove --dry-run to delete.)");
        return Ok(());
    }

    if !force {
        eprint!("Remove it? [y/N] ");
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            eprintln!("Cancelled.");
            return Ok(());
        }
    }

    let removed = Provisioner::new(config)
        .clean()
        .with_context(|| format!("Failed to remove {}", env_dir.display()))?;
    if removed {
        eprintln!("✓ Removed {}, freed {}", env_dir.display(), format_size(size));
    } else {
        eprintln!("Nothing to remove: {} vanished", env_dir.display());
    }
    Ok(())
}

/// Compute total size of a directory recursively.
fn dir_size(path: &Path) -> u64 {
    let mut total: u64 = 0;
    if let Ok(entries) = fs::read_dir(path) {
        for entry in entries.flatten() {
            let Ok(meta) = entry.path().symlink_metadata() else {
                continue;
            };
            if meta.is_dir() {
                total += dir_size(&entry.path());
            } else {
                total += meta.len();
            }
        }
    }
    total
}

/// Format byte size to human-readable string.
fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_dir_size_counts_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("bin")).unwrap();
        fs::write(dir.path().join("bin").join("python"), vec![0u8; 100]).unwrap();
        fs::write(dir.path().join("pyvenv.cfg"), vec![0u8; 20]).unwrap();
        assert_eq!(dir_size(dir.path()), 120);
    }
}
