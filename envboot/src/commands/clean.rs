//! `envboot clean`: remove the environment directory (and optionally the marker).

use anyhow::{Context, Result};
use envboot_core::config::BootstrapConfig;
use std::fs;
use std::path::{Path, PathBuf};

pub fn cmd_clean(config: &BootstrapConfig, marker: bool, dry_run: bool, force: bool) -> Result<()> {
    let mut targets: Vec<(PathBuf, u64)> = Vec::new();
    let env_dir = config.venv_path();
    if fs::symlink_metadata(&env_dir).is_ok() {
        targets.push((env_dir.clone(), dir_size(&env_dir)));
    }
    let marker_path = config.marker_path();
    if marker && marker_path.is_file() {
        let size = marker_path.metadata().map(|m| m.len()).unwrap_or(0);
        targets.push((marker_path, size));
    }

    if targets.is_empty() {
        eprintln!("Nothing to clean in {}", config.project_dir.display());
        return Ok(());
    }

    let total: u64 = targets.iter().map(|(_, s)| s).sum();
    eprintln!("🗂  To remove:");
    for (path, size) in &targets {
        eprintln!("  • {} ({})", path.display(), format_size(*size));
    }
    eprintln!("Total: {}", format_size(total));

    if dry_run {
        eprintln!();
        eprintln!("(Dry run: nothing removed. Remove --dry-run to delete.)");
        return Ok(());
    }

    if !force {
        eprint!("\nRemove? [y/N] ");
        let mut answer = String::new();
        std::io::stdin()
            .read_line(&mut answer)
            .context("Read confirmation")?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            eprintln!("Cancelled.");
            return Ok(());
        }
    }

    for (path, _) in &targets {
        remove_path(path).with_context(|| format!("Remove {}", path.display()))?;
        tracing::debug!("removed {}", path.display());
    }
    eprintln!("✓ Freed {}", format_size(total));
    Ok(())
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Total size of a directory tree; a plain file reports its own size.
fn dir_size(path: &Path) -> u64 {
    let Ok(meta) = fs::symlink_metadata(path) else {
        return 0;
    };
    if !meta.is_dir() {
        return meta.len();
    }
    let mut total: u64 = 0;
    if let Ok(entries) = fs::read_dir(path) {
        for entry in entries.flatten() {
            total += dir_size(&entry.path());
        }
    }
    total
}

/// Human-readable byte size.
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
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn test_dir_size_recurses() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("lib/site-packages")).unwrap();
        fs::write(tmp.path().join("pyvenv.cfg"), "0123456789").unwrap();
        fs::write(tmp.path().join("lib/site-packages/mod.py"), "abcde").unwrap();
        assert_eq!(dir_size(tmp.path()), 15);
    }

    #[test]
    fn test_clean_removes_env_and_marker() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = BootstrapConfig::new(tmp.path());
        fs::create_dir_all(cfg.venv_path().join("bin")).unwrap();
        fs::write(cfg.marker_path(), "3.12\n").unwrap();

        cmd_clean(&cfg, false, true, true).unwrap();
        assert!(cfg.venv_path().exists());

        cmd_clean(&cfg, false, false, true).unwrap();
        assert!(!cfg.venv_path().exists());
        assert!(cfg.marker_path().exists());

        cmd_clean(&cfg, true, false, true).unwrap();
        assert!(!cfg.marker_path().exists());
    }
}
