//! Dependency installation into an activated environment, and the completion
//! stamp that lets a re-run skip it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use envboot_core::manifest::{Manifest, Requirement};
use envboot_core::version::RuntimeVersion;
use envboot_core::{SetupError, SetupResult};

use crate::info_log;
use crate::process::run_tool;
use crate::venv::Activation;

pub const STAMP_FILE_NAME: &str = ".envboot-stamp.json";

/// Written into the environment after every requirement installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallStamp {
    pub runtime_version: RuntimeVersion,
    pub manifest_sha256: String,
    pub packages: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

impl InstallStamp {
    pub fn new(runtime_version: RuntimeVersion, manifest: &Manifest) -> Self {
        Self {
            runtime_version,
            manifest_sha256: manifest.digest.clone(),
            packages: manifest.package_names(),
            completed_at: Utc::now(),
        }
    }

    pub fn path(env_root: &Path) -> PathBuf {
        env_root.join(STAMP_FILE_NAME)
    }

    /// `None` when missing or unreadable; an unreadable stamp only costs a reinstall.
    pub fn read(env_root: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(Self::path(env_root)).ok()?;
        match serde_json::from_str(&content) {
            Ok(stamp) => Some(stamp),
            Err(e) => {
                tracing::warn!("ignoring unreadable install stamp in {}: {}", env_root.display(), e);
                None
            }
        }
    }

    pub fn write(&self, env_root: &Path) -> SetupResult<()> {
        let path = Self::path(env_root);
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            SetupError::io(&path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        std::fs::write(&path, json).map_err(|e| SetupError::io(&path, e))
    }

    /// Remove the stamp before an install starts, so an interrupted or failed
    /// install never leaves an older completion record behind.
    pub fn clear(env_root: &Path) -> SetupResult<()> {
        let path = Self::path(env_root);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SetupError::io(&path, e)),
        }
    }

    pub fn is_current(&self, version: &RuntimeVersion, manifest: &Manifest) -> bool {
        &self.runtime_version == version && self.manifest_sha256 == manifest.digest
    }
}

/// Runs `python -m pip install` inside an activated environment, one
/// requirement at a time, stopping at the first failure.
pub struct Installer<'a> {
    activation: &'a Activation,
    project_dir: &'a Path,
    extra_options: Vec<String>,
}

impl<'a> Installer<'a> {
    pub fn new(activation: &'a Activation, project_dir: &'a Path) -> Self {
        Self {
            activation,
            project_dir,
            extra_options: Vec::new(),
        }
    }

    /// Package index override; placed after the manifest's own options so it wins.
    pub fn with_index_url(mut self, index_url: Option<&str>) -> Self {
        if let Some(url) = index_url {
            self.extra_options.push("--index-url".to_string());
            self.extra_options.push(url.to_string());
        }
        self
    }

    /// Install every requirement in order. Returns the installed package names.
    pub fn install_all(&self, manifest: &Manifest) -> SetupResult<Vec<String>> {
        let total = manifest.requirements.len();
        let mut installed = Vec::with_capacity(total);
        for (idx, req) in manifest.requirements.iter().enumerate() {
            info_log!("[{}/{}] Installing {}", idx + 1, total, req.spec);
            self.install_one(manifest, req)?;
            installed.push(req.name.clone());
        }
        Ok(installed)
    }

    fn install_one(&self, manifest: &Manifest, req: &Requirement) -> SetupResult<()> {
        let failed = |diagnostic: String, status: Option<i32>| SetupError::DependencyInstallFailed {
            package: req.name.clone(),
            requirement: req.spec.clone(),
            diagnostic,
            status,
        };

        let mut cmd = self.activation.python_command();
        cmd.args(["-m", "pip", "install", "--disable-pip-version-check"])
            .args(&manifest.pip_options)
            .args(&self.extra_options)
            .args(&req.args)
            .current_dir(self.project_dir);

        let out = run_tool(&mut cmd).map_err(|e| failed(format!("failed to run pip: {}", e), None))?;
        if !out.success {
            tracing::debug!("pip output for {}:\n{}", req.name, out.stdout);
            return Err(failed(out.diagnostic(), out.status));
        }
        tracing::debug!("{}", out.stdout.trim_end());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn manifest(dir: &Path, content: &str) -> Manifest {
        let path = dir.join("requirements.txt");
        fs::write(&path, content).unwrap();
        Manifest::load(&path).unwrap()
    }

    #[test]
    fn test_stamp_roundtrip_and_currency() {
        let tmp = tempfile::tempdir().unwrap();
        let m = manifest(tmp.path(), "numpy\nskyfield\n");
        let v = RuntimeVersion::new(3, 12, None);

        assert!(InstallStamp::read(tmp.path()).is_none());
        let stamp = InstallStamp::new(v, &m);
        stamp.write(tmp.path()).unwrap();

        let back = InstallStamp::read(tmp.path()).unwrap();
        assert_eq!(back, stamp);
        assert_eq!(back.packages, vec!["numpy", "skyfield"]);
        assert!(back.is_current(&v, &m));
        assert!(!back.is_current(&RuntimeVersion::new(3, 11, None), &m));

        let changed = manifest(tmp.path(), "numpy\nskyfield\npandas\n");
        assert!(!back.is_current(&v, &changed));
    }

    #[test]
    fn test_clear_removes_stamp_and_tolerates_absence() {
        let tmp = tempfile::tempdir().unwrap();
        let m = manifest(tmp.path(), "numpy\n");
        InstallStamp::new(RuntimeVersion::new(3, 12, None), &m)
            .write(tmp.path())
            .unwrap();

        InstallStamp::clear(tmp.path()).unwrap();
        assert!(!InstallStamp::path(tmp.path()).exists());
        // Already gone: still fine.
        InstallStamp::clear(tmp.path()).unwrap();
    }

    #[test]
    fn test_corrupt_stamp_reads_as_none() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(InstallStamp::path(tmp.path()), "{not json").unwrap();
        assert!(InstallStamp::read(tmp.path()).is_none());
    }
}
