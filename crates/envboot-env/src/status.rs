//! Read-only view of a project's bootstrap state.

use std::path::PathBuf;

use serde::Serialize;

use envboot_core::config::BootstrapConfig;
use envboot_core::manifest::Manifest;
use envboot_core::version::{self, RuntimeVersion};
use envboot_core::SetupResult;

use crate::installer::InstallStamp;
use crate::venv::{inspect, EnvState};

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub project_dir: PathBuf,
    pub pinned_version: Option<String>,
    pub env_dir: PathBuf,
    /// `missing`, `empty`, `ready`, `not_a_directory` or `foreign`.
    pub env_state: &'static str,
    pub env_version: Option<RuntimeVersion>,
    pub stamp: Option<InstallStamp>,
    /// Whether the stamp matches the pinned version and the current manifest.
    pub up_to_date: bool,
}

pub fn status(config: &BootstrapConfig) -> SetupResult<StatusReport> {
    let pinned_version = version::read_marker(&config.project_dir)?;
    let env_dir = config.venv_path();

    let (env_state, env_version, stamp) = match inspect(&env_dir)? {
        EnvState::Missing => ("missing", None, None),
        EnvState::EmptyDir => ("empty", None, None),
        EnvState::NotADirectory => ("not_a_directory", None, None),
        EnvState::Foreign => ("foreign", None, None),
        EnvState::Existing(env) => ("ready", env.version, InstallStamp::read(&env.root)),
    };

    let pinned = pinned_version
        .as_deref()
        .and_then(|v| RuntimeVersion::parse(v).ok());
    let up_to_date = match (&stamp, pinned) {
        (Some(stamp), Some(pinned)) => Manifest::load(&config.requirements_path())
            .map(|m| stamp.is_current(&pinned, &m))
            .unwrap_or(false),
        _ => false,
    };

    Ok(StatusReport {
        project_dir: config.project_dir.clone(),
        pinned_version,
        env_dir,
        env_state,
        env_version,
        stamp,
        up_to_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_status_of_fresh_project() {
        let tmp = tempfile::tempdir().unwrap();
        let report = status(&BootstrapConfig::new(tmp.path())).unwrap();
        assert_eq!(report.pinned_version, None);
        assert_eq!(report.env_state, "missing");
        assert!(!report.up_to_date);
    }

    #[test]
    fn test_status_of_completed_project() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = BootstrapConfig::new(tmp.path());
        fs::write(cfg.requirements_path(), "numpy\n").unwrap();
        fs::write(cfg.marker_path(), "3.12\n").unwrap();
        let venv = cfg.venv_path();
        fs::create_dir_all(venv.join("bin")).unwrap();
        fs::write(venv.join("bin").join("python"), "").unwrap();
        fs::write(venv.join("pyvenv.cfg"), "version = 3.12.4\n").unwrap();
        let manifest = Manifest::load(&cfg.requirements_path()).unwrap();
        InstallStamp::new(RuntimeVersion::new(3, 12, None), &manifest)
            .write(&venv)
            .unwrap();

        let report = status(&cfg).unwrap();
        assert_eq!(report.pinned_version.as_deref(), Some("3.12"));
        assert_eq!(report.env_state, "ready");
        assert_eq!(report.env_version, Some(RuntimeVersion::new(3, 12, Some(4))));
        assert!(report.up_to_date);

        fs::write(cfg.requirements_path(), "numpy\npandas\n").unwrap();
        assert!(!status(&cfg).unwrap().up_to_date);
    }
}
