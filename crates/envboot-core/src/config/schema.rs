//! Typed configuration, loaded from environment variables.

use super::env_keys::{
    bootstrap as boot_keys, index as index_keys, observability as obv_keys, pyenv as pyenv_keys,
};
use super::loader::{env_bool, env_optional, env_or};
use crate::error::SetupError;
use crate::version::MARKER_FILE_NAME;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which tool resolves and pins the runtime version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManagerKind {
    /// Explicit interpreter if configured, else pyenv when installed, else system lookup.
    #[default]
    Auto,
    Pyenv,
    System,
}

impl FromStr for ManagerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "" => Ok(ManagerKind::Auto),
            "pyenv" => Ok(ManagerKind::Pyenv),
            "system" => Ok(ManagerKind::System),
            other => Err(format!(
                "unknown version manager '{}' (expected auto, pyenv or system)",
                other
            )),
        }
    }
}

impl fmt::Display for ManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ManagerKind::Auto => "auto",
            ManagerKind::Pyenv => "pyenv",
            ManagerKind::System => "system",
        })
    }
}

/// Inputs of one bootstrap run.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub project_dir: PathBuf,
    pub python_version: String,
    /// Manifest path; relative paths resolve against `project_dir`.
    pub requirements: PathBuf,
    /// Environment directory; relative paths resolve against `project_dir`.
    pub venv_dir: PathBuf,
    pub manager: ManagerKind,
    pub python_bin: Option<PathBuf>,
    /// Forwarded to pip as `--index-url`.
    pub index_url: Option<String>,
    pub force_reinstall: bool,
}

impl BootstrapConfig {
    pub const DEFAULT_PYTHON_VERSION: &'static str = "3.12";
    pub const DEFAULT_REQUIREMENTS: &'static str = "requirements.txt";
    pub const DEFAULT_VENV_DIR: &'static str = ".venv";

    /// Defaults only, no environment lookup.
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            python_version: Self::DEFAULT_PYTHON_VERSION.to_string(),
            requirements: PathBuf::from(Self::DEFAULT_REQUIREMENTS),
            venv_dir: PathBuf::from(Self::DEFAULT_VENV_DIR),
            manager: ManagerKind::Auto,
            python_bin: None,
            index_url: None,
            force_reinstall: false,
        }
    }

    /// Defaults overlaid with `ENVBOOT_*` variables (and `<project_dir>/.env`).
    pub fn from_env(project_dir: &Path) -> Result<Self, SetupError> {
        super::loader::load_dotenv_from_dir(project_dir);
        let manager_raw = env_or(boot_keys::ENVBOOT_VERSION_MANAGER, &[], || {
            ManagerKind::Auto.to_string()
        });
        let manager = manager_raw
            .parse::<ManagerKind>()
            .map_err(|message| SetupError::InvalidConfig {
                key: boot_keys::ENVBOOT_VERSION_MANAGER.to_string(),
                message,
            })?;
        Ok(Self {
            project_dir: project_dir.to_path_buf(),
            python_version: env_or(
                boot_keys::ENVBOOT_PYTHON_VERSION,
                boot_keys::PYTHON_VERSION_ALIASES,
                || Self::DEFAULT_PYTHON_VERSION.to_string(),
            ),
            requirements: PathBuf::from(env_or(boot_keys::ENVBOOT_REQUIREMENTS, &[], || {
                Self::DEFAULT_REQUIREMENTS.to_string()
            })),
            venv_dir: PathBuf::from(env_or(boot_keys::ENVBOOT_VENV_DIR, &[], || {
                Self::DEFAULT_VENV_DIR.to_string()
            })),
            manager,
            python_bin: env_optional(boot_keys::ENVBOOT_PYTHON, &[]).map(PathBuf::from),
            index_url: env_optional(index_keys::ENVBOOT_INDEX_URL, index_keys::INDEX_URL_ALIASES),
            force_reinstall: env_bool(boot_keys::ENVBOOT_FORCE_REINSTALL, &[], false),
        })
    }

    pub fn requirements_path(&self) -> PathBuf {
        self.project_dir.join(&self.requirements)
    }

    pub fn venv_path(&self) -> PathBuf {
        self.project_dir.join(&self.venv_dir)
    }

    pub fn marker_path(&self) -> PathBuf {
        self.project_dir.join(MARKER_FILE_NAME)
    }
}

/// pyenv installation root, when set explicitly.
#[derive(Debug, Clone)]
pub struct PyenvConfig;

impl PyenvConfig {
    pub fn root() -> Option<PathBuf> {
        env_optional(pyenv_keys::PYENV_ROOT, &[]).map(PathBuf::from)
    }
}

/// Logging configuration: quiet, log_level, log_json, audit_log.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
    pub audit_log: Option<String>,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| Self {
            quiet: env_bool(obv_keys::ENVBOOT_QUIET, &[], false),
            log_level: env_or(obv_keys::ENVBOOT_LOG_LEVEL, &[], || {
                "envboot=info".to_string()
            }),
            log_json: env_bool(obv_keys::ENVBOOT_LOG_JSON, &[], false),
            audit_log: env_optional(obv_keys::ENVBOOT_AUDIT_LOG, &[]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_kind_parse() {
        assert_eq!("auto".parse::<ManagerKind>(), Ok(ManagerKind::Auto));
        assert_eq!("PyEnv".parse::<ManagerKind>(), Ok(ManagerKind::Pyenv));
        assert_eq!(" system ".parse::<ManagerKind>(), Ok(ManagerKind::System));
        assert!("conda".parse::<ManagerKind>().is_err());
    }

    #[test]
    fn test_default_paths_resolve_against_project_dir() {
        let cfg = BootstrapConfig::new("/work/project");
        assert_eq!(cfg.python_version, "3.12");
        assert_eq!(cfg.requirements_path(), PathBuf::from("/work/project/requirements.txt"));
        assert_eq!(cfg.venv_path(), PathBuf::from("/work/project/.venv"));
        assert_eq!(cfg.marker_path(), PathBuf::from("/work/project/.python-version"));
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_requirements_path_is_kept() {
        let mut cfg = BootstrapConfig::new("/work/project");
        cfg.requirements = PathBuf::from("/elsewhere/reqs.txt");
        assert_eq!(cfg.requirements_path(), PathBuf::from("/elsewhere/reqs.txt"));
    }
}
