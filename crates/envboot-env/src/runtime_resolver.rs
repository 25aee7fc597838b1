//! VersionManager trait: how a requested runtime version becomes a concrete
//! interpreter and a pinned marker.
//!
//! Implementations: pyenv, a `PATH` lookup, and an explicitly configured
//! interpreter. `select_manager` picks one from the configuration.

use std::path::{Path, PathBuf};
use std::process::Command;

use envboot_core::config::{BootstrapConfig, ManagerKind, PyenvConfig};
use envboot_core::version::{self, RuntimeVersion};
use envboot_core::{SetupError, SetupResult};

use crate::process::run_tool;

/// Interpreter selected for a requested version.
#[derive(Debug, Clone)]
pub struct ResolvedRuntime {
    /// Path to the interpreter executable
    pub interpreter: PathBuf,
    /// Version reported by the interpreter itself
    pub version: RuntimeVersion,
}

/// Extension point for runtime-version managers.
///
/// `resolve` must not write anything; `pin` records the version for the
/// project directory and returns the marker path.
pub trait VersionManager: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, project_dir: &Path, version: &RuntimeVersion) -> SetupResult<ResolvedRuntime>;

    fn pin(&self, project_dir: &Path, version: &RuntimeVersion) -> SetupResult<PathBuf>;
}

/// Run `<interpreter> --version` and parse the answer. Python 2 prints it on
/// stderr, so both streams are searched.
pub fn probe_version(interpreter: &Path) -> Option<RuntimeVersion> {
    let out = run_tool(Command::new(interpreter).arg("--version")).ok()?;
    if !out.success {
        return None;
    }
    RuntimeVersion::from_interpreter_output(&out.stdout)
        .or_else(|| RuntimeVersion::from_interpreter_output(&out.stderr))
}

/// Probe `interpreter` and require it to satisfy `requested`.
fn verify_interpreter(interpreter: &Path, requested: &RuntimeVersion) -> SetupResult<ResolvedRuntime> {
    let actual = probe_version(interpreter).ok_or_else(|| SetupError::UnsupportedVersion {
        version: requested.to_string(),
        reason: format!(
            "could not determine the version of {}",
            interpreter.display()
        ),
        status: None,
    })?;
    if !requested.matches(&actual) {
        return Err(SetupError::UnsupportedVersion {
            version: requested.to_string(),
            reason: format!("{} is Python {}", interpreter.display(), actual),
            status: None,
        });
    }
    Ok(ResolvedRuntime {
        interpreter: interpreter.to_path_buf(),
        version: actual,
    })
}

// ─── pyenv ──────────────────────────────────────────────────────────────────

/// Delegates resolution and pinning to `pyenv prefix` / `pyenv local`.
#[derive(Debug, Clone)]
pub struct Pyenv {
    program: PathBuf,
}

impl Pyenv {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `pyenv` on PATH, else `$PYENV_ROOT/bin/pyenv` (default root `~/.pyenv`).
    pub fn locate() -> Option<Self> {
        if let Ok(program) = which::which("pyenv") {
            return Some(Self::new(program));
        }
        let root = PyenvConfig::root().or_else(|| dirs::home_dir().map(|h| h.join(".pyenv")))?;
        let program = root.join("bin").join("pyenv");
        program.is_file().then(|| Self::new(program))
    }

    fn command(&self, project_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(project_dir);
        cmd
    }

    fn unsupported(&self, version: &RuntimeVersion, reason: String, status: Option<i32>) -> SetupError {
        SetupError::UnsupportedVersion {
            version: version.to_string(),
            reason,
            status,
        }
    }
}

impl VersionManager for Pyenv {
    fn name(&self) -> &'static str {
        "pyenv"
    }

    fn resolve(&self, project_dir: &Path, version: &RuntimeVersion) -> SetupResult<ResolvedRuntime> {
        let out = run_tool(self.command(project_dir).arg("prefix").arg(version.to_string()))
            .map_err(|e| self.unsupported(version, format!("failed to run pyenv: {}", e), None))?;
        if !out.success {
            return Err(self.unsupported(version, out.diagnostic(), out.status));
        }
        let prefix = out
            .stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| self.unsupported(version, "pyenv prefix printed nothing".into(), None))?;

        let interpreter = [
            prefix.join("bin").join("python3"),
            prefix.join("bin").join("python"),
            prefix.join("python.exe"),
        ]
        .into_iter()
        .find(|p| p.is_file())
        .ok_or_else(|| {
            self.unsupported(
                version,
                format!("no interpreter under {}", prefix.display()),
                None,
            )
        })?;
        verify_interpreter(&interpreter, version)
    }

    fn pin(&self, project_dir: &Path, version: &RuntimeVersion) -> SetupResult<PathBuf> {
        let out = run_tool(self.command(project_dir).arg("local").arg(version.to_string()))
            .map_err(|e| self.unsupported(version, format!("failed to run pyenv: {}", e), None))?;
        if !out.success {
            return Err(self.unsupported(version, out.diagnostic(), out.status));
        }
        Ok(version::marker_path(project_dir))
    }
}

// ─── system PATH ────────────────────────────────────────────────────────────

/// Finds `pythonX.Y`, `python3` or `python` on PATH and writes the marker itself.
#[derive(Debug, Clone, Default)]
pub struct SystemPython;

impl SystemPython {
    fn candidates(version: &RuntimeVersion) -> Vec<String> {
        vec![
            format!("python{}", version.short()),
            "python3".to_string(),
            "python".to_string(),
        ]
    }
}

impl VersionManager for SystemPython {
    fn name(&self) -> &'static str {
        "system"
    }

    fn resolve(&self, _project_dir: &Path, version: &RuntimeVersion) -> SetupResult<ResolvedRuntime> {
        let mut seen = Vec::new();
        for name in Self::candidates(version) {
            let Ok(path) = which::which(&name) else {
                continue;
            };
            match probe_version(&path) {
                Some(actual) if version.matches(&actual) => {
                    return Ok(ResolvedRuntime {
                        interpreter: path,
                        version: actual,
                    });
                }
                Some(actual) => seen.push(format!("{} ({})", path.display(), actual)),
                None => seen.push(format!("{} (unknown version)", path.display())),
            }
        }
        let reason = if seen.is_empty() {
            "no python interpreter found on PATH".to_string()
        } else {
            format!("no matching interpreter on PATH; found {}", seen.join(", "))
        };
        Err(SetupError::UnsupportedVersion {
            version: version.to_string(),
            reason,
            status: None,
        })
    }

    fn pin(&self, project_dir: &Path, version: &RuntimeVersion) -> SetupResult<PathBuf> {
        version::write_marker(project_dir, version)
    }
}

// ─── explicit interpreter ───────────────────────────────────────────────────

/// A configured interpreter path (`ENVBOOT_PYTHON` / `--python-bin`).
/// Bare names are looked up on PATH.
#[derive(Debug, Clone)]
pub struct ExplicitInterpreter {
    path: PathBuf,
}

impl ExplicitInterpreter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl VersionManager for ExplicitInterpreter {
    fn name(&self) -> &'static str {
        "explicit"
    }

    fn resolve(&self, _project_dir: &Path, version: &RuntimeVersion) -> SetupResult<ResolvedRuntime> {
        let path = if self.path.components().count() > 1 || self.path.is_file() {
            self.path.clone()
        } else {
            which::which(&self.path).map_err(|_| SetupError::UnsupportedVersion {
                version: version.to_string(),
                reason: format!("interpreter {} not found", self.path.display()),
                status: None,
            })?
        };
        if !path.is_file() {
            return Err(SetupError::UnsupportedVersion {
                version: version.to_string(),
                reason: format!("interpreter {} not found", path.display()),
                status: None,
            });
        }
        verify_interpreter(&path, version)
    }

    fn pin(&self, project_dir: &Path, version: &RuntimeVersion) -> SetupResult<PathBuf> {
        version::write_marker(project_dir, version)
    }
}

/// Pick the version manager for `config`.
///
/// `auto`: explicit interpreter if configured, else pyenv when installed,
/// else the PATH lookup. `pyenv` fails when pyenv cannot be found.
pub fn select_manager(config: &BootstrapConfig) -> SetupResult<Box<dyn VersionManager>> {
    if let Some(ref path) = config.python_bin {
        return Ok(Box::new(ExplicitInterpreter::new(path)) as Box<dyn VersionManager>);
    }
    match config.manager {
        ManagerKind::System => Ok(Box::new(SystemPython) as Box<dyn VersionManager>),
        ManagerKind::Pyenv => Pyenv::locate()
            .map(|p| Box::new(p) as Box<dyn VersionManager>)
            .ok_or_else(|| SetupError::UnsupportedVersion {
                version: config.python_version.clone(),
                reason: "pyenv not found on PATH or under PYENV_ROOT".to_string(),
                status: None,
            }),
        ManagerKind::Auto => Ok(match Pyenv::locate() {
            Some(p) => Box::new(p) as Box<dyn VersionManager>,
            None => Box::new(SystemPython),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_candidates_prefer_exact_minor() {
        let names = SystemPython::candidates(&RuntimeVersion::new(3, 12, Some(4)));
        assert_eq!(names, vec!["python3.12", "python3", "python"]);
    }

    #[test]
    fn test_select_manager_explicit_wins() {
        let mut cfg = BootstrapConfig::new("/tmp/project");
        cfg.manager = ManagerKind::System;
        cfg.python_bin = Some(PathBuf::from("/opt/python/bin/python3"));
        assert_eq!(select_manager(&cfg).unwrap().name(), "explicit");
    }

    #[test]
    fn test_select_manager_system() {
        let mut cfg = BootstrapConfig::new("/tmp/project");
        cfg.manager = ManagerKind::System;
        assert_eq!(select_manager(&cfg).unwrap().name(), "system");
    }

    #[test]
    fn test_explicit_missing_interpreter_is_unsupported() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = ExplicitInterpreter::new(tmp.path().join("bin").join("python9"));
        let err = mgr
            .resolve(tmp.path(), &RuntimeVersion::new(3, 12, None))
            .unwrap_err();
        assert!(matches!(err, SetupError::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_system_pin_writes_marker() {
        let tmp = tempfile::tempdir().unwrap();
        let marker = SystemPython
            .pin(tmp.path(), &RuntimeVersion::new(3, 11, None))
            .unwrap();
        assert_eq!(std::fs::read_to_string(marker).unwrap(), "3.11\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_pyenv_failure_carries_status_and_diagnostic() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempfile::tempdir().unwrap();
        let fake = tmp.path().join("pyenv");
        std::fs::write(
            &fake,
            "#!/bin/sh\necho \"pyenv: version \\`$2' not installed\" >&2\nexit 4\n",
        )
        .unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = Pyenv::new(&fake)
            .resolve(tmp.path(), &RuntimeVersion::new(3, 99, None))
            .unwrap_err();
        match err {
            SetupError::UnsupportedVersion { status, reason, .. } => {
                assert_eq!(status, Some(4));
                assert!(reason.contains("3.99"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!version::marker_path(tmp.path()).exists());
    }
}
