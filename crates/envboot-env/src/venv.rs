//! Isolated environment: inspect, create (`python -m venv`) and activate.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use envboot_core::version::RuntimeVersion;
use envboot_core::{SetupError, SetupResult};

use crate::info_log;
use crate::process::run_tool;
use crate::runtime_resolver::{probe_version, ResolvedRuntime};

pub const PYVENV_CFG: &str = "pyvenv.cfg";

/// An existing virtual environment.
#[derive(Debug, Clone)]
pub struct VirtualEnv {
    pub root: PathBuf,
    /// `bin` on Unix, `Scripts` on Windows.
    pub bin_dir: PathBuf,
    pub interpreter: PathBuf,
    /// From `pyvenv.cfg` (`version` or `version_info`).
    pub version: Option<RuntimeVersion>,
}

impl VirtualEnv {
    /// Open `root` if it holds a `pyvenv.cfg` and an interpreter.
    pub fn open(root: &Path) -> Option<Self> {
        let cfg = read_pyvenv_cfg(root)?;
        let (bin_dir, interpreter) = if root.join("bin").join("python").exists() {
            (root.join("bin"), root.join("bin").join("python"))
        } else if root.join("Scripts").join("python.exe").exists() {
            (root.join("Scripts"), root.join("Scripts").join("python.exe"))
        } else {
            return None;
        };
        let version = cfg
            .get("version")
            .or_else(|| cfg.get("version_info"))
            .and_then(|v| RuntimeVersion::from_interpreter_output(&format!("Python {}", v)));
        Some(Self {
            root: root.to_path_buf(),
            bin_dir,
            interpreter,
            version,
        })
    }

    /// Version from `pyvenv.cfg`, else asked from the interpreter.
    pub fn runtime_version(&self) -> Option<RuntimeVersion> {
        self.version.or_else(|| probe_version(&self.interpreter))
    }
}

/// What currently occupies the environment path.
#[derive(Debug)]
pub enum EnvState {
    Missing,
    EmptyDir,
    Existing(VirtualEnv),
    NotADirectory,
    /// Non-empty directory that is not a virtual environment.
    Foreign,
}

pub fn inspect(path: &Path) -> SetupResult<EnvState> {
    match std::fs::symlink_metadata(path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(EnvState::Missing),
        Err(e) => return Err(SetupError::io(path, e)),
    }
    // Dangling symlinks land here too.
    if !path.is_dir() {
        return Ok(EnvState::NotADirectory);
    }
    if let Some(env) = VirtualEnv::open(path) {
        return Ok(EnvState::Existing(env));
    }
    let mut entries = std::fs::read_dir(path).map_err(|e| SetupError::io(path, e))?;
    if entries.next().is_none() {
        Ok(EnvState::EmptyDir)
    } else {
        Ok(EnvState::Foreign)
    }
}

/// `key = value` pairs of `<root>/pyvenv.cfg`.
pub fn read_pyvenv_cfg(root: &Path) -> Option<HashMap<String, String>> {
    let content = std::fs::read_to_string(root.join(PYVENV_CFG)).ok()?;
    Some(
        content
            .lines()
            .filter_map(|line| {
                let (k, v) = line.split_once('=')?;
                Some((k.trim().to_lowercase(), v.trim().to_string()))
            })
            .collect(),
    )
}

/// Create the environment at `path`, or reuse a compatible one.
/// Returns the environment and whether it already existed.
pub fn ensure_environment(
    path: &Path,
    runtime: &ResolvedRuntime,
    requested: &RuntimeVersion,
    project_dir: &Path,
) -> SetupResult<(VirtualEnv, bool)> {
    let failed = |reason: String, status: Option<i32>| SetupError::EnvironmentCreationFailed {
        path: path.to_path_buf(),
        reason,
        status,
    };

    match inspect(path)? {
        EnvState::Existing(env) => {
            return match env.runtime_version() {
                Some(v) if requested.matches(&v) => {
                    info_log!("Reusing environment {} (Python {})", path.display(), v);
                    Ok((env, true))
                }
                Some(v) => Err(failed(
                    format!(
                        "existing environment was created for Python {}, requested {}; remove it to rebuild",
                        v, requested
                    ),
                    None,
                )),
                None => Err(failed(
                    "existing environment has an unknown Python version".to_string(),
                    None,
                )),
            };
        }
        EnvState::NotADirectory => {
            return Err(failed("path exists and is not a directory".to_string(), None));
        }
        EnvState::Foreign => {
            return Err(failed(
                "directory exists and is not a virtual environment".to_string(),
                None,
            ));
        }
        EnvState::Missing | EnvState::EmptyDir => {}
    }

    info_log!(
        "Creating environment {} with {}",
        path.display(),
        runtime.interpreter.display()
    );
    let out = run_tool(
        Command::new(&runtime.interpreter)
            .arg("-m")
            .arg("venv")
            .arg(path)
            .current_dir(project_dir),
    )
    .map_err(|e| {
        failed(
            format!("failed to run {}: {}", runtime.interpreter.display(), e),
            None,
        )
    })?;
    if !out.success {
        return Err(failed(out.diagnostic(), out.status));
    }

    let env = VirtualEnv::open(path).ok_or_else(|| {
        failed(
            "venv finished but no interpreter or pyvenv.cfg was found".to_string(),
            None,
        )
    })?;
    Ok((env, false))
}

/// Process-local activation: the variables an activate script would export,
/// applied to child commands instead of the invoking shell.
#[derive(Debug, Clone)]
pub struct Activation {
    pub virtual_env: PathBuf,
    pub bin_dir: PathBuf,
    pub python: PathBuf,
    path: OsString,
}

impl Activation {
    pub fn new(env: &VirtualEnv) -> SetupResult<Self> {
        let inherited = std::env::var_os("PATH").unwrap_or_default();
        Self::with_path(env, &inherited)
    }

    /// Activation prepending the environment's bin dir to `inherited`.
    pub fn with_path(env: &VirtualEnv, inherited: &OsString) -> SetupResult<Self> {
        let mut dirs = vec![env.bin_dir.clone()];
        dirs.extend(std::env::split_paths(inherited).filter(|p| p != &env.bin_dir));
        let path = std::env::join_paths(dirs).map_err(|e| SetupError::EnvironmentCreationFailed {
            path: env.root.clone(),
            reason: format!("cannot activate: {}", e),
            status: None,
        })?;
        Ok(Self {
            virtual_env: env.root.clone(),
            bin_dir: env.bin_dir.clone(),
            python: env.interpreter.clone(),
            path,
        })
    }

    pub fn path_var(&self) -> &OsString {
        &self.path
    }

    pub fn apply<'a>(&self, cmd: &'a mut Command) -> &'a mut Command {
        cmd.env("VIRTUAL_ENV", &self.virtual_env)
            .env("PATH", &self.path)
            .env_remove("PYTHONHOME")
    }

    /// `python` of the environment, already activated.
    pub fn python_command(&self) -> Command {
        let mut cmd = Command::new(&self.python);
        self.apply(&mut cmd);
        cmd
    }
}
