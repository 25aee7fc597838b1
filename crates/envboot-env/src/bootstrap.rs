//! The bootstrap pipeline: manifest → pin → create → activate → install.
//!
//! Steps run strictly in order and the first failure aborts the rest.
//! Nothing already written (marker, environment) is rolled back.

use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;

use envboot_core::config::BootstrapConfig;
use envboot_core::manifest::Manifest;
use envboot_core::observability::{audit_step, StepOutcome};
use envboot_core::version::{self, RuntimeVersion};
use envboot_core::{SetupError, SetupResult};

use crate::info_log;
use crate::installer::{InstallStamp, Installer};
use crate::runtime_resolver::{select_manager, VersionManager};
use crate::venv::{self, Activation};

/// Outcome of a successful bootstrap.
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapReport {
    pub project_dir: PathBuf,
    pub pinned_version: RuntimeVersion,
    pub marker: PathBuf,
    pub manager: String,
    pub interpreter: PathBuf,
    pub runtime_version: RuntimeVersion,
    pub env_dir: PathBuf,
    pub env_reused: bool,
    /// Install step skipped because the completion stamp was current.
    pub install_skipped: bool,
    pub packages: Vec<String>,
    pub elapsed_ms: u128,
}

pub struct Bootstrapper {
    config: BootstrapConfig,
    manager: Option<Box<dyn VersionManager>>,
}

impl Bootstrapper {
    pub fn new(config: BootstrapConfig) -> Self {
        Self {
            config,
            manager: None,
        }
    }

    /// Use `manager` instead of the one `select_manager` would pick.
    pub fn with_manager(mut self, manager: Box<dyn VersionManager>) -> Self {
        self.manager = Some(manager);
        self
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    pub fn run(&self) -> SetupResult<BootstrapReport> {
        let started = Instant::now();
        let cfg = &self.config;
        let project_dir = cfg.project_dir.as_path();

        // Validated before anything is written, so a bad path leaves no trace.
        let manifest = Manifest::load(&cfg.requirements_path()).map_err(|e| self.fail("manifest", e))?;
        self.ok("manifest", &format!("{} requirement(s)", manifest.requirements.len()));

        // 1. pin
        let requested = RuntimeVersion::parse(&cfg.python_version).map_err(|e| self.fail("pin", e))?;
        let selected;
        let manager: &dyn VersionManager = match self.manager {
            Some(ref m) => m.as_ref(),
            None => {
                selected = select_manager(cfg).map_err(|e| self.fail("pin", e))?;
                selected.as_ref()
            }
        };
        let runtime = manager
            .resolve(project_dir, &requested)
            .map_err(|e| self.fail("pin", e))?;
        let marker = manager
            .pin(project_dir, &requested)
            .map_err(|e| self.fail("pin", e))?;
        if version::read_marker(project_dir).map_err(|e| self.fail("pin", e))?.is_none() {
            return Err(self.fail(
                "pin",
                SetupError::UnsupportedVersion {
                    version: requested.to_string(),
                    reason: format!("{} did not write {}", manager.name(), marker.display()),
                    status: None,
                },
            ));
        }
        info_log!(
            "Pinned Python {} via {} ({})",
            requested,
            manager.name(),
            runtime.interpreter.display()
        );
        self.ok("pin", &format!("{} -> {}", requested, runtime.version));

        // 2. create
        let env_path = cfg.venv_path();
        let (env, env_reused) = venv::ensure_environment(&env_path, &runtime, &requested, project_dir)
            .map_err(|e| self.fail("create", e))?;
        self.ok("create", &format!("{} (reused: {})", env.root.display(), env_reused));

        // 3. activate
        let activation = Activation::new(&env).map_err(|e| self.fail("activate", e))?;
        self.ok("activate", &activation.virtual_env.display().to_string());

        // 4. install
        let stamp_current = !cfg.force_reinstall
            && InstallStamp::read(&env.root).is_some_and(|s| s.is_current(&requested, &manifest));
        let packages = if stamp_current {
            info_log!("Dependencies already installed for this manifest; skipping install");
            self.skipped("install", "manifest unchanged");
            manifest.package_names()
        } else {
            // A stamp from an earlier manifest must not outlive a failed install.
            InstallStamp::clear(&env.root).map_err(|e| self.fail("install", e))?;
            let installed = Installer::new(&activation, project_dir)
                .with_index_url(cfg.index_url.as_deref())
                .install_all(&manifest)
                .map_err(|e| self.fail("install", e))?;
            InstallStamp::new(requested, &manifest)
                .write(&env.root)
                .map_err(|e| self.fail("install", e))?;
            self.ok("install", &format!("{} package(s)", installed.len()));
            installed
        };

        Ok(BootstrapReport {
            project_dir: project_dir.to_path_buf(),
            pinned_version: requested,
            marker,
            manager: manager.name().to_string(),
            interpreter: runtime.interpreter,
            runtime_version: runtime.version,
            env_dir: env.root,
            env_reused,
            install_skipped: stamp_current,
            packages,
            elapsed_ms: started.elapsed().as_millis(),
        })
    }

    fn ok(&self, step: &str, detail: &str) {
        tracing::debug!(step, detail, "bootstrap step finished");
        audit_step(&self.config.project_dir, step, StepOutcome::Ok, detail);
    }

    fn skipped(&self, step: &str, detail: &str) {
        audit_step(&self.config.project_dir, step, StepOutcome::Skipped, detail);
    }

    fn fail(&self, step: &str, err: SetupError) -> SetupError {
        tracing::error!(step, kind = err.kind(), "bootstrap step failed");
        audit_step(
            &self.config.project_dir,
            step,
            StepOutcome::Failed,
            &err.to_string(),
        );
        err
    }
}

/// `bootstrap(version, manifest_path)` with every other setting at its default.
pub fn bootstrap(
    project_dir: impl Into<PathBuf>,
    version: &str,
    manifest_path: impl Into<PathBuf>,
) -> SetupResult<BootstrapReport> {
    let mut config = BootstrapConfig::new(project_dir);
    config.python_version = version.to_string();
    config.requirements = manifest_path.into();
    Bootstrapper::new(config).run()
}
