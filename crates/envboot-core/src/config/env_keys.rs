//! Environment variable keys and their aliases.
//!
//! Primary keys use the `ENVBOOT_*` prefix; aliases are consulted in order when
//! the primary key is unset.

/// Bootstrap inputs
pub mod bootstrap {
    /// Runtime version to pin, e.g. `3.12` or `3.12.4`.
    pub const ENVBOOT_PYTHON_VERSION: &str = "ENVBOOT_PYTHON_VERSION";
    pub const PYTHON_VERSION_ALIASES: &[&str] = &["PYTHON_VERSION"];

    /// Dependency manifest, relative to the project directory.
    pub const ENVBOOT_REQUIREMENTS: &str = "ENVBOOT_REQUIREMENTS";

    /// Environment directory, relative to the project directory.
    pub const ENVBOOT_VENV_DIR: &str = "ENVBOOT_VENV_DIR";

    /// `auto`, `pyenv` or `system`.
    pub const ENVBOOT_VERSION_MANAGER: &str = "ENVBOOT_VERSION_MANAGER";

    /// Explicit interpreter path; bypasses version-manager lookup.
    pub const ENVBOOT_PYTHON: &str = "ENVBOOT_PYTHON";

    pub const ENVBOOT_FORCE_REINSTALL: &str = "ENVBOOT_FORCE_REINSTALL";
}

/// Package index
pub mod index {
    pub const ENVBOOT_INDEX_URL: &str = "ENVBOOT_INDEX_URL";
    pub const INDEX_URL_ALIASES: &[&str] = &["PYPI_MIRROR_URL"];
}

/// pyenv
pub mod pyenv {
    pub const PYENV_ROOT: &str = "PYENV_ROOT";
}

/// Observability and logging
pub mod observability {
    pub const ENVBOOT_QUIET: &str = "ENVBOOT_QUIET";
    pub const ENVBOOT_LOG_LEVEL: &str = "ENVBOOT_LOG_LEVEL";
    pub const ENVBOOT_LOG_JSON: &str = "ENVBOOT_LOG_JSON";
    pub const ENVBOOT_AUDIT_LOG: &str = "ENVBOOT_AUDIT_LOG";
}
