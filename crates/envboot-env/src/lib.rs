//! Python environment bootstrap: resolve and pin a runtime version, build a
//! virtual environment, activate it for child processes and install a
//! requirements manifest into it.

pub mod bootstrap;
pub mod installer;
pub mod log;
pub mod process;
pub mod runtime_resolver;
pub mod status;
pub mod venv;

pub use bootstrap::{bootstrap, BootstrapReport, Bootstrapper};
pub use runtime_resolver::{
    select_manager, ExplicitInterpreter, Pyenv, ResolvedRuntime, SystemPython, VersionManager,
};
pub use status::{status, StatusReport};
