//! Unified configuration layer.
//!
//! All environment variable reads live here; the rest of the workspace goes
//! through the typed structs.
//!
//! - `loader`: `env_or`, `env_optional`, `env_bool`, `.env` loading
//! - `schema`: `BootstrapConfig`, `ObservabilityConfig`
//! - `env_keys`: key constants and aliases

pub mod env_keys;
pub mod loader;
pub mod schema;

pub use loader::{env_bool, env_optional, env_or, load_dotenv_from_dir, set_env_var};
pub use schema::{BootstrapConfig, ManagerKind, ObservabilityConfig, PyenvConfig};
