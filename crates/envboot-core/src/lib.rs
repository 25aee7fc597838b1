pub mod config;
pub mod error;
pub mod manifest;
pub mod observability;
pub mod version;

pub use error::{SetupError, SetupResult};
