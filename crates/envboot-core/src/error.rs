//! Error taxonomy of a bootstrap run.
//!
//! Every variant that wraps an external tool keeps the tool's diagnostic text
//! and exit status so the binary can surface both unchanged.

use std::path::PathBuf;
use thiserror::Error;

pub type SetupResult<T> = Result<T, SetupError>;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("unsupported runtime version '{version}': {reason}")]
    UnsupportedVersion {
        version: String,
        reason: String,
        status: Option<i32>,
    },

    #[error("dependency manifest not found: {}", path.display())]
    ManifestNotFound { path: PathBuf },

    #[error("invalid dependency manifest {}: {message}", path.display())]
    InvalidManifest { path: PathBuf, message: String },

    #[error("failed to create environment at {}: {reason}", path.display())]
    EnvironmentCreationFailed {
        path: PathBuf,
        reason: String,
        status: Option<i32>,
    },

    #[error("failed to install '{package}' (requirement '{requirement}'): {diagnostic}")]
    DependencyInstallFailed {
        package: String,
        requirement: String,
        diagnostic: String,
        status: Option<i32>,
    },

    #[error("invalid configuration {key}: {message}")]
    InvalidConfig { key: String, message: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SetupError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SetupError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code: the failing tool's status when there is one, else 1.
    pub fn exit_code(&self) -> i32 {
        let status = match self {
            SetupError::UnsupportedVersion { status, .. }
            | SetupError::EnvironmentCreationFailed { status, .. }
            | SetupError::DependencyInstallFailed { status, .. } => *status,
            _ => None,
        };
        match status {
            Some(code) if code != 0 => code,
            _ => 1,
        }
    }

    /// Short machine-readable kind, used in audit records.
    pub fn kind(&self) -> &'static str {
        match self {
            SetupError::UnsupportedVersion { .. } => "unsupported_version",
            SetupError::ManifestNotFound { .. } => "manifest_not_found",
            SetupError::InvalidManifest { .. } => "invalid_manifest",
            SetupError::EnvironmentCreationFailed { .. } => "environment_creation_failed",
            SetupError::DependencyInstallFailed { .. } => "dependency_install_failed",
            SetupError::InvalidConfig { .. } => "invalid_config",
            SetupError::Io { .. } => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_propagates_tool_status() {
        let err = SetupError::DependencyInstallFailed {
            package: "nosuchpkg".into(),
            requirement: "nosuchpkg==1.0".into(),
            diagnostic: "No matching distribution found".into(),
            status: Some(2),
        };
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.kind(), "dependency_install_failed");
    }

    #[test]
    fn test_exit_code_defaults_to_one() {
        let err = SetupError::ManifestNotFound {
            path: PathBuf::from("requirements.txt"),
        };
        assert_eq!(err.exit_code(), 1);

        // Killed by a signal: no status, still non-zero.
        let err = SetupError::EnvironmentCreationFailed {
            path: PathBuf::from(".venv"),
            reason: "terminated".into(),
            status: None,
        };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_display_names_package() {
        let err = SetupError::DependencyInstallFailed {
            package: "numpy".into(),
            requirement: "numpy>=2".into(),
            diagnostic: "build failed".into(),
            status: Some(1),
        };
        let msg = err.to_string();
        assert!(msg.contains("'numpy'"));
        assert!(msg.contains("numpy>=2"));
        assert!(msg.contains("build failed"));
    }
}
