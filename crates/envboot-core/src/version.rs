//! Runtime version identifiers and the pinned version marker.

use crate::error::{SetupError, SetupResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

/// File at the project root recording the pinned version (pyenv's format).
pub const MARKER_FILE_NAME: &str = ".python-version";

/// `MAJOR.MINOR[.PATCH]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RuntimeVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\.(\d+)(?:\.(\d+))?$").expect("valid regex"))
}

fn interpreter_output_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^Python\s+(\d+)\.(\d+)(?:\.(\d+))?").expect("valid regex")
    })
}

impl RuntimeVersion {
    pub fn new(major: u32, minor: u32, patch: Option<u32>) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a requested version. Anything other than `MAJOR.MINOR[.PATCH]`
    /// is reported as unsupported.
    pub fn parse(raw: &str) -> SetupResult<Self> {
        let trimmed = raw.trim();
        let caps = version_re()
            .captures(trimmed)
            .ok_or_else(|| SetupError::UnsupportedVersion {
                version: raw.to_string(),
                reason: "expected MAJOR.MINOR or MAJOR.MINOR.PATCH".to_string(),
                status: None,
            })?;
        Self::from_captures(&caps).ok_or_else(|| SetupError::UnsupportedVersion {
            version: raw.to_string(),
            reason: "version component out of range".to_string(),
            status: None,
        })
    }

    /// Extract the version from `python --version` output (`Python 3.12.4`).
    /// Pre-release suffixes such as `rc1` are ignored.
    pub fn from_interpreter_output(output: &str) -> Option<Self> {
        let caps = interpreter_output_re().captures(output)?;
        Self::from_captures(&caps)
    }

    fn from_captures(caps: &regex::Captures<'_>) -> Option<Self> {
        let major = caps.get(1)?.as_str().parse().ok()?;
        let minor = caps.get(2)?.as_str().parse().ok()?;
        let patch = match caps.get(3) {
            Some(m) => Some(m.as_str().parse().ok()?),
            None => None,
        };
        Some(Self::new(major, minor, patch))
    }

    /// Prefix match: `3.12` accepts any `3.12.x`, `3.12.4` only itself.
    /// A concrete version without a patch never satisfies a patch request.
    pub fn matches(&self, concrete: &RuntimeVersion) -> bool {
        if self.major != concrete.major || self.minor != concrete.minor {
            return false;
        }
        match self.patch {
            None => true,
            Some(p) => concrete.patch == Some(p),
        }
    }

    /// `MAJOR.MINOR`, used for `pythonX.Y` executable names.
    pub fn short(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch {
            Some(p) => write!(f, "{}.{}.{}", self.major, self.minor, p),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

impl FromStr for RuntimeVersion {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RuntimeVersion {
    type Error = SetupError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RuntimeVersion> for String {
    fn from(v: RuntimeVersion) -> Self {
        v.to_string()
    }
}

pub fn marker_path(project_dir: &Path) -> PathBuf {
    project_dir.join(MARKER_FILE_NAME)
}

/// Write the marker: one version string and a trailing newline.
pub fn write_marker(project_dir: &Path, version: &RuntimeVersion) -> SetupResult<PathBuf> {
    let path = marker_path(project_dir);
    std::fs::write(&path, format!("{}\n", version)).map_err(|e| SetupError::io(&path, e))?;
    Ok(path)
}

/// Read the pinned version string, if a marker exists. Only the first
/// non-empty, non-comment line counts.
pub fn read_marker(project_dir: &Path) -> SetupResult<Option<String>> {
    let path = marker_path(project_dir);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SetupError::io(&path, e)),
    };
    Ok(content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_versions() {
        assert_eq!(RuntimeVersion::parse("3.12").unwrap(), RuntimeVersion::new(3, 12, None));
        assert_eq!(
            RuntimeVersion::parse(" 3.11.9 ").unwrap(),
            RuntimeVersion::new(3, 11, Some(9))
        );
        for bad in ["", "3", "latest", "3.x", "3.12.4.1", "pypy3.10", "system"] {
            let err = RuntimeVersion::parse(bad).unwrap_err();
            assert!(
                matches!(err, SetupError::UnsupportedVersion { .. }),
                "{bad} should be unsupported"
            );
        }
    }

    #[test]
    fn test_from_interpreter_output() {
        assert_eq!(
            RuntimeVersion::from_interpreter_output("Python 3.12.4\n"),
            Some(RuntimeVersion::new(3, 12, Some(4)))
        );
        assert_eq!(
            RuntimeVersion::from_interpreter_output("Python 3.13.0rc1"),
            Some(RuntimeVersion::new(3, 13, Some(0)))
        );
        assert_eq!(RuntimeVersion::from_interpreter_output("bash: python: not found"), None);
    }

    #[test]
    fn test_matches_is_prefix() {
        let want_minor = RuntimeVersion::new(3, 12, None);
        let want_patch = RuntimeVersion::new(3, 12, Some(4));
        let have = RuntimeVersion::new(3, 12, Some(4));
        assert!(want_minor.matches(&have));
        assert!(want_patch.matches(&have));
        assert!(!want_patch.matches(&RuntimeVersion::new(3, 12, Some(5))));
        assert!(!want_minor.matches(&RuntimeVersion::new(3, 13, Some(0))));
        assert!(!want_patch.matches(&RuntimeVersion::new(3, 12, None)));
    }

    #[test]
    fn test_serde_as_string() {
        let v = RuntimeVersion::new(3, 12, Some(1));
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"3.12.1\"");
        let back: RuntimeVersion = serde_json::from_str("\"3.10\"").unwrap();
        assert_eq!(back, RuntimeVersion::new(3, 10, None));
        assert!(serde_json::from_str::<RuntimeVersion>("\"three\"").is_err());
    }

    #[test]
    fn test_marker_roundtrip_and_missing() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(read_marker(tmp.path()).unwrap(), None);

        let path = write_marker(tmp.path(), &RuntimeVersion::new(3, 12, None)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "3.12\n");
        assert_eq!(read_marker(tmp.path()).unwrap().as_deref(), Some("3.12"));
    }

    #[test]
    fn test_read_marker_skips_comments() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(marker_path(tmp.path()), "# pinned by hand\n\n3.11.8\n3.10\n").unwrap();
        assert_eq!(read_marker(tmp.path()).unwrap().as_deref(), Some("3.11.8"));
    }
}
