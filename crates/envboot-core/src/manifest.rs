//! Dependency manifest (`requirements.txt`) loading.
//!
//! Only the structure needed to install requirements one at a time is parsed
//! here: entries, includes and pip options. The meaning of each requirement
//! is left to pip.

use crate::error::{SetupError, SetupResult};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// One installable entry of the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Requirement text as written (continuations joined, comment stripped).
    pub spec: String,
    /// Distribution name, used in diagnostics.
    pub name: String,
    /// Arguments appended to `pip install` for this entry.
    pub args: Vec<String>,
    /// File the entry came from (differs from the root manifest for `-r` includes).
    pub source: PathBuf,
    /// 1-based line number of the entry's first physical line.
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct Manifest {
    pub path: PathBuf,
    pub requirements: Vec<Requirement>,
    /// Global pip options (`--index-url`, `-c`, ...) forwarded to every install.
    pub pip_options: Vec<String>,
    /// SHA-256 over the manifest and every included file, in read order.
    pub digest: String,
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?").expect("valid regex"))
}

fn per_requirement_option_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\s--(?:hash|config-settings|global-option)(?:[=\s]|$)").expect("valid regex")
    })
}

impl Manifest {
    /// Read and parse `path`, following `-r` includes.
    ///
    /// A missing manifest (or include) is `ManifestNotFound`; an include cycle
    /// or a directory in place of a file is `InvalidManifest`.
    pub fn load(path: &Path) -> SetupResult<Self> {
        let mut manifest = Manifest {
            path: path.to_path_buf(),
            requirements: Vec::new(),
            pip_options: Vec::new(),
            digest: String::new(),
        };
        let mut hasher = Sha256::new();
        let mut stack = Vec::new();
        manifest.load_file(path, &mut stack, &mut hasher)?;
        manifest.digest = hex::encode(hasher.finalize());
        Ok(manifest)
    }

    pub fn package_names(&self) -> Vec<String> {
        self.requirements.iter().map(|r| r.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    fn load_file(
        &mut self,
        path: &Path,
        stack: &mut Vec<PathBuf>,
        hasher: &mut Sha256,
    ) -> SetupResult<()> {
        if !path.exists() {
            return Err(SetupError::ManifestNotFound {
                path: path.to_path_buf(),
            });
        }
        if path.is_dir() {
            return Err(SetupError::InvalidManifest {
                path: path.to_path_buf(),
                message: "is a directory".to_string(),
            });
        }
        let canonical = path.canonicalize().map_err(|e| SetupError::io(path, e))?;
        if stack.contains(&canonical) {
            return Err(SetupError::InvalidManifest {
                path: path.to_path_buf(),
                message: "include cycle".to_string(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| SetupError::io(path, e))?;
        hasher.update(content.as_bytes());
        tracing::debug!("reading manifest {}", path.display());

        stack.push(canonical);
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        for (line_no, line) in logical_lines(&content) {
            if line.starts_with('-') {
                self.handle_option(path, &base, line_no, &line, stack, hasher)?;
            } else {
                self.requirements.push(Requirement {
                    name: requirement_name(&line),
                    args: requirement_args(&line),
                    spec: line,
                    source: path.to_path_buf(),
                    line: line_no,
                });
            }
        }
        stack.pop();
        Ok(())
    }

    fn handle_option(
        &mut self,
        path: &Path,
        base: &Path,
        line_no: usize,
        line: &str,
        stack: &mut Vec<PathBuf>,
        hasher: &mut Sha256,
    ) -> SetupResult<()> {
        let (flag, value) = split_option(line);
        let missing_value = || SetupError::InvalidManifest {
            path: path.to_path_buf(),
            message: format!("line {}: option '{}' needs a value", line_no, flag),
        };
        match flag.as_str() {
            "-r" | "--requirement" => {
                let value = value.ok_or_else(missing_value)?;
                self.load_file(&base.join(value), stack, hasher)
            }
            "-c" | "--constraint" => {
                let value = value.ok_or_else(missing_value)?;
                self.pip_options.push("-c".to_string());
                self.pip_options
                    .push(base.join(value).to_string_lossy().into_owned());
                Ok(())
            }
            "-e" | "--editable" => {
                let value = value.ok_or_else(missing_value)?;
                self.requirements.push(Requirement {
                    spec: line.to_string(),
                    name: editable_name(&value),
                    args: vec!["-e".to_string(), value],
                    source: path.to_path_buf(),
                    line: line_no,
                });
                Ok(())
            }
            _ => {
                self.pip_options.extend(line.split_whitespace().map(String::from));
                Ok(())
            }
        }
    }
}

/// Join `\` continuations, strip comments, drop blank lines.
/// Yields (first physical line number, text).
fn logical_lines(content: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut pending: Option<(usize, String)> = None;
    for (idx, raw) in content.lines().enumerate() {
        let (start, mut buf) = pending.take().unwrap_or((idx + 1, String::new()));
        let trimmed_end = raw.trim_end();
        if let Some(head) = trimmed_end.strip_suffix('\\') {
            buf.push_str(head);
            pending = Some((start, buf));
            continue;
        }
        buf.push_str(trimmed_end);
        let text = strip_comment(&buf).trim().to_string();
        if !text.is_empty() {
            out.push((start, text));
        }
    }
    if let Some((start, buf)) = pending {
        let text = strip_comment(&buf).trim().to_string();
        if !text.is_empty() {
            out.push((start, text));
        }
    }
    out
}

/// A `#` at the start of the line or preceded by whitespace begins a comment.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'#' && (i == 0 || bytes[i - 1].is_ascii_whitespace()) {
            return &line[..i];
        }
    }
    line
}

/// `-r file`, `-rfile`, `--requirement=file`, `--requirement file`.
fn split_option(line: &str) -> (String, Option<String>) {
    if let Some(long) = line.strip_prefix("--") {
        let (flag, value) = match long.find(|c: char| c == '=' || c.is_whitespace()) {
            Some(pos) => (&long[..pos], Some(long[pos + 1..].trim())),
            None => (long, None),
        };
        return (
            format!("--{}", flag),
            value.filter(|v| !v.is_empty()).map(String::from),
        );
    }
    let flag: String = line.chars().take(2).collect();
    let rest = line[flag.len()..].trim();
    (flag, (!rest.is_empty()).then(|| rest.to_string()))
}

/// pip argv for a requirement line. Trailing per-requirement options
/// (`--hash`, `--config-settings`, `--global-option`) become their own
/// arguments; the requirement text before them stays one argument.
fn requirement_args(line: &str) -> Vec<String> {
    let Some(m) = per_requirement_option_re().find(line) else {
        return vec![line.to_string()];
    };
    let mut args = vec![line[..m.start()].trim_end().to_string()];
    args.extend(line[m.start()..].split_whitespace().map(String::from));
    args
}

/// Distribution name of a requirement line; falls back to the whole line for
/// bare URLs and paths.
pub fn requirement_name(spec: &str) -> String {
    let spec = spec.trim();
    if spec.contains("://") && !spec.contains('@') {
        return spec.to_string();
    }
    name_re()
        .find(spec)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| spec.to_string())
}

fn editable_name(target: &str) -> String {
    if let Some(pos) = target.find("#egg=") {
        let egg = &target[pos + 5..];
        return egg.split('&').next().unwrap_or(egg).to_string();
    }
    target.to_string()
}
