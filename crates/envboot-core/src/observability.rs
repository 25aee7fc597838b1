//! Observability: tracing init and the bootstrap audit log.
//!
//! Reads `ObservabilityConfig` for ENVBOOT_QUIET, ENVBOOT_LOG_LEVEL,
//! ENVBOOT_LOG_JSON and ENVBOOT_AUDIT_LOG.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use serde_json::json;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::ObservabilityConfig;

static AUDIT_PATH: Mutex<Option<String>> = Mutex::new(None);

/// Initialize tracing. Call once at process startup.
/// With ENVBOOT_QUIET=1 only WARN and above are logged; RUST_LOG overrides both.
pub fn init_tracing() {
    let cfg = ObservabilityConfig::from_env();
    let level = if cfg.quiet {
        "envboot=warn".to_string()
    } else {
        cfg.log_level.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
}

fn get_audit_path() -> Option<String> {
    {
        let guard = AUDIT_PATH.lock().ok()?;
        if let Some(ref p) = *guard {
            return Some(p.clone());
        }
    }
    let path = ObservabilityConfig::from_env().audit_log.clone()?;
    if let Some(parent) = Path::new(&path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    {
        let mut guard = AUDIT_PATH.lock().ok()?;
        *guard = Some(path.clone());
    }
    Some(path)
}

fn append_jsonl(path: &str, record: &serde_json::Value) {
    if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(path) {
        if let Ok(line) = serde_json::to_string(record) {
            let _ = writeln!(f, "{}", line);
        }
    }
}

/// Outcome of one bootstrap step, as recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Ok,
    Skipped,
    Failed,
}

impl StepOutcome {
    fn as_str(self) -> &'static str {
        match self {
            StepOutcome::Ok => "ok",
            StepOutcome::Skipped => "skipped",
            StepOutcome::Failed => "failed",
        }
    }
}

/// Audit record for one step. No-op unless ENVBOOT_AUDIT_LOG is set.
pub fn audit_step(project_dir: &Path, step: &str, outcome: StepOutcome, detail: &str) {
    let Some(path) = get_audit_path() else {
        return;
    };
    append_jsonl(&path, &audit_record(project_dir, step, outcome, detail));
}

fn audit_record(
    project_dir: &Path,
    step: &str,
    outcome: StepOutcome,
    detail: &str,
) -> serde_json::Value {
    json!({
        "ts": Utc::now().to_rfc3339(),
        "event": "bootstrap_step",
        "project_dir": project_dir.display().to_string(),
        "step": step,
        "outcome": outcome.as_str(),
        "detail": detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_record_shape() {
        let rec = audit_record(Path::new("/proj"), "pin", StepOutcome::Failed, "bad version");
        assert_eq!(rec["event"], "bootstrap_step");
        assert_eq!(rec["step"], "pin");
        assert_eq!(rec["outcome"], "failed");
        assert_eq!(rec["detail"], "bad version");
        assert!(rec["ts"].as_str().is_some());
    }

    #[test]
    fn test_append_jsonl_appends_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("audit.jsonl");
        let path_str = path.to_string_lossy().to_string();
        append_jsonl(&path_str, &json!({"n": 1}));
        append_jsonl(&path_str, &json!({"n": 2}));
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec![r#"{"n":1}"#, r#"{"n":2}"#]);
    }
}
