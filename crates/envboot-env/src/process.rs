//! Blocking invocation of external tools with captured output.

use std::io;
use std::process::Command;

/// Captured result of one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code; `None` when the tool was terminated by a signal.
    pub status: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Diagnostic text for error reports: whichever streams are non-empty,
    /// stdout first. Some tools (`python -m venv` without ensurepip) print
    /// their hint on stdout and only a traceback on stderr.
    pub fn diagnostic(&self) -> String {
        match (self.stdout.trim(), self.stderr.trim()) {
            ("", stderr) => stderr.to_string(),
            (stdout, "") => stdout.to_string(),
            (stdout, stderr) => format!("{}\n{}", stdout, stderr),
        }
    }
}

/// Run `cmd` to completion. Only spawn failures are errors; a non-zero exit
/// is reported through `ToolOutput::success`.
pub fn run_tool(cmd: &mut Command) -> io::Result<ToolOutput> {
    tracing::debug!("running {:?}", cmd);
    let out = cmd.output()?;
    Ok(ToolOutput {
        status: out.status.code(),
        success: out.status.success(),
        stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
    })
}

/// Display form of a program for messages.
pub fn program_name(cmd: &Command) -> String {
    cmd.get_program().to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_keeps_both_streams() {
        let out = ToolOutput {
            status: Some(1),
            success: false,
            stdout: "Collecting nosuchpkg\n".into(),
            stderr: "ERROR: No matching distribution found for nosuchpkg\n".into(),
        };
        assert_eq!(
            out.diagnostic(),
            "Collecting nosuchpkg\nERROR: No matching distribution found for nosuchpkg"
        );

        let venv = ToolOutput {
            status: Some(1),
            success: false,
            stdout: "The virtual environment was not created successfully because ensurepip is not\navailable.  On Debian/Ubuntu systems, you need to install the python3-venv\npackage\n".into(),
            stderr: "Error: Command '['/p/.venv/bin/python3', '-m', 'ensurepip']' returned non-zero exit status 1.\n".into(),
        };
        let text = venv.diagnostic();
        assert!(text.contains("python3-venv"), "{text}");
        assert!(text.ends_with("returned non-zero exit status 1."), "{text}");

        let out = ToolOutput {
            stderr: "  \n".into(),
            ..out
        };
        assert_eq!(out.diagnostic(), "Collecting nosuchpkg");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_tool_reports_status() {
        let ok = run_tool(Command::new("sh").args(["-c", "echo hi"])).unwrap();
        assert!(ok.success);
        assert_eq!(ok.status, Some(0));
        assert_eq!(ok.stdout.trim(), "hi");

        let failed = run_tool(Command::new("sh").args(["-c", "echo boom >&2; exit 3"])).unwrap();
        assert!(!failed.success);
        assert_eq!(failed.status, Some(3));
        assert_eq!(failed.diagnostic(), "boom");
    }

    #[test]
    fn test_run_tool_missing_program_is_error() {
        assert!(run_tool(&mut Command::new("envboot-no-such-program-xyz")).is_err());
    }
}
