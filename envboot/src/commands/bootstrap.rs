//! `envboot` / `envboot bootstrap`

use anyhow::{Context, Result};
use envboot_core::config::BootstrapConfig;
use envboot_env::{BootstrapReport, Bootstrapper};

pub fn cmd_bootstrap(config: BootstrapConfig, json: bool) -> Result<()> {
    let report = Bootstrapper::new(config)
        .run()
        .context("Bootstrap failed")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Serialize report")?
        );
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &BootstrapReport) {
    eprintln!(
        "✓ Python {} pinned in {} ({}, {})",
        report.pinned_version,
        report.marker.display(),
        report.manager,
        report.runtime_version
    );
    let env_note = if report.env_reused { "reused" } else { "created" };
    eprintln!("✓ Environment {} at {}", env_note, report.env_dir.display());
    if report.install_skipped {
        eprintln!(
            "✓ {} package(s) already installed, manifest unchanged",
            report.packages.len()
        );
    } else {
        eprintln!("✓ Installed {} package(s)", report.packages.len());
    }
    eprintln!();
    eprintln!("Activate it in your shell with:");
    eprintln!("  {}", activate_hint(report));
}

fn activate_hint(report: &BootstrapReport) -> String {
    if cfg!(windows) {
        format!("{}\\Scripts\\activate", report.env_dir.display())
    } else {
        format!("source {}/bin/activate", report.env_dir.display())
    }
}
