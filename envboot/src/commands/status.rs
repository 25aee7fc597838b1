//! `envboot status`

use anyhow::{Context, Result};
use envboot_core::config::BootstrapConfig;

pub fn cmd_status(config: &BootstrapConfig, json: bool) -> Result<()> {
    let report = envboot_env::status(config).context("Read project state")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Serialize status")?
        );
        return Ok(());
    }

    println!("Project:      {}", report.project_dir.display());
    println!(
        "Pinned:       {}",
        report.pinned_version.as_deref().unwrap_or("(none)")
    );
    match report.env_version {
        Some(v) => println!(
            "Environment:  {} ({}, Python {})",
            report.env_dir.display(),
            report.env_state,
            v
        ),
        None => println!(
            "Environment:  {} ({})",
            report.env_dir.display(),
            report.env_state
        ),
    }
    match report.stamp {
        Some(ref stamp) => println!(
            "Installed:    {} package(s) at {}{}",
            stamp.packages.len(),
            stamp.completed_at.to_rfc3339(),
            if report.up_to_date { "" } else { " (out of date)" }
        ),
        None => println!("Installed:    (not bootstrapped)"),
    }
    Ok(())
}
