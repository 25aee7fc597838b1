mod cli;
mod commands;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, ProjectArgs};
use envboot_core::config::{self, BootstrapConfig};
use envboot_core::SetupError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let project_dir = match resolve_project_dir(cli.opts.project_dir.as_deref()) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    // .env must be loaded before the observability config is first read.
    config::load_dotenv_from_dir(&project_dir);
    envboot_core::observability::init_tracing();

    match run(cli, project_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

/// Process exit status for a failed run: the status of the tool behind the
/// first `SetupError` in the chain, else 1. Never 0.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    let code = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<SetupError>())
        .map(SetupError::exit_code)
        .unwrap_or(1);
    u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1)
}

fn run(cli: Cli, project_dir: PathBuf) -> Result<()> {
    let config = load_config(&cli.opts, project_dir)?;
    tracing::debug!(?config, "resolved configuration");
    match cli.command.unwrap_or(Commands::Bootstrap) {
        Commands::Bootstrap => commands::bootstrap::cmd_bootstrap(config, cli.opts.json),
        Commands::Status => commands::status::cmd_status(&config, cli.opts.json),
        Commands::Clean {
            marker,
            dry_run,
            force,
        } => commands::clean::cmd_clean(&config, marker, dry_run, force),
    }
}

fn resolve_project_dir(arg: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Read current directory")?;
    let dir = match arg {
        Some(p) => cwd.join(p),
        None => cwd,
    };
    if !dir.is_dir() {
        anyhow::bail!("project directory {} does not exist", dir.display());
    }
    Ok(dir)
}

/// Defaults, then ENVBOOT_* variables, then command-line flags.
fn load_config(opts: &ProjectArgs, project_dir: PathBuf) -> Result<BootstrapConfig> {
    let mut config = BootstrapConfig::from_env(&project_dir).context("Load configuration")?;
    if let Some(ref v) = opts.python_version {
        config.python_version = v.clone();
    }
    if let Some(ref r) = opts.requirements {
        config.requirements = r.clone();
    }
    if let Some(ref v) = opts.venv_dir {
        config.venv_dir = v.clone();
    }
    if let Some(m) = opts.manager {
        config.manager = m;
    }
    if let Some(ref p) = opts.python_bin {
        config.python_bin = Some(p.clone());
    }
    if let Some(ref url) = opts.index_url {
        config.index_url = Some(url.clone());
    }
    if opts.force_reinstall {
        config.force_reinstall = true;
    }
    Ok(config)
}
