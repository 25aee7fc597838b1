use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use envboot_core::config::ManagerKind;

/// envboot - pin a Python version, create a virtual environment and install requirements
#[derive(Parser, Debug)]
#[command(name = "envboot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub opts: ProjectArgs,

    /// Defaults to `bootstrap`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Overrides on top of ENVBOOT_* variables and built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Project directory (default: current directory)
    #[arg(long, value_name = "DIR", global = true)]
    pub project_dir: Option<PathBuf>,

    /// Python version to pin, e.g. 3.12 or 3.12.4 (default: from env or 3.12)
    #[arg(long = "python", value_name = "VERSION", global = true)]
    pub python_version: Option<String>,

    /// Dependency manifest (default: from env or requirements.txt)
    #[arg(long, value_name = "FILE", global = true)]
    pub requirements: Option<PathBuf>,

    /// Environment directory (default: from env or .venv)
    #[arg(long = "venv", value_name = "DIR", global = true)]
    pub venv_dir: Option<PathBuf>,

    /// Version manager: auto, pyenv or system (default: from env or auto)
    #[arg(long, value_name = "MANAGER", value_parser = parse_manager, global = true)]
    pub manager: Option<ManagerKind>,

    /// Use this interpreter instead of looking one up
    #[arg(long, value_name = "PATH", global = true)]
    pub python_bin: Option<PathBuf>,

    /// Package index URL passed to pip
    #[arg(long, value_name = "URL", global = true)]
    pub index_url: Option<String>,

    /// Install every requirement even if the environment is up to date
    #[arg(long, global = true)]
    pub force_reinstall: bool,

    /// Print the result as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pin the version, create and activate the environment, install requirements
    Bootstrap,

    /// Show the pinned version and the state of the environment
    Status,

    /// Remove the environment directory
    Clean {
        /// Also remove the pinned version marker
        #[arg(long)]
        marker: bool,

        /// Show what would be removed without deleting anything
        #[arg(long)]
        dry_run: bool,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

fn parse_manager(s: &str) -> Result<ManagerKind, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_arguments_means_bootstrap_defaults() {
        let cli = Cli::try_parse_from(["envboot"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.opts.python_version.is_none());
        assert!(!cli.opts.json);
    }

    #[test]
    fn test_global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from([
            "envboot",
            "status",
            "--python",
            "3.11",
            "--manager",
            "pyenv",
            "--json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Status)));
        assert_eq!(cli.opts.python_version.as_deref(), Some("3.11"));
        assert_eq!(cli.opts.manager, Some(ManagerKind::Pyenv));
        assert!(cli.opts.json);
    }

    #[test]
    fn test_bad_manager_rejected() {
        assert!(Cli::try_parse_from(["envboot", "--manager", "conda"]).is_err());
    }
}
