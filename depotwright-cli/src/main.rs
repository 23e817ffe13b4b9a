//! Depotwright CLI - Command-line interface
//!
//! Lists installable applications found in depot directories, previews and
//! runs installs, and manages the configuration file.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use console::style;

use depotwright::config::config_file_path;

use commands::apps::AppsArgs;
use commands::catalog::CatalogArgs;
use commands::config::ConfigCommands;
use commands::duplicates::DuplicatesArgs;
use commands::install::InstallArgs;
use commands::languages::LanguagesArgs;
use commands::plan::PlanArgs;
use commands::script::ScriptArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Debug, Parser)]
#[command(name = "depotwright", version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to ~/.depotwright/config.ini)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List applications found in the depot directories
    Apps(AppsArgs),

    /// List the installable languages of an application
    Languages(LanguagesArgs),

    /// Show the files an install would copy
    Plan(PlanArgs),

    /// Install an application
    Install(InstallArgs),

    /// Print or run an install script
    Script(ScriptArgs),

    /// Find identical files shipped by several depots
    Duplicates(DuplicatesArgs),

    /// Export the application catalog as JSON
    Catalog(CatalogArgs),

    /// Manage configuration settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands must work even when the file does not parse
        Commands::Config(command) => {
            let path = cli.config.unwrap_or_else(config_file_path);
            commands::config::run(command, &path)
        }
        command => {
            let runner = CliRunner::new(cli.config.as_deref(), cli.verbose)?;
            runner.log_startup(command_name(&command));
            run_command(&runner, command)
        }
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Apps(_) => "apps",
        Commands::Languages(_) => "languages",
        Commands::Plan(_) => "plan",
        Commands::Install(_) => "install",
        Commands::Script(_) => "script",
        Commands::Duplicates(_) => "duplicates",
        Commands::Catalog(_) => "catalog",
        Commands::Config(_) => "config",
    }
}

fn run_command(runner: &CliRunner, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Apps(args) => commands::apps::run(runner, args),
        Commands::Languages(args) => commands::languages::run(runner, args),
        Commands::Plan(args) => commands::plan::run(runner, args),
        Commands::Install(args) => commands::install::run(runner, args),
        Commands::Script(args) => commands::script::run(runner, args),
        Commands::Duplicates(args) => commands::duplicates::run(runner, args),
        Commands::Catalog(args) => commands::catalog::run(runner, args),
        Commands::Config(command) => commands::config::run(command, runner.config_path()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_install() {
        let cli = Cli::try_parse_from([
            "depotwright",
            "-vv",
            "install",
            "Skyrim",
            "--dest",
            "/games",
            "-l",
            "de",
            "--no-fixes",
            "-d",
            "/mnt/a",
            "-d",
            "/mnt/b",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.app, "Skyrim");
                assert_eq!(args.language.as_deref(), Some("de"));
                assert!(args.selection.no_fixes);
                assert!(!args.selection.no_common);
                assert_eq!(args.depots.depots.len(), 2);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_set() {
        let cli = Cli::try_parse_from(["depotwright", "config", "set", "depots.roots", "/mnt"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigCommands::Set { .. })
        ));
    }
}
