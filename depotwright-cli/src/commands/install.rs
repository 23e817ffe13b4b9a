//! Install command - copy an application into a library and run its script.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use depotwright::config::format_size;
use depotwright::files_map::FileTypes;
use depotwright::installer::{
    InstallOptions, InstallOutcome, InstallReport, InstallService, ScriptRun,
};

use super::common::{find_application, resolve_language, DepotArgs, FileSelectionArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the install command.
#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Application name or id
    pub app: String,

    /// Library directory; the application lands in `<dest>/common/<name>`
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Language code or name (e.g. de, German)
    #[arg(short, long)]
    pub language: Option<String>,

    #[command(flatten)]
    pub selection: FileSelectionArgs,

    /// Do not run the install script after copying
    #[arg(long)]
    pub no_script: bool,

    #[command(flatten)]
    pub depots: DepotArgs,
}

/// Run the install command.
pub fn run(runner: &CliRunner, args: InstallArgs) -> Result<(), CliError> {
    let config = runner.config();
    let catalog = runner.load_catalog(&args.depots)?;

    let app = find_application(&catalog, &args.app)?;
    let app_name = app.name().to_string();
    let culture = resolve_language(args.language.as_deref(), config, app)?;

    let destination = args
        .dest
        .clone()
        .or_else(|| config.install.destination.clone())
        .ok_or_else(|| CliError::NoDestination(runner.config_path().to_path_buf()))?;
    let file_types = args.selection.file_types(config);
    let run_script = config.install.run_script && !args.no_script;

    let options = InstallOptions::new(&app_name, &destination, culture.english_name())?
        .with_common(file_types.contains(FileTypes::COMMON))
        .with_fixes(file_types.contains(FileTypes::FIX))
        .with_run_script(run_script);

    let service = InstallService::start(Arc::new(catalog), runner.host()?);
    let size = service.files_size(&options)?;

    println!("Installing {}", style(&app_name).bold());
    println!("  Language:    {}", culture.display_name());
    println!("  Destination: {}", destination.display());
    match size {
        Some(bytes) => println!("  Size:        {}", format_size(bytes)),
        None => println!("  Size:        unknown"),
    }
    println!();

    let handle = service.submit(options)?;
    let cancel = handle.cancel_flag();
    ctrlc::set_handler(move || {
        cancel.request();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    bar.set_message("Copying files...");

    let outcome = handle.wait(|percent| {
        bar.set_position(u64::from(percent));
        if percent == 100 && run_script {
            bar.set_message("Running install script...");
        }
    });
    bar.finish_and_clear();

    match outcome {
        InstallOutcome::Succeeded(report) => {
            print_report(&report);
            Ok(())
        }
        InstallOutcome::Cancelled => {
            println!("{}", style("Install cancelled.").yellow());
            Err(CliError::Cancelled)
        }
        InstallOutcome::Failed { message, detail } => {
            debug!(detail = %detail, "Install failure detail");
            Err(CliError::InstallFailed(message))
        }
    }
}

fn print_report(report: &InstallReport) {
    println!(
        "{} {} installed to {}",
        style("✓").green(),
        report.application,
        report.install_dir.display()
    );
    println!(
        "  Copied {} files ({})",
        report.files_copied,
        format_size(report.bytes_copied)
    );

    match &report.script {
        ScriptRun::Ran(script) => println!(
            "  Install script: {} registry values, {} processes run, {} skipped, {} folders copied",
            script.registry_values,
            script.processes_run,
            script.processes_skipped,
            script.folders_copied
        ),
        ScriptRun::Missing(path) => println!(
            "  {} install script {} was not installed, nothing was run",
            style("!").yellow(),
            path.display()
        ),
        ScriptRun::Disabled => println!("  Install script skipped"),
        ScriptRun::NotDeclared => {}
    }
}
