//! Script command - inspect or run an install script on its own.

use std::path::PathBuf;

use clap::Args;

use depotwright::catalog::Culture;
use depotwright::host::SystemEnvironment;
use depotwright::installer::CancelFlag;
use depotwright::script::{Script, ScriptContext, Variables};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the script command.
#[derive(Debug, Args)]
pub struct ScriptArgs {
    /// Path of the install script
    pub file: PathBuf,

    /// Value of %INSTALLDIR% (defaults to the script's directory)
    #[arg(long, value_name = "DIR")]
    pub install_dir: Option<PathBuf>,

    /// Execute the script instead of printing it
    #[arg(long)]
    pub run: bool,

    /// Application id used for default Run Process markers
    #[arg(long, default_value_t = 0)]
    pub app_id: u32,

    /// Language selecting language-keyed registry values
    #[arg(short, long, default_value = "en")]
    pub language: String,
}

/// Run the script command.
pub fn run(runner: &CliRunner, args: ScriptArgs) -> Result<(), CliError> {
    let install_dir = match args.install_dir {
        Some(dir) => dir,
        None => args
            .file
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let variables = Variables::new(&SystemEnvironment, &install_dir);
    let script = Script::load(&args.file, &variables)?;

    if !args.run {
        print!("{}", script.root());
        return Ok(());
    }

    let culture = Culture::find(&args.language)
        .ok_or_else(|| CliError::Config(format!("Unknown language '{}'", args.language)))?;
    let host = runner.host()?;
    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    ctrlc::set_handler(move || handler_flag.request())
        .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let context = ScriptContext {
        application_id: args.app_id,
        culture,
        host: &host,
        cancel: &cancel,
    };
    let summary = script.execute(&context)?;
    if summary.cancelled {
        return Err(CliError::Cancelled);
    }

    println!(
        "{}: {} registry values, {} processes run, {} skipped, {} folders copied",
        script.file_name(),
        summary.registry_values,
        summary.processes_run,
        summary.processes_skipped,
        summary.folders_copied
    );
    Ok(())
}
