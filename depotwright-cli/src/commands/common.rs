//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use clap::Args;
use console::{style, Term};
use dialoguer::Select;

use depotwright::catalog::{Application, Catalog, CheckState, Culture};
use depotwright::config::ConfigFile;
use depotwright::files_map::FileTypes;

use crate::error::CliError;

/// Where to look for depots; overrides the `[depots]` config section.
#[derive(Debug, Clone, Default, Args)]
pub struct DepotArgs {
    /// Directory containing depot directories (repeatable)
    #[arg(short = 'd', long = "depot", value_name = "DIR")]
    pub depots: Vec<PathBuf>,

    /// JSON catalog to use instead of the built-in one
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Name of the directory holding fixes
    #[arg(long, value_name = "NAME")]
    pub fixes_dir: Option<String>,

    /// How many directory levels below each root's children to search
    #[arg(long, value_name = "N")]
    pub probe_depth: Option<usize>,
}

/// Which kinds of files to install; overrides the `[install]` config section.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct FileSelectionArgs {
    /// Skip regular depot content
    #[arg(long)]
    pub no_common: bool,

    /// Skip fix overlays
    #[arg(long)]
    pub no_fixes: bool,
}

impl FileSelectionArgs {
    /// Selected kinds: the config toggles minus what the flags turn off.
    pub fn file_types(&self, config: &ConfigFile) -> FileTypes {
        let mut types = FileTypes::NONE;
        if config.install.install_common && !self.no_common {
            types |= FileTypes::COMMON;
        }
        if config.install.install_fixes && !self.no_fixes {
            types |= FileTypes::FIX;
        }
        types
    }
}

/// Find an application by name or id.
pub fn find_application<'a>(catalog: &'a Catalog, name: &str) -> Result<&'a Application, CliError> {
    catalog
        .lookup(name)
        .ok_or_else(|| CliError::UnknownApplication(name.to_string()))
}

/// Resolve the install language: CLI, then config, then a prompt on a
/// terminal, then the first installable language.
pub fn resolve_language(
    cli_language: Option<&str>,
    config: &ConfigFile,
    app: &Application,
) -> Result<Culture, CliError> {
    if let Some(text) = cli_language.or(config.install.language.as_deref()) {
        return Culture::find(text)
            .ok_or_else(|| CliError::Config(format!("Unknown language '{}'", text)));
    }

    let languages = app.installable_languages();
    match languages.as_slice() {
        [] => Err(CliError::Config(format!(
            "{} has no installable language",
            app.name()
        ))),
        [only] => Ok(*only),
        _ if Term::stdout().is_term() => {
            let labels: Vec<String> = languages.iter().map(Culture::display_name).collect();
            let choice = Select::new()
                .with_prompt("Language")
                .items(&labels)
                .default(0)
                .interact()
                .map_err(|e| CliError::Config(format!("Language selection failed: {}", e)))?;
            Ok(languages[choice])
        }
        [first, ..] => Ok(*first),
    }
}

/// Styled label for a check state.
pub fn state_label(state: CheckState) -> String {
    match state {
        CheckState::Installable => style("installable").green().to_string(),
        CheckState::NotInstallable => style("not installable").red().to_string(),
        CheckState::NotChecked => style("not checked").dim().to_string(),
    }
}
