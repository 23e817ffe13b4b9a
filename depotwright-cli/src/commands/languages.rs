//! Languages command - list the installable languages of an application.

use clap::Args;

use super::common::{find_application, DepotArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the languages command.
#[derive(Debug, Args)]
pub struct LanguagesArgs {
    /// Application name or id
    pub app: String,

    #[command(flatten)]
    pub depots: DepotArgs,
}

/// Run the languages command.
pub fn run(runner: &CliRunner, args: LanguagesArgs) -> Result<(), CliError> {
    let catalog = runner.load_catalog(&args.depots)?;
    let app = find_application(&catalog, &args.app)?;

    let languages = catalog.installable_languages(app.name());
    if languages.is_empty() {
        println!("{} has no installable language.", app.name());
        return Ok(());
    }

    for language in languages {
        println!("{}", language);
    }
    Ok(())
}
