//! Apps command - list catalog applications and their installability.

use clap::Args;
use console::style;

use depotwright::catalog::{Catalog, ContentKind, Culture};

use super::common::{state_label, DepotArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the apps command.
#[derive(Debug, Args)]
pub struct AppsArgs {
    #[command(flatten)]
    pub depots: DepotArgs,

    /// Also list applications that cannot be installed
    #[arg(short, long)]
    pub all: bool,

    /// Show every depot with its directories
    #[arg(long)]
    pub depots_detail: bool,
}

/// Run the apps command.
pub fn run(runner: &CliRunner, args: AppsArgs) -> Result<(), CliError> {
    let catalog = runner.load_catalog(&args.depots)?;
    print_applications(&catalog, args.all, args.depots_detail);
    Ok(())
}

fn print_applications(catalog: &Catalog, all: bool, detail: bool) {
    let mut shown = 0;

    for app in catalog.applications() {
        if !all && !app.check_state().is_installable() {
            continue;
        }
        shown += 1;

        println!(
            "{:>8}  {}  [{}]",
            app.id(),
            style(app.name()).bold(),
            state_label(app.check_state())
        );

        let languages: Vec<String> = app
            .installable_languages()
            .iter()
            .map(Culture::display_name)
            .collect();
        if !languages.is_empty() {
            println!("          Languages: {}", languages.join(", "));
        }

        if detail {
            for depot in app.depots() {
                println!(
                    "          {:>8}  {} ({}) [{}]",
                    depot.id(),
                    depot.name(),
                    if depot.is_optional() { "optional" } else { "required" },
                    state_label(depot.check_state())
                );
                for kind in [ContentKind::Common, ContentKind::Fix] {
                    for (version, dir) in depot.directories(kind) {
                        println!(
                            "                    {} v{}: {}",
                            kind.name(),
                            version,
                            dir.display()
                        );
                    }
                }
            }
        }
    }

    if shown == 0 {
        println!("No installable applications found.");
        if !all {
            println!("Use --all to list every known application.");
        }
    }
}
