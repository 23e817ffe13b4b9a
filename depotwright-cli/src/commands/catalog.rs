//! Catalog command - export the application catalog as JSON.

use std::fs;
use std::path::PathBuf;

use clap::Args;

use depotwright::catalog::{Catalog, CatalogFile};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the catalog command.
#[derive(Debug, Args)]
pub struct CatalogArgs {
    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Export the built-in catalog even when a catalog file is configured
    #[arg(long)]
    pub builtin: bool,
}

/// Run the catalog command.
pub fn run(runner: &CliRunner, args: CatalogArgs) -> Result<(), CliError> {
    let catalog = match (&runner.config().depots.catalog, args.builtin) {
        (Some(path), false) => Catalog::from_json_file(path)?,
        _ => Catalog::builtin(),
    };

    let file = CatalogFile::from_applications(catalog.applications());
    let json = serde_json::to_string_pretty(&file)
        .map_err(|e| CliError::Config(format!("Failed to encode catalog: {}", e)))?;

    match args.output {
        Some(path) => {
            fs::write(&path, json + "\n")?;
            println!(
                "Wrote {} applications to {}",
                catalog.applications().len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}
