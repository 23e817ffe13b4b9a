//! Plan command - show which files an install would copy.

use clap::Args;
use console::style;

use depotwright::config::format_size;
use depotwright::files_map::{FileKind, FilesMap};

use super::common::{find_application, resolve_language, DepotArgs, FileSelectionArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the plan command.
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Application name or id
    pub app: String,

    /// Language code or name (e.g. de, German)
    #[arg(short, long)]
    pub language: Option<String>,

    #[command(flatten)]
    pub selection: FileSelectionArgs,

    #[command(flatten)]
    pub depots: DepotArgs,

    /// Only print the totals
    #[arg(short, long)]
    pub summary: bool,
}

/// Run the plan command.
pub fn run(runner: &CliRunner, args: PlanArgs) -> Result<(), CliError> {
    let catalog = runner.load_catalog(&args.depots)?;
    let app = find_application(&catalog, &args.app)?;
    if !app.check_state().is_installable() {
        println!("{} is not installable from the given depots.", app.name());
        return Ok(());
    }

    let culture = resolve_language(args.language.as_deref(), runner.config(), app)?;
    let file_types = args.selection.file_types(runner.config());
    let map = FilesMap::build(app)?;
    let files = map.query(file_types, &culture);

    if !args.summary {
        for file in &files {
            let kind = match file.kind {
                FileKind::Common => style("common").dim(),
                FileKind::Fix => style("fix   ").yellow(),
                FileKind::Update => style("update").cyan(),
            };
            let depot = app
                .depot(file.depot_id)
                .map(|depot| depot.name())
                .unwrap_or("?");
            println!(
                "{}  v{:<3} {:<20} {}",
                kind, file.version, depot, file.relative_path
            );
        }
        println!();
    }

    let size = map.files_size(file_types, &culture)?;
    let fixes = files.iter().filter(|file| file.kind.is_fix()).count();
    println!(
        "{} ({}): {} files, {} fixes, {}",
        app.name(),
        culture.display_name(),
        files.len(),
        fixes,
        format_size(size)
    );
    Ok(())
}
