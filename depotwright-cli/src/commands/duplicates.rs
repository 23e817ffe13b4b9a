//! Duplicates command - find identical files across depots.
//!
//! Identical files in different depots can be declared as shared files in a
//! catalog, so the client depot stays installable when only the source depot
//! ships the file.

use std::collections::BTreeSet;

use clap::Args;

use depotwright::catalog::{Application, SharedFileEntry};
use depotwright::files_map::{FileTypes, FilesMap, ResolvedFile};

use super::common::{find_application, DepotArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the duplicates command.
#[derive(Debug, Args)]
pub struct DuplicatesArgs {
    /// Application name or id
    pub app: String,

    #[command(flatten)]
    pub depots: DepotArgs,

    /// Print suggestions as catalog `shared_files` JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the duplicates command.
pub fn run(runner: &CliRunner, args: DuplicatesArgs) -> Result<(), CliError> {
    let catalog = runner.load_catalog(&args.depots)?;
    let app = find_application(&catalog, &args.app)?;

    let map = FilesMap::build(app)?;
    let groups = map.same_files(FileTypes::COMMON)?;
    let suggestions: Vec<SharedFileEntry> = groups.iter().filter_map(|group| suggest(group)).collect();

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&suggestions)
                .map_err(|e| CliError::Config(format!("Failed to encode suggestions: {}", e)))?
        );
        return Ok(());
    }

    if suggestions.is_empty() {
        println!("No identical files across depots of {}.", app.name());
        return Ok(());
    }
    for suggestion in &suggestions {
        println!(
            "{}: {} -> {}",
            suggestion.path,
            depot_label(app, suggestion.source),
            suggestion
                .clients
                .iter()
                .map(|id| depot_label(app, *id))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    println!();
    println!("{} shared file candidates", suggestions.len());
    Ok(())
}

/// The first depot of a group becomes the source, the other depots clients.
fn suggest(group: &[ResolvedFile]) -> Option<SharedFileEntry> {
    let (first, rest) = group.split_first()?;
    let clients: Vec<u32> = rest
        .iter()
        .map(|file| file.depot_id)
        .filter(|id| *id != first.depot_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if clients.is_empty() {
        return None;
    }

    Some(SharedFileEntry {
        path: first.relative_path.clone(),
        source: first.depot_id,
        clients,
    })
}

fn depot_label(app: &Application, id: u32) -> String {
    match app.depot(id) {
        Some(depot) => format!("{} ({})", depot.name(), id),
        None => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depotwright::files_map::FileKind;
    use std::path::PathBuf;

    fn file(depot_id: u32) -> ResolvedFile {
        ResolvedFile {
            relative_path: "data/shared.pak".to_string(),
            source_path: PathBuf::from(format!("/depots/{depot_id}/data/shared.pak")),
            depot_id,
            kind: FileKind::Common,
            version: 1,
        }
    }

    #[test]
    fn test_suggest_source_and_clients() {
        let suggestion = suggest(&[file(10), file(12), file(11), file(12)]).unwrap();
        assert_eq!(suggestion.source, 10);
        assert_eq!(suggestion.clients, vec![11, 12]);
        assert_eq!(suggestion.path, "data/shared.pak");
    }

    #[test]
    fn test_suggest_same_depot_only() {
        assert!(suggest(&[file(10), file(10)]).is_none());
    }
}
