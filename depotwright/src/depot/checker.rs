//! Installability check.
//!
//! A depot is installable when it has at least one common directory and every
//! shared file it takes part in exists in the source depot's latest common
//! directory. A missing shared file takes down the depot being checked and
//! every client of that file. The application's [`CheckRule`] then gets a
//! chance to veto further depots before the verdicts are committed.
//!
//! An application is installable when all required depots are installable
//! and at least one language-specific depot is.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{Application, Catalog, CheckRule, CheckState};

use super::listing::list_files;

/// Errors that can occur during the installability check.
#[derive(Debug, Error)]
pub enum CheckError {
    /// A depot directory could not be listed.
    #[error("failed to list depot directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Evaluates depots and applications once, after probing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepotChecker;

/// Lower-cased relative paths of each depot's latest common directory.
type ListingCache = HashMap<u32, HashSet<String>>;

impl DepotChecker {
    pub fn new() -> Self {
        Self
    }

    /// Check every application of the catalog.
    pub fn check_catalog(&self, catalog: &mut Catalog) -> Result<(), CheckError> {
        for app in catalog.applications_mut() {
            self.check(app)?;
        }
        info!(
            installable = catalog.installable_applications().count(),
            total = catalog.applications().len(),
            "Installability check complete"
        );
        Ok(())
    }

    /// Check one application. Already-checked applications keep their state.
    pub fn check(&self, app: &mut Application) -> Result<CheckState, CheckError> {
        if app.check_state() != CheckState::NotChecked {
            return Ok(app.check_state());
        }

        let mut listings = ListingCache::new();
        let mut failed: HashSet<u32> = HashSet::new();

        for depot in app.depots() {
            if !depot.has_common_content() {
                debug!(depot = depot.name(), "Depot has no content directory");
                failed.insert(depot.id());
                continue;
            }

            for shared in app.shared_files_of(depot.id()) {
                if !contains_file(app, shared.source(), shared.relative_path(), &mut listings)? {
                    warn!(
                        depot = depot.name(),
                        file = shared.relative_path(),
                        "Shared file missing from source depot"
                    );
                    failed.insert(depot.id());
                    failed.extend(shared.clients().iter().copied());
                }
            }
        }

        if let CheckRule::RequireFiles { depots, files } = app.check_rule() {
            for depot_id in depots {
                if failed.contains(depot_id) {
                    continue;
                }
                for file in files {
                    if !contains_file(app, *depot_id, file, &mut listings)? {
                        debug!(depot = depot_id, file = file.as_str(), "Required file missing");
                        failed.insert(*depot_id);
                        break;
                    }
                }
            }
        }

        let mut required_failed = false;
        let mut any_language_depot = false;
        for depot in app.depots_mut() {
            if failed.contains(&depot.id()) {
                depot.set_check_state(CheckState::NotInstallable);
                required_failed |= depot.is_required();
            } else {
                depot.set_check_state(CheckState::Installable);
                any_language_depot |= !depot.is_invariant();
            }
        }

        let state = if required_failed || !any_language_depot {
            CheckState::NotInstallable
        } else {
            CheckState::Installable
        };
        app.set_check_state(state);

        debug!(app = app.name(), ?state, "Checked application");
        Ok(state)
    }
}

/// Whether `relative_path` exists in the latest common directory of `depot_id`.
fn contains_file(
    app: &Application,
    depot_id: u32,
    relative_path: &str,
    listings: &mut ListingCache,
) -> Result<bool, CheckError> {
    if !listings.contains_key(&depot_id) {
        let Some(dir) = app.depot(depot_id).and_then(|d| d.latest_common_dir()) else {
            return Ok(false);
        };
        let files = list_files(dir).map_err(|source| CheckError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        listings.insert(
            depot_id,
            files
                .into_iter()
                .map(|f| f.relative_path.to_lowercase())
                .collect(),
        );
    }

    let wanted = crate::catalog::normalize_relative(relative_path).to_lowercase();
    Ok(listings
        .get(&depot_id)
        .is_some_and(|files| files.contains(&wanted)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ContentKind, Culture, Depot, SharedFile};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn en() -> Culture {
        Culture::find("en").unwrap()
    }

    fn pl() -> Culture {
        Culture::find("pl").unwrap()
    }

    fn write(root: &Path, relative: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, relative).unwrap();
        path
    }

    fn add_dir(app: &mut Application, depot: u32, dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        app.depot_mut(depot)
            .unwrap()
            .add_directory(ContentKind::Common, 1, dir)
            .unwrap();
    }

    fn game() -> Application {
        Application::new(1, "Game", "Game", None)
            .with_depot(Depot::new(10, "Main", "Main", false, vec![Culture::INVARIANT]))
            .with_depot(Depot::new(11, "English", "English", true, vec![en()]))
            .with_depot(Depot::new(12, "Polish", "Polish", true, vec![pl()]))
    }

    #[test]
    fn test_all_present_is_installable() {
        let temp = TempDir::new().unwrap();
        let mut app = game();
        for (id, name) in [(10, "Main"), (11, "English"), (12, "Polish")] {
            add_dir(&mut app, id, &temp.path().join(name));
        }

        assert_eq!(DepotChecker::new().check(&mut app).unwrap(), CheckState::Installable);
        assert!(app.depots().iter().all(|d| d.check_state().is_installable()));
    }

    #[test]
    fn test_missing_required_depot() {
        let temp = TempDir::new().unwrap();
        let mut app = game();
        add_dir(&mut app, 11, &temp.path().join("English"));

        assert_eq!(DepotChecker::new().check(&mut app).unwrap(), CheckState::NotInstallable);
        assert_eq!(app.depot(10).unwrap().check_state(), CheckState::NotInstallable);
        assert_eq!(app.depot(11).unwrap().check_state(), CheckState::Installable);
    }

    #[test]
    fn test_only_invariant_depots_is_not_installable() {
        let temp = TempDir::new().unwrap();
        let mut app = game();
        add_dir(&mut app, 10, &temp.path().join("Main"));

        assert_eq!(DepotChecker::new().check(&mut app).unwrap(), CheckState::NotInstallable);
    }

    #[test]
    fn test_missing_shared_file_fails_source_and_clients() {
        let temp = TempDir::new().unwrap();
        let mut app = game().with_shared_file(SharedFile::new("common/voices.bsa", 11, vec![12]));
        add_dir(&mut app, 10, &temp.path().join("Main"));
        add_dir(&mut app, 11, &temp.path().join("English"));
        add_dir(&mut app, 12, &temp.path().join("Polish"));

        let state = DepotChecker::new().check(&mut app).unwrap();

        assert_eq!(app.depot(11).unwrap().check_state(), CheckState::NotInstallable);
        assert_eq!(app.depot(12).unwrap().check_state(), CheckState::NotInstallable);
        // Only optional depots failed, but no language depot is left
        assert_eq!(state, CheckState::NotInstallable);
    }

    #[test]
    fn test_shared_file_matched_case_insensitively() {
        let temp = TempDir::new().unwrap();
        let mut app =
            game().with_shared_file(SharedFile::new(r"common\Data\Voices.BSA", 11, vec![12]));
        add_dir(&mut app, 10, &temp.path().join("Main"));
        add_dir(&mut app, 11, &temp.path().join("English"));
        add_dir(&mut app, 12, &temp.path().join("Polish"));
        write(&temp.path().join("English"), "common/data/voices.bsa");

        DepotChecker::new().check(&mut app).unwrap();
        assert_eq!(app.depot(12).unwrap().check_state(), CheckState::Installable);
    }

    #[test]
    fn test_require_files_rule() {
        let temp = TempDir::new().unwrap();
        let mut app = game().with_check_rule(CheckRule::RequireFiles {
            depots: vec![12],
            files: vec!["common/pl.txt".to_string(), "common/pl2.txt".to_string()],
        });
        add_dir(&mut app, 10, &temp.path().join("Main"));
        add_dir(&mut app, 11, &temp.path().join("English"));
        add_dir(&mut app, 12, &temp.path().join("Polish"));
        write(&temp.path().join("Polish"), "common/pl.txt");

        let state = DepotChecker::new().check(&mut app).unwrap();
        assert_eq!(state, CheckState::Installable);
        assert_eq!(app.depot(12).unwrap().check_state(), CheckState::NotInstallable);
        assert_eq!(app.depot(11).unwrap().check_state(), CheckState::Installable);
    }

    #[test]
    fn test_check_runs_once() {
        let temp = TempDir::new().unwrap();
        let mut app = game();
        add_dir(&mut app, 10, &temp.path().join("Main"));
        add_dir(&mut app, 11, &temp.path().join("English"));

        let checker = DepotChecker::new();
        assert_eq!(checker.check(&mut app).unwrap(), CheckState::Installable);

        // New content after the check is not picked up
        add_dir(&mut app, 12, &temp.path().join("Polish"));
        assert_eq!(checker.check(&mut app).unwrap(), CheckState::Installable);
        assert_eq!(app.depot(12).unwrap().check_state(), CheckState::NotInstallable);
    }
}
