//! Resolution of relative paths to physical depot files.

use std::collections::HashMap;
use std::fs;

use tracing::debug;

use crate::catalog::{Application, ContentKind, Culture};
use crate::depot::{list_files, ListedFile, UNVERSIONED};

use super::types::{FileKind, FileTypes, ResolvedFile};
use super::FilesMapError;

/// What a query needs to know about a depot.
#[derive(Debug, Clone)]
struct DepotInfo {
    required: bool,
    invariant: bool,
    cultures: Vec<Culture>,
    latest_common: Option<i32>,
}

impl DepotInfo {
    fn includes(&self, culture: &Culture) -> bool {
        self.required || self.invariant || self.cultures.contains(culture)
    }
}

/// Every candidate file of an application, grouped by relative path.
///
/// Built once per application from its installable depots: the latest common
/// version of each depot, every fix version, and the shared files a depot
/// borrows from another. A query then picks, per relative path, the file to
/// install for a given language and set of file kinds.
///
/// Relative paths are grouped case-insensitively, in first-seen order.
#[derive(Debug, Clone)]
pub struct FilesMap {
    application_id: u32,
    depots: HashMap<u32, DepotInfo>,
    order: Vec<String>,
    entries: HashMap<String, Vec<ResolvedFile>>,
}

impl FilesMap {
    /// Enumerate the installable depots of `app`.
    pub fn build(app: &Application) -> Result<Self, FilesMapError> {
        let mut map = Self {
            application_id: app.id(),
            depots: app
                .depots()
                .iter()
                .map(|depot| {
                    (
                        depot.id(),
                        DepotInfo {
                            required: depot.is_required(),
                            invariant: depot.is_invariant(),
                            cultures: depot.cultures().to_vec(),
                            latest_common: depot.latest_common_version(),
                        },
                    )
                })
                .collect(),
            order: Vec::new(),
            entries: HashMap::new(),
        };

        let mut listings: HashMap<u32, Vec<ListedFile>> = HashMap::new();

        for depot in app.depots() {
            if !depot.check_state().is_installable() {
                continue;
            }

            if let Some(version) = depot.latest_common_version() {
                for file in latest_listing(app, depot.id(), &mut listings)? {
                    map.add(ResolvedFile {
                        relative_path: file.relative_path.clone(),
                        source_path: file.path.clone(),
                        depot_id: depot.id(),
                        kind: FileKind::Common,
                        version,
                    });
                }
            }

            for (version, dir) in depot.directories(ContentKind::Fix) {
                let files = list_files(dir).map_err(|source| FilesMapError::Io {
                    path: dir.clone(),
                    source,
                })?;
                for file in files {
                    map.add(ResolvedFile {
                        relative_path: file.relative_path,
                        source_path: file.path,
                        depot_id: depot.id(),
                        kind: FileKind::Fix,
                        version: *version,
                    });
                }
            }

            for shared in app.shared_files() {
                if shared.source() == depot.id() || !shared.clients().contains(&depot.id()) {
                    continue;
                }
                let Some(source_version) = app
                    .depot(shared.source())
                    .and_then(|source| source.latest_common_version())
                else {
                    continue;
                };

                let wanted = shared.relative_path().to_lowercase();
                let found = latest_listing(app, shared.source(), &mut listings)?
                    .iter()
                    .find(|file| file.relative_path.to_lowercase() == wanted)
                    .cloned();

                if let Some(file) = found {
                    map.add(ResolvedFile {
                        relative_path: file.relative_path,
                        source_path: file.path,
                        depot_id: depot.id(),
                        kind: FileKind::Common,
                        version: source_version,
                    });
                }
            }
        }

        debug!(
            app = app.name(),
            paths = map.order.len(),
            "Built files map"
        );
        Ok(map)
    }

    fn add(&mut self, file: ResolvedFile) {
        let key = file.relative_path.to_lowercase();
        match self.entries.get_mut(&key) {
            Some(list) => list.push(file),
            None => {
                self.order.push(key.clone());
                self.entries.insert(key, vec![file]);
            }
        }
    }

    pub fn application_id(&self) -> u32 {
        self.application_id
    }

    /// Number of distinct relative paths.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All candidates for a relative path, in insertion order.
    pub fn candidates(&self, relative_path: &str) -> &[ResolvedFile] {
        self.entries
            .get(&relative_path.replace('\\', "/").to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Candidate lists in first-seen order.
    pub fn groups(&self) -> impl Iterator<Item = &[ResolvedFile]> {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key).map(Vec::as_slice))
    }

    /// Files to install for `file_types` and `culture`.
    ///
    /// For each relative path, among candidates from depots included for the
    /// culture (required, invariant or declaring the culture):
    ///
    /// 1. The base is the non-fix candidate with the highest version; ties go
    ///    to the later candidate.
    /// 2. When fixes are requested, a fix of the base's version overlays it,
    ///    or failing that an unversioned fix. The base is listed before its
    ///    overlay when the base's kind is requested too.
    /// 3. A fix without any base is used when its version is its depot's
    ///    latest common version, or when it is unversioned.
    pub fn query(&self, file_types: FileTypes, culture: &Culture) -> Vec<ResolvedFile> {
        let mut result = Vec::new();
        if file_types.is_empty() {
            return result;
        }

        for candidates in self.groups() {
            let included: Vec<&ResolvedFile> = candidates
                .iter()
                .filter(|file| self.includes(file.depot_id, culture))
                .collect();

            let base = included
                .iter()
                .copied()
                .filter(|file| !file.kind.is_fix())
                .fold(None::<&ResolvedFile>, |best, file| match best {
                    Some(best) if best.version > file.version => Some(best),
                    _ => Some(file),
                });

            match base {
                Some(base) => {
                    let overlay = if file_types.contains(FileTypes::FIX) {
                        last_fix(&included, |v| v == base.version)
                            .or_else(|| last_fix(&included, |v| v == UNVERSIONED))
                    } else {
                        None
                    };

                    if file_types.intersects(base.kind.as_types()) {
                        result.push(base.clone());
                    }
                    if let Some(fix) = overlay {
                        result.push(fix.clone());
                    }
                }
                None => {
                    let naked = included.iter().rev().find(|file| {
                        file_types.intersects(file.kind.as_types())
                            && (file.version == UNVERSIONED
                                || Some(file.version) == self.latest_common(file.depot_id))
                    });
                    if let Some(file) = naked {
                        result.push((*file).clone());
                    }
                }
            }
        }

        result
    }

    /// Total size in bytes of the files a query would return.
    pub fn files_size(&self, file_types: FileTypes, culture: &Culture) -> Result<u64, FilesMapError> {
        self.query(file_types, culture)
            .iter()
            .try_fold(0u64, |total, file| {
                let metadata = fs::metadata(&file.source_path).map_err(|source| {
                    FilesMapError::Io {
                        path: file.source_path.clone(),
                        source,
                    }
                })?;
                Ok(total + metadata.len())
            })
    }

    fn includes(&self, depot_id: u32, culture: &Culture) -> bool {
        self.depots
            .get(&depot_id)
            .is_some_and(|info| info.includes(culture))
    }

    fn latest_common(&self, depot_id: u32) -> Option<i32> {
        self.depots.get(&depot_id).and_then(|info| info.latest_common)
    }
}

fn last_fix<'a>(
    included: &[&'a ResolvedFile],
    version_matches: impl Fn(i32) -> bool,
) -> Option<&'a ResolvedFile> {
    included
        .iter()
        .rev()
        .copied()
        .find(|file| file.kind.is_fix() && version_matches(file.version))
}

/// Listing of a depot's latest common directory, cached per depot.
fn latest_listing<'a>(
    app: &Application,
    depot_id: u32,
    listings: &'a mut HashMap<u32, Vec<ListedFile>>,
) -> Result<&'a [ListedFile], FilesMapError> {
    if !listings.contains_key(&depot_id) {
        let files = match app.depot(depot_id).and_then(|d| d.latest_common_dir()) {
            Some(dir) => list_files(dir).map_err(|source| FilesMapError::Io {
                path: dir.to_path_buf(),
                source,
            })?,
            None => Vec::new(),
        };
        listings.insert(depot_id, files);
    }
    Ok(listings.get(&depot_id).map(Vec::as_slice).unwrap_or(&[]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CheckState, Depot, SharedFile};
    use std::path::Path;
    use tempfile::TempDir;

    fn en() -> Culture {
        Culture::find("en").unwrap()
    }

    fn fr() -> Culture {
        Culture::find("fr").unwrap()
    }

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Register `dir` for `(kind, version)` and write `files` into it.
    fn content(
        app: &mut Application,
        depot: u32,
        kind: ContentKind,
        version: i32,
        dir: &Path,
        files: &[(&str, &str)],
    ) {
        fs::create_dir_all(dir).unwrap();
        for (relative, body) in files {
            write(dir, relative, body);
        }
        app.depot_mut(depot)
            .unwrap()
            .add_directory(kind, version, dir)
            .unwrap();
    }

    fn mark_installable(app: &mut Application) {
        for depot in app.depots_mut() {
            depot.set_check_state(CheckState::Installable);
        }
    }

    fn game() -> Application {
        Application::new(1, "Game", "Game", None)
            .with_depot(Depot::new(10, "Main", "Main", false, vec![Culture::INVARIANT]))
            .with_depot(Depot::new(11, "English", "English", true, vec![en()]))
            .with_depot(Depot::new(12, "French", "French", true, vec![fr()]))
    }

    fn paths(files: &[ResolvedFile]) -> Vec<(String, u32, FileKind)> {
        files
            .iter()
            .map(|f| (f.relative_path.clone(), f.depot_id, f.kind))
            .collect()
    }

    #[test]
    fn test_latest_common_version_only() {
        let temp = TempDir::new().unwrap();
        let mut app = game();
        content(&mut app, 10, ContentKind::Common, 1, &temp.path().join("Main.1"), &[("a.txt", "old"), ("only_old.txt", "x")]);
        content(&mut app, 10, ContentKind::Common, 2, &temp.path().join("Main.2"), &[("a.txt", "new")]);
        mark_installable(&mut app);

        let map = FilesMap::build(&app).unwrap();
        let files = map.query(FileTypes::COMMON, &en());

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].version, 2);
        assert_eq!(files[0].source_path, temp.path().join("Main.2/a.txt"));
    }

    #[test]
    fn test_language_depot_overrides_by_version() {
        let temp = TempDir::new().unwrap();
        let mut app = game();
        content(&mut app, 10, ContentKind::Common, 1, &temp.path().join("Main.1"), &[("text.dat", "main")]);
        content(&mut app, 11, ContentKind::Common, 3, &temp.path().join("English.3"), &[("text.dat", "en")]);
        content(&mut app, 12, ContentKind::Common, 2, &temp.path().join("French.2"), &[("text.dat", "fr")]);
        mark_installable(&mut app);

        let map = FilesMap::build(&app).unwrap();

        let english = map.query(FileTypes::COMMON, &en());
        assert_eq!(paths(&english), vec![("text.dat".to_string(), 11, FileKind::Common)]);

        // English depot is excluded for French, so the French file wins
        let french = map.query(FileTypes::COMMON, &fr());
        assert_eq!(paths(&french), vec![("text.dat".to_string(), 12, FileKind::Common)]);
    }

    #[test]
    fn test_equal_versions_later_depot_wins() {
        let temp = TempDir::new().unwrap();
        let mut app = game();
        content(&mut app, 10, ContentKind::Common, 1, &temp.path().join("Main.1"), &[("x", "main")]);
        content(&mut app, 11, ContentKind::Common, 1, &temp.path().join("English.1"), &[("x", "en")]);
        mark_installable(&mut app);

        let files = FilesMap::build(&app).unwrap().query(FileTypes::COMMON, &en());
        assert_eq!(files[0].depot_id, 11);
    }

    #[test]
    fn test_fix_overlay_emits_base_then_fix() {
        let temp = TempDir::new().unwrap();
        let mut app = game();
        content(&mut app, 10, ContentKind::Common, 1, &temp.path().join("Main.1"), &[("f", "base")]);
        content(&mut app, 10, ContentKind::Fix, 1, &temp.path().join("_Fixes/Main.1"), &[("f", "fixed")]);
        content(&mut app, 11, ContentKind::Common, 1, &temp.path().join("English.1"), &[("e", "en")]);
        mark_installable(&mut app);

        let map = FilesMap::build(&app).unwrap();

        let both = map.query(FileTypes::COMMON | FileTypes::FIX, &en());
        assert_eq!(
            paths(&both),
            vec![
                ("f".to_string(), 10, FileKind::Common),
                ("f".to_string(), 10, FileKind::Fix),
                ("e".to_string(), 11, FileKind::Common),
            ]
        );

        let fixes_only = map.query(FileTypes::FIX, &en());
        assert_eq!(paths(&fixes_only), vec![("f".to_string(), 10, FileKind::Fix)]);

        let common_only = map.query(FileTypes::COMMON, &en());
        assert!(common_only.iter().all(|f| f.kind == FileKind::Common));
        assert_eq!(common_only.len(), 2);
    }

    #[test]
    fn test_fix_for_other_version_ignored() {
        let temp = TempDir::new().unwrap();
        let mut app = game();
        content(&mut app, 10, ContentKind::Common, 2, &temp.path().join("Main.2"), &[("f", "base")]);
        content(&mut app, 10, ContentKind::Fix, 1, &temp.path().join("_Fixes/Main.1"), &[("f", "stale")]);
        mark_installable(&mut app);

        let files = FilesMap::build(&app).unwrap().query(FileTypes::ANY, &en());
        assert_eq!(paths(&files), vec![("f".to_string(), 10, FileKind::Common)]);
    }

    #[test]
    fn test_unversioned_fix_applies_to_any_base() {
        let temp = TempDir::new().unwrap();
        let mut app = game();
        content(&mut app, 10, ContentKind::Common, 5, &temp.path().join("Main.5"), &[("f", "base")]);
        content(&mut app, 10, ContentKind::Fix, -1, &temp.path().join("_Fixes/Main"), &[("f", "fix")]);
        mark_installable(&mut app);

        let files = FilesMap::build(&app).unwrap().query(FileTypes::ANY, &en());
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].kind, FileKind::Fix);
        assert_eq!(files[1].version, -1);
    }

    #[test]
    fn test_naked_fix_matches_latest_common() {
        let temp = TempDir::new().unwrap();
        let mut app = game();
        content(&mut app, 10, ContentKind::Common, 2, &temp.path().join("Main.2"), &[("base", "b")]);
        content(&mut app, 10, ContentKind::Fix, 2, &temp.path().join("_Fixes/Main.2"), &[("new.dll", "n")]);
        content(&mut app, 10, ContentKind::Fix, 1, &temp.path().join("_Fixes/Main.1"), &[("old.dll", "o")]);
        mark_installable(&mut app);

        let files = FilesMap::build(&app).unwrap().query(FileTypes::FIX, &en());
        assert_eq!(paths(&files), vec![("new.dll".to_string(), 10, FileKind::Fix)]);
    }

    #[test]
    fn test_shared_file_synthesized_for_client() {
        let temp = TempDir::new().unwrap();
        let mut app = game().with_shared_file(SharedFile::new("voices.bsa", 11, vec![12]));
        content(&mut app, 10, ContentKind::Common, 1, &temp.path().join("Main.1"), &[("main", "m")]);
        content(&mut app, 11, ContentKind::Common, 4, &temp.path().join("English.4"), &[("Voices.bsa", "v")]);
        content(&mut app, 12, ContentKind::Common, 1, &temp.path().join("French.1"), &[("text", "t")]);
        mark_installable(&mut app);

        let map = FilesMap::build(&app).unwrap();
        let french = map.query(FileTypes::COMMON, &fr());
        let shared = french
            .iter()
            .find(|f| f.relative_path == "Voices.bsa")
            .expect("shared file resolved for French");

        assert_eq!(shared.depot_id, 12);
        assert_eq!(shared.version, 4);
        assert_eq!(shared.source_path, temp.path().join("English.4/Voices.bsa"));
    }

    #[test]
    fn test_non_installable_depot_skipped() {
        let temp = TempDir::new().unwrap();
        let mut app = game();
        content(&mut app, 10, ContentKind::Common, 1, &temp.path().join("Main.1"), &[("a", "a")]);
        content(&mut app, 11, ContentKind::Common, 1, &temp.path().join("English.1"), &[("b", "b")]);
        mark_installable(&mut app);
        app.depot_mut(11).unwrap().set_check_state(CheckState::NotInstallable);

        let files = FilesMap::build(&app).unwrap().query(FileTypes::COMMON, &en());
        assert_eq!(paths(&files), vec![("a".to_string(), 10, FileKind::Common)]);
    }

    #[test]
    fn test_one_result_per_path_and_nested_paths() {
        let temp = TempDir::new().unwrap();
        let mut app = game();
        content(&mut app, 10, ContentKind::Common, 1, &temp.path().join("Main.1"), &[("common/Game/data/a.pak", "1"), ("common/Game/b.exe", "2")]);
        content(&mut app, 11, ContentKind::Common, 1, &temp.path().join("English.1"), &[("common/Game/data/A.pak", "3")]);
        mark_installable(&mut app);

        let files = FilesMap::build(&app).unwrap().query(FileTypes::COMMON, &en());
        assert_eq!(files.len(), 2);
        let mut relative: Vec<String> = files.iter().map(|f| f.relative_path.to_lowercase()).collect();
        relative.sort();
        assert_eq!(relative, vec!["common/game/b.exe", "common/game/data/a.pak"]);
    }

    #[test]
    fn test_none_types_returns_nothing() {
        let temp = TempDir::new().unwrap();
        let mut app = game();
        content(&mut app, 10, ContentKind::Common, 1, &temp.path().join("Main.1"), &[("a", "a")]);
        mark_installable(&mut app);

        let map = FilesMap::build(&app).unwrap();
        assert!(map.query(FileTypes::NONE, &en()).is_empty());
        assert_eq!(map.files_size(FileTypes::NONE, &en()).unwrap(), 0);
    }

    #[test]
    fn test_files_size() {
        let temp = TempDir::new().unwrap();
        let mut app = game();
        content(&mut app, 10, ContentKind::Common, 1, &temp.path().join("Main.1"), &[("a", "12345"), ("b", "678")]);
        mark_installable(&mut app);

        let map = FilesMap::build(&app).unwrap();
        assert_eq!(map.files_size(FileTypes::COMMON, &en()).unwrap(), 8);
        assert_eq!(map.candidates("A").len(), 1);
    }
}
