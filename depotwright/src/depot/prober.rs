//! Locating depot directories on disk.
//!
//! Depot directories live anywhere below the configured roots. The prober
//! looks at every root's children and, up to a depth limit, their
//! subdirectories. Fixes live in a dedicated container directory
//! (`_Fixes` by default) and are searched one level deep:
//!
//! ```text
//! depots/
//! ├── Skyrim Content.2/        common, version 2
//! ├── Skyrim Content.v3/       common, version 3
//! ├── Skyrim english/          common, unversioned
//! └── _Fixes/
//!     └── Skyrim Content.3/    fix, version 3
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{Application, Catalog, ContentKind};

use super::listing::subdirectories;
use super::naming::match_depot_dir;

/// Default name of the directory holding fix overlays.
pub const DEFAULT_FIXES_DIR: &str = "_Fixes";

/// Default number of directory levels searched below each root's children.
pub const DEFAULT_MAX_DEPTH: usize = 1;

/// Errors that can occur while probing depot directories.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A directory could not be listed.
    #[error("failed to list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two directories resolve to the same depot, version and kind.
    #[error(
        "depot '{depot}' has two {kind} directories for version {version}: {first} and {second}"
    )]
    DirectoryCollision {
        depot: String,
        version: i32,
        kind: &'static str,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Counts of what a probe found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeReport {
    /// Directories registered as common content.
    pub common_dirs: usize,
    /// Directories registered as fixes.
    pub fix_dirs: usize,
}

impl ProbeReport {
    pub fn total(&self) -> usize {
        self.common_dirs + self.fix_dirs
    }
}

impl std::ops::AddAssign for ProbeReport {
    fn add_assign(&mut self, other: Self) {
        self.common_dirs += other.common_dirs;
        self.fix_dirs += other.fix_dirs;
    }
}

/// Scans root directories for depot content.
#[derive(Debug, Clone)]
pub struct DepotProber {
    fixes_dir: String,
    max_depth: usize,
}

impl Default for DepotProber {
    fn default() -> Self {
        Self {
            fixes_dir: DEFAULT_FIXES_DIR.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DepotProber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name of the fixes container directory.
    pub fn with_fixes_dir(mut self, name: impl Into<String>) -> Self {
        self.fixes_dir = name.into();
        self
    }

    /// Set how many levels below the roots' children are searched.
    ///
    /// `0` only looks at the roots' direct children.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Probe every application of the catalog.
    pub fn probe_catalog(
        &self,
        catalog: &mut Catalog,
        roots: &[PathBuf],
    ) -> Result<ProbeReport, ProbeError> {
        let mut report = ProbeReport::default();
        for app in catalog.applications_mut() {
            report += self.probe(app, roots)?;
        }
        info!(
            common = report.common_dirs,
            fixes = report.fix_dirs,
            "Depot probe complete"
        );
        Ok(report)
    }

    /// Register the directories belonging to `app`'s depots.
    pub fn probe(&self, app: &mut Application, roots: &[PathBuf]) -> Result<ProbeReport, ProbeError> {
        let mut report = ProbeReport::default();
        for root in roots {
            let children = list_dirs(root)?;
            self.walk(app, &children, 0, &mut report)?;
        }
        debug!(
            app = app.name(),
            common = report.common_dirs,
            fixes = report.fix_dirs,
            "Probed application"
        );
        Ok(report)
    }

    fn walk(
        &self,
        app: &mut Application,
        dirs: &[PathBuf],
        depth: usize,
        report: &mut ProbeReport,
    ) -> Result<(), ProbeError> {
        for dir in dirs {
            let name = dir_name(dir);

            if register(app, &name, dir, ContentKind::Common)? {
                report.common_dirs += 1;
            } else if name.eq_ignore_ascii_case(&self.fixes_dir) {
                for fix_dir in list_dirs(dir)? {
                    if register(app, &dir_name(&fix_dir), &fix_dir, ContentKind::Fix)? {
                        report.fix_dirs += 1;
                    }
                }
            }

            if depth < self.max_depth && !name.eq_ignore_ascii_case(&self.fixes_dir) {
                let children = list_dirs(dir)?;
                self.walk(app, &children, depth + 1, report)?;
            }
        }
        Ok(())
    }
}

/// Register `dir` with every depot whose base name it matches.
fn register(
    app: &mut Application,
    name: &str,
    dir: &Path,
    kind: ContentKind,
) -> Result<bool, ProbeError> {
    let mut matched = false;

    for depot in app.depots_mut() {
        let Some(version) = match_depot_dir(name, depot.base_name()) else {
            continue;
        };

        depot
            .add_directory(kind, version, dir)
            .map_err(|first| ProbeError::DirectoryCollision {
                depot: depot.name().to_string(),
                version,
                kind: kind.name(),
                first,
                second: dir.to_path_buf(),
            })?;
        debug!(
            depot = depot.name(),
            version,
            kind = kind.name(),
            path = %dir.display(),
            "Found depot directory"
        );
        matched = true;
    }

    Ok(matched)
}

fn list_dirs(dir: &Path) -> Result<Vec<PathBuf>, ProbeError> {
    subdirectories(dir).map_err(|source| ProbeError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Culture, Depot};
    use std::fs;
    use tempfile::TempDir;

    fn sample_app() -> Application {
        Application::new(1, "Game", "Game", None)
            .with_depot(Depot::new(10, "Content", "Game Content", false, vec![Culture::INVARIANT]))
            .with_depot(Depot::new(
                11,
                "English",
                "Game English",
                true,
                vec![Culture::find("en").unwrap()],
            ))
    }

    fn mkdirs(root: &Path, dirs: &[&str]) {
        for dir in dirs {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
    }

    #[test]
    fn test_probe_common_versions() {
        let temp = TempDir::new().unwrap();
        mkdirs(temp.path(), &["Game Content.1", "game content.v2", "Game English", "Other"]);

        let mut app = sample_app();
        let report = DepotProber::new()
            .probe(&mut app, &[temp.path().to_path_buf()])
            .unwrap();

        assert_eq!(report.common_dirs, 3);
        let content = app.depot(10).unwrap();
        assert_eq!(
            content.directories(ContentKind::Common).keys().copied().collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(app.depot(11).unwrap().latest_common_version(), Some(-1));
    }

    #[test]
    fn test_probe_fixes_container() {
        let temp = TempDir::new().unwrap();
        mkdirs(
            temp.path(),
            &["Game Content.2", "_fixes/Game Content.2", "_Fixes/Game English"],
        );

        let mut app = sample_app();
        let report = DepotProber::new()
            .probe(&mut app, &[temp.path().to_path_buf()])
            .unwrap();

        assert_eq!(report.fix_dirs, 2);
        assert!(app.depot(10).unwrap().directories(ContentKind::Fix).contains_key(&2));
        assert!(app.depot(11).unwrap().directories(ContentKind::Fix).contains_key(&-1));
        assert!(!app.depot(11).unwrap().has_common_content());
    }

    #[test]
    fn test_probe_nested_within_depth() {
        let temp = TempDir::new().unwrap();
        mkdirs(temp.path(), &["disc1/Game Content.1", "disc1/deeper/Game English"]);

        let mut app = sample_app();
        DepotProber::new()
            .probe(&mut app, &[temp.path().to_path_buf()])
            .unwrap();

        assert!(app.depot(10).unwrap().has_common_content());
        assert!(!app.depot(11).unwrap().has_common_content());

        let mut app = sample_app();
        DepotProber::new()
            .with_max_depth(2)
            .probe(&mut app, &[temp.path().to_path_buf()])
            .unwrap();
        assert!(app.depot(11).unwrap().has_common_content());
    }

    #[test]
    fn test_probe_does_not_recurse_into_fix_dirs() {
        let temp = TempDir::new().unwrap();
        mkdirs(temp.path(), &["_Fixes/nested/Game Content.4"]);

        let mut app = sample_app();
        let report = DepotProber::new()
            .with_max_depth(3)
            .probe(&mut app, &[temp.path().to_path_buf()])
            .unwrap();

        assert_eq!(report.total(), 0);
    }

    #[test]
    fn test_probe_collision_is_error() {
        let temp = TempDir::new().unwrap();
        mkdirs(temp.path(), &["Game Content.3", "Game Content.v3"]);

        let mut app = sample_app();
        let err = DepotProber::new()
            .probe(&mut app, &[temp.path().to_path_buf()])
            .unwrap_err();

        match err {
            ProbeError::DirectoryCollision { version, kind, .. } => {
                assert_eq!(version, 3);
                assert_eq!(kind, "common");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_probe_collision_across_roots() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        mkdirs(first.path(), &["Game English"]);
        mkdirs(second.path(), &["Game English"]);

        let mut app = sample_app();
        let result = DepotProber::new().probe(
            &mut app,
            &[first.path().to_path_buf(), second.path().to_path_buf()],
        );
        assert!(matches!(result, Err(ProbeError::DirectoryCollision { .. })));
    }

    #[test]
    fn test_custom_fixes_dir_name() {
        let temp = TempDir::new().unwrap();
        mkdirs(temp.path(), &["patches/Game Content.1"]);

        let mut app = sample_app();
        let report = DepotProber::new()
            .with_fixes_dir("patches")
            .probe(&mut app, &[temp.path().to_path_buf()])
            .unwrap();
        assert_eq!(report.fix_dirs, 1);
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let mut app = sample_app();
        let result = DepotProber::new().probe(&mut app, &[PathBuf::from("/nonexistent/depots")]);
        assert!(matches!(result, Err(ProbeError::Io { .. })));
    }
}
