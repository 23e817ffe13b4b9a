//! Applications, depots and shared files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::culture::Culture;

/// Result of the installability check for a depot or an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckState {
    /// Not evaluated yet.
    #[default]
    NotChecked,
    /// Content is present and consistent.
    Installable,
    /// Content is missing or incomplete.
    NotInstallable,
}

impl CheckState {
    /// Whether the state is [`CheckState::Installable`].
    pub fn is_installable(&self) -> bool {
        matches!(self, Self::Installable)
    }
}

/// Kind of content a depot directory carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// Regular content directory, e.g. `Skyrim Content.3`.
    Common,
    /// Overlay directory found under the fixes container.
    Fix,
}

impl ContentKind {
    /// Lower-case name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Fix => "fix",
        }
    }
}

/// Additional validation run after the generic installability pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckRule {
    /// Generic rules only.
    #[default]
    Default,
    /// Each listed depot, if otherwise installable, must contain every
    /// listed file in its latest common directory.
    RequireFiles {
        /// Depot ids the rule applies to.
        depots: Vec<u32>,
        /// Relative paths that must be present.
        files: Vec<String>,
    },
}

/// A file that one depot ships and other depots reuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedFile {
    relative_path: String,
    source: u32,
    clients: Vec<u32>,
}

impl SharedFile {
    /// Declare a shared file.
    ///
    /// Backslashes in `relative_path` are normalized to `/`.
    pub fn new(relative_path: impl AsRef<str>, source: u32, clients: Vec<u32>) -> Self {
        Self {
            relative_path: normalize_relative(relative_path.as_ref()),
            source,
            clients,
        }
    }

    /// Relative path, `/`-separated.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Depot that owns the physical file.
    pub fn source(&self) -> u32 {
        self.source
    }

    /// Depots that reuse the file.
    pub fn clients(&self) -> &[u32] {
        &self.clients
    }

    /// Whether `depot_id` is the source or one of the clients.
    pub fn involves(&self, depot_id: u32) -> bool {
        self.source == depot_id || self.clients.contains(&depot_id)
    }
}

/// One unit of content: base data, a language pack, DLC, and so on.
#[derive(Debug, Clone)]
pub struct Depot {
    id: u32,
    name: String,
    base_name: String,
    optional: bool,
    cultures: Vec<Culture>,
    check_state: CheckState,
    common_dirs: BTreeMap<i32, PathBuf>,
    fix_dirs: BTreeMap<i32, PathBuf>,
}

impl Depot {
    /// Create a depot.
    ///
    /// An empty culture list is replaced by the invariant culture so that
    /// every depot declares at least one culture.
    pub fn new(
        id: u32,
        name: impl Into<String>,
        base_name: impl Into<String>,
        optional: bool,
        cultures: Vec<Culture>,
    ) -> Self {
        let cultures = if cultures.is_empty() {
            vec![Culture::INVARIANT]
        } else {
            cultures
        };

        Self {
            id,
            name: name.into(),
            base_name: base_name.into(),
            optional,
            cultures,
            check_state: CheckState::NotChecked,
            common_dirs: BTreeMap::new(),
            fix_dirs: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical directory base name, without version suffix.
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_required(&self) -> bool {
        !self.optional
    }

    pub fn cultures(&self) -> &[Culture] {
        &self.cultures
    }

    pub fn has_culture(&self, culture: &Culture) -> bool {
        self.cultures.contains(culture)
    }

    /// Whether the depot applies regardless of language.
    pub fn is_invariant(&self) -> bool {
        self.cultures.iter().any(Culture::is_invariant)
    }

    /// Whether the depot takes part in an installation for `culture`.
    pub fn is_included_for(&self, culture: &Culture) -> bool {
        self.is_required() || self.is_invariant() || self.has_culture(culture)
    }

    pub fn check_state(&self) -> CheckState {
        self.check_state
    }

    pub(crate) fn set_check_state(&mut self, state: CheckState) {
        self.check_state = state;
    }

    /// Version map of the given kind.
    pub fn directories(&self, kind: ContentKind) -> &BTreeMap<i32, PathBuf> {
        match kind {
            ContentKind::Common => &self.common_dirs,
            ContentKind::Fix => &self.fix_dirs,
        }
    }

    /// Record a directory for `(kind, version)`.
    ///
    /// Returns the already-registered path when the slot is taken.
    pub fn add_directory(
        &mut self,
        kind: ContentKind,
        version: i32,
        path: impl Into<PathBuf>,
    ) -> Result<(), PathBuf> {
        let dirs = match kind {
            ContentKind::Common => &mut self.common_dirs,
            ContentKind::Fix => &mut self.fix_dirs,
        };

        if let Some(existing) = dirs.get(&version) {
            return Err(existing.clone());
        }
        dirs.insert(version, path.into());
        Ok(())
    }

    /// Highest common version. `-1` is only returned when it is the sole entry.
    pub fn latest_common_version(&self) -> Option<i32> {
        self.common_dirs.keys().next_back().copied()
    }

    /// Directory holding the latest common version.
    pub fn latest_common_dir(&self) -> Option<&Path> {
        self.common_dirs.values().next_back().map(PathBuf::as_path)
    }

    pub fn has_common_content(&self) -> bool {
        !self.common_dirs.is_empty()
    }
}

/// An installable product made of depots.
#[derive(Debug, Clone)]
pub struct Application {
    id: u32,
    name: String,
    install_dir: String,
    install_script: Option<String>,
    depots: Vec<Depot>,
    shared_files: Vec<SharedFile>,
    check_rule: CheckRule,
    check_state: CheckState,
    custom: Option<serde_json::Value>,
}

impl Application {
    /// Create an application.
    ///
    /// `install_dir_name` is the folder name under `common/`.
    pub fn new(
        id: u32,
        name: impl Into<String>,
        install_dir_name: impl AsRef<str>,
        install_script: Option<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            install_dir: format!("common/{}", install_dir_name.as_ref()),
            install_script,
            depots: Vec::new(),
            shared_files: Vec::new(),
            check_rule: CheckRule::Default,
            check_state: CheckState::NotChecked,
            custom: None,
        }
    }

    /// Add a depot, keeping declaration order.
    pub fn with_depot(mut self, depot: Depot) -> Self {
        self.depots.push(depot);
        self
    }

    /// Declare a shared file.
    pub fn with_shared_file(mut self, shared: SharedFile) -> Self {
        self.shared_files.push(shared);
        self
    }

    pub fn with_check_rule(mut self, rule: CheckRule) -> Self {
        self.check_rule = rule;
        self
    }

    pub fn with_custom(mut self, custom: serde_json::Value) -> Self {
        self.custom = Some(custom);
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Install directory relative to the destination, e.g. `common/Skyrim`.
    pub fn install_dir(&self) -> &str {
        &self.install_dir
    }

    pub fn install_script(&self) -> Option<&str> {
        self.install_script.as_deref()
    }

    pub fn depots(&self) -> &[Depot] {
        &self.depots
    }

    pub fn depots_mut(&mut self) -> &mut [Depot] {
        &mut self.depots
    }

    pub fn depot(&self, id: u32) -> Option<&Depot> {
        self.depots.iter().find(|d| d.id == id)
    }

    pub fn depot_mut(&mut self, id: u32) -> Option<&mut Depot> {
        self.depots.iter_mut().find(|d| d.id == id)
    }

    /// Find a depot by its directory base name (case-insensitive).
    pub fn depot_by_base_name(&self, base_name: &str) -> Option<&Depot> {
        self.depots
            .iter()
            .find(|d| d.base_name.eq_ignore_ascii_case(base_name))
    }

    pub fn shared_files(&self) -> &[SharedFile] {
        &self.shared_files
    }

    /// Shared files `depot_id` takes part in, as source or client.
    pub fn shared_files_of(&self, depot_id: u32) -> impl Iterator<Item = &SharedFile> {
        self.shared_files
            .iter()
            .filter(move |shared| shared.involves(depot_id))
    }

    pub fn check_rule(&self) -> &CheckRule {
        &self.check_rule
    }

    pub fn check_state(&self) -> CheckState {
        self.check_state
    }

    pub(crate) fn set_check_state(&mut self, state: CheckState) {
        self.check_state = state;
    }

    pub fn custom(&self) -> Option<&serde_json::Value> {
        self.custom.as_ref()
    }

    /// Languages offered by installable language depots, in catalog order.
    pub fn installable_languages(&self) -> Vec<Culture> {
        let mut languages: Vec<Culture> = Vec::new();
        for depot in &self.depots {
            if !depot.check_state.is_installable() || depot.is_invariant() {
                continue;
            }
            for culture in &depot.cultures {
                if !languages.contains(culture) {
                    languages.push(*culture);
                }
            }
        }
        languages
    }
}

/// Normalize a relative path to `/` separators without leading separator.
pub fn normalize_relative(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn english() -> Culture {
        Culture::find("en").unwrap()
    }

    #[test]
    fn test_depot_without_cultures_is_invariant() {
        let depot = Depot::new(1, "Content", "Content", false, Vec::new());
        assert!(depot.is_invariant());
        assert_eq!(depot.cultures().len(), 1);
    }

    #[test]
    fn test_latest_common_version_prefers_versioned() {
        let mut depot = Depot::new(1, "Content", "Content", false, vec![english()]);
        depot.add_directory(ContentKind::Common, -1, "/d/Content").unwrap();
        depot.add_directory(ContentKind::Common, 2, "/d/Content.2").unwrap();
        depot.add_directory(ContentKind::Common, 1, "/d/Content.v1").unwrap();

        assert_eq!(depot.latest_common_version(), Some(2));
        assert_eq!(depot.latest_common_dir(), Some(Path::new("/d/Content.2")));
    }

    #[test]
    fn test_unversioned_used_when_alone() {
        let mut depot = Depot::new(1, "Content", "Content", false, vec![english()]);
        depot.add_directory(ContentKind::Common, -1, "/d/Content").unwrap();
        assert_eq!(depot.latest_common_version(), Some(-1));
    }

    #[test]
    fn test_add_directory_collision_returns_existing() {
        let mut depot = Depot::new(1, "Content", "Content", false, vec![english()]);
        depot.add_directory(ContentKind::Fix, 3, "/a/Content.3").unwrap();
        let err = depot
            .add_directory(ContentKind::Fix, 3, "/b/Content.v3")
            .unwrap_err();
        assert_eq!(err, PathBuf::from("/a/Content.3"));
        // Same version of another kind is fine
        depot
            .add_directory(ContentKind::Common, 3, "/b/Content.v3")
            .unwrap();
    }

    #[test]
    fn test_inclusion_filter() {
        let french = Culture::find("fr").unwrap();
        let required = Depot::new(1, "Main", "Main", false, vec![english()]);
        let optional = Depot::new(2, "English", "English", true, vec![english()]);
        let invariant = Depot::new(3, "DLC", "DLC", true, vec![Culture::INVARIANT]);

        assert!(required.is_included_for(&french));
        assert!(!optional.is_included_for(&french));
        assert!(optional.is_included_for(&english()));
        assert!(invariant.is_included_for(&french));
    }

    #[test]
    fn test_application_install_dir() {
        let app = Application::new(10, "Game", "Game Dir", Some("installscript.vdf".into()));
        assert_eq!(app.install_dir(), "common/Game Dir");
        assert_eq!(app.install_script(), Some("installscript.vdf"));
    }

    #[test]
    fn test_shared_file_normalizes_separators() {
        let shared = SharedFile::new(r"\common\game\a.bik", 1, vec![2]);
        assert_eq!(shared.relative_path(), "common/game/a.bik");
        assert!(shared.involves(1));
        assert!(shared.involves(2));
        assert!(!shared.involves(3));
    }

    #[test]
    fn test_installable_languages_skip_invariant_and_failed() {
        let french = Culture::find("fr").unwrap();
        let mut app = Application::new(1, "Game", "Game", None)
            .with_depot(Depot::new(1, "Main", "Main", false, vec![Culture::INVARIANT]))
            .with_depot(Depot::new(2, "En", "En", true, vec![english()]))
            .with_depot(Depot::new(3, "Fr", "Fr", true, vec![french]));
        app.depot_mut(1).unwrap().set_check_state(CheckState::Installable);
        app.depot_mut(2).unwrap().set_check_state(CheckState::Installable);
        app.depot_mut(3).unwrap().set_check_state(CheckState::NotInstallable);

        assert_eq!(app.installable_languages(), vec![english()]);
    }
}
