//! Catalog of installable applications.
//!
//! The catalog is the static description of what can be installed: each
//! [`Application`] lists its [`Depot`]s (base content, language packs, DLC)
//! and the [`SharedFile`]s one depot borrows from another. Probing and the
//! installability check fill in the mutable parts (directories and
//! [`CheckState`]) once at startup; afterwards the catalog is read-only and is
//! shared behind an `Arc`.

mod builtin;
mod culture;
mod file;
mod model;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use culture::Culture;
pub use file::{ApplicationEntry, CatalogFile, CheckRuleEntry, DepotEntry, SharedFileEntry};
pub use model::{
    normalize_relative, Application, CheckRule, CheckState, ContentKind, Depot, SharedFile,
};

/// Errors that can occur while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The catalog file is not valid JSON for a catalog.
    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Two applications share an id.
    #[error("application id {0} is declared twice")]
    DuplicateApplication(u32),

    /// Two depots of one application share an id.
    #[error("application {application} declares depot {depot} twice")]
    DuplicateDepot { application: u32, depot: u32 },

    /// A shared file or check rule names a depot the application lacks.
    #[error("application {application} refers to unknown depot {depot}")]
    UnknownDepot { application: u32, depot: u32 },
}

/// All applications known to the installer.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    applications: Vec<Application>,
}

impl Catalog {
    /// Create a catalog from applications.
    pub fn new(applications: Vec<Application>) -> Self {
        Self { applications }
    }

    /// The built-in application table.
    pub fn builtin() -> Self {
        Self::new(builtin::applications())
    }

    /// Load a catalog from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: CatalogFile =
            serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self::new(file.into_applications()?))
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    pub fn applications_mut(&mut self) -> &mut [Application] {
        &mut self.applications
    }

    /// Find an application by display name (case-insensitive).
    pub fn find(&self, name: &str) -> Option<&Application> {
        self.applications
            .iter()
            .find(|app| app.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn find_by_id(&self, id: u32) -> Option<&Application> {
        self.applications.iter().find(|app| app.id() == id)
    }

    /// Find an application by name or by numeric id.
    pub fn lookup(&self, name_or_id: &str) -> Option<&Application> {
        self.find(name_or_id).or_else(|| {
            name_or_id
                .trim()
                .parse::<u32>()
                .ok()
                .and_then(|id| self.find_by_id(id))
        })
    }

    /// Applications whose depots passed the installability check.
    pub fn installable_applications(&self) -> impl Iterator<Item = &Application> {
        self.applications
            .iter()
            .filter(|app| app.check_state().is_installable())
    }

    /// Languages that can be installed for `name`, as `English (Native)` labels.
    ///
    /// Empty when the application is unknown or nothing is installable.
    pub fn installable_languages(&self, name: &str) -> Vec<String> {
        self.find(name)
            .map(|app| {
                app.installable_languages()
                    .iter()
                    .map(Culture::display_name)
                    .collect()
            })
            .unwrap_or_default()
    }
}
