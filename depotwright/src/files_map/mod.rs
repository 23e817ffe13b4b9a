//! File resolution across depots.
//!
//! The [`FilesMap`] answers "which physical file should be installed at this
//! relative path" for a language and a set of [`FileTypes`]. Building it walks
//! every installable depot directory, so maps are memoized per application in
//! a [`FilesMapCache`].

mod duplicates;
mod map;
mod types;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::catalog::Application;

pub use duplicates::hash_file;
pub use map::FilesMap;
pub use types::{FileKind, FileTypes, ResolvedFile};

/// Errors that can occur while building or querying a files map.
#[derive(Debug, Error)]
pub enum FilesMapError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Memoized files maps, one per application id.
#[derive(Debug, Default)]
pub struct FilesMapCache {
    maps: HashMap<u32, Arc<FilesMap>>,
}

impl FilesMapCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The map of `app`, built on first use.
    pub fn get_or_build(&mut self, app: &Application) -> Result<Arc<FilesMap>, FilesMapError> {
        if let Some(map) = self.maps.get(&app.id()) {
            return Ok(Arc::clone(map));
        }

        let map = Arc::new(FilesMap::build(app)?);
        self.maps.insert(app.id(), Arc::clone(&map));
        Ok(map)
    }

    pub fn get(&self, application_id: u32) -> Option<Arc<FilesMap>> {
        self.maps.get(&application_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CheckState, ContentKind, Culture, Depot};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cache_builds_once() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("Main");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("a"), "a").unwrap();

        let mut app = Application::new(5, "Game", "Game", None).with_depot(Depot::new(
            6,
            "Main",
            "Main",
            false,
            vec![Culture::find("en").unwrap()],
        ));
        app.depot_mut(6)
            .unwrap()
            .add_directory(ContentKind::Common, -1, &dir)
            .unwrap();
        app.depot_mut(6).unwrap().set_check_state(CheckState::Installable);

        let mut cache = FilesMapCache::new();
        let first = cache.get_or_build(&app).unwrap();

        // Files added later do not show up in the memoized map
        fs::write(dir.join("b"), "b").unwrap();
        let second = cache.get_or_build(&app).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(5).is_some());
    }
}
