//! Breadth-first directory listing.

use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A file found under a depot directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFile {
    /// Path relative to the listed root, `/`-separated.
    pub relative_path: String,
    /// Full path on disk.
    pub path: PathBuf,
}

/// Sorted subdirectories of `dir`.
pub fn subdirectories(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// List every file under `root`, level by level.
///
/// Files of a directory come before the contents of its subdirectories, and
/// entries are sorted by name within a directory so the order is stable.
pub fn list_files(root: &Path) -> io::Result<Vec<ListedFile>> {
    let mut files = Vec::new();
    let mut queue = VecDeque::new();
    queue.push_back(root.to_path_buf());

    while let Some(dir) = queue.pop_front() {
        let mut entries = fs::read_dir(&dir)?.collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                queue.push_back(path);
            } else {
                files.push(ListedFile {
                    relative_path: relative_to(root, &path),
                    path,
                });
            }
        }
    }

    Ok(files)
}

/// `path` relative to `root`, `/`-separated, without leading separator.
pub fn relative_to(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_files_breadth_first() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("b/deep")).unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("z.txt"), "z").unwrap();
        fs::write(root.join("a/one.txt"), "1").unwrap();
        fs::write(root.join("b/deep/two.txt"), "2").unwrap();

        let files: Vec<String> = list_files(root)
            .unwrap()
            .into_iter()
            .map(|f| f.relative_path)
            .collect();

        assert_eq!(files, vec!["z.txt", "a/one.txt", "b/deep/two.txt"]);
    }

    #[test]
    fn test_subdirectories_sorted() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("beta")).unwrap();
        fs::create_dir(temp.path().join("alpha")).unwrap();
        fs::write(temp.path().join("file"), "").unwrap();

        let dirs = subdirectories(temp.path()).unwrap();
        assert_eq!(dirs, vec![temp.path().join("alpha"), temp.path().join("beta")]);
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(
            relative_to(Path::new("/depots/A.1"), Path::new("/depots/A.1/common/a/b.txt")),
            "common/a/b.txt"
        );
    }
}
