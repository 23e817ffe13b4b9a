//! File and folder copying with cancellation.
//!
//! Two modes exist for a destination file that is already present:
//! [`ExistingFilePolicy::Replace`] overwrites it, [`ExistingFilePolicy::Backup`]
//! first renames it to `<name>.original`. Fixes are installed with backups so
//! the replaced file can be restored by hand.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use filetime::FileTime;
use thiserror::Error;
use tracing::{debug, warn};

use super::CancelFlag;

/// Size of the blocks files are copied in.
pub const COPY_BUFFER_SIZE: usize = 1024 * 1024;

/// Suffix appended to backed up destination files.
pub const BACKUP_SUFFIX: &str = ".original";

/// What to do with a destination file that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingFilePolicy {
    /// Clear the read-only flag and overwrite.
    Replace,
    /// Rename to `<name>.original`, replacing an older backup, then write.
    Backup,
}

/// Errors raised while copying.
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("failed to copy to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> CopyError + '_ {
    move |source| CopyError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Result of a single file copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    Completed,
    /// Stopped on a cancellation request; the destination is left as it was.
    Cancelled,
}

/// Totals of a folder copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectoryCopy {
    pub files: usize,
    pub bytes: u64,
    pub cancelled: bool,
}

/// Path of the backup made for `destination`.
pub fn backup_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(BACKUP_SUFFIX);
    destination.with_file_name(name)
}

fn clear_readonly(path: &Path) -> io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    if permissions.readonly() {
        permissions.set_readonly(false);
        fs::set_permissions(path, permissions)?;
    }
    Ok(())
}

/// Copies one file in blocks of [`COPY_BUFFER_SIZE`].
///
/// `on_bytes` is called after every block with the number of bytes written.
/// Cancellation is checked before the copy starts and after every block. A
/// cancelled copy removes the partial file and restores the backup it made.
/// Timestamps and permissions are taken from the source.
pub fn copy_file(
    source: &Path,
    destination: &Path,
    policy: ExistingFilePolicy,
    cancel: &CancelFlag,
    on_bytes: &mut dyn FnMut(u64),
) -> Result<CopyStatus, CopyError> {
    if cancel.is_requested() {
        return Ok(CopyStatus::Cancelled);
    }

    let metadata = fs::metadata(source).map_err(io_error(source))?;
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }

    let mut backup = None;
    if destination.exists() {
        clear_readonly(destination).map_err(io_error(destination))?;
        if policy == ExistingFilePolicy::Backup {
            let backup_file = backup_path(destination);
            if backup_file.exists() {
                clear_readonly(&backup_file).map_err(io_error(&backup_file))?;
                fs::remove_file(&backup_file).map_err(io_error(&backup_file))?;
            }
            fs::rename(destination, &backup_file).map_err(io_error(destination))?;
            debug!(backup = %backup_file.display(), "Backed up existing file");
            backup = Some(backup_file);
        }
    }

    let mut reader = File::open(source).map_err(io_error(source))?;
    let mut writer = File::create(destination).map_err(io_error(destination))?;
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE.min(metadata.len().max(1) as usize)];
    let mut written = 0u64;

    loop {
        let read = reader.read(&mut buffer).map_err(io_error(source))?;
        if read == 0 {
            break;
        }
        writer
            .write_all(&buffer[..read])
            .map_err(io_error(destination))?;
        written += read as u64;
        on_bytes(read as u64);

        if written < metadata.len() && cancel.is_requested() {
            drop(writer);
            discard_partial(destination, backup.as_deref())?;
            return Ok(CopyStatus::Cancelled);
        }
    }
    writer.flush().map_err(io_error(destination))?;
    drop(writer);

    let accessed = FileTime::from_last_access_time(&metadata);
    let modified = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_times(destination, accessed, modified).map_err(io_error(destination))?;
    fs::set_permissions(destination, metadata.permissions()).map_err(io_error(destination))?;

    Ok(CopyStatus::Completed)
}

fn discard_partial(destination: &Path, backup: Option<&Path>) -> Result<(), CopyError> {
    warn!(path = %destination.display(), "Removing partially copied file");
    fs::remove_file(destination).map_err(io_error(destination))?;
    if let Some(backup) = backup {
        fs::rename(backup, destination).map_err(io_error(backup))?;
    }
    Ok(())
}

/// Copies the tree under `source` into `destination`, level by level.
///
/// Cancellation is checked before each directory and before each file.
/// Empty directories are recreated.
pub fn copy_directory(
    source: &Path,
    destination: &Path,
    policy: ExistingFilePolicy,
    cancel: &CancelFlag,
) -> Result<DirectoryCopy, CopyError> {
    let mut totals = DirectoryCopy::default();
    let mut queue = VecDeque::new();
    queue.push_back((source.to_path_buf(), destination.to_path_buf()));

    while let Some((from, to)) = queue.pop_front() {
        if cancel.is_requested() {
            totals.cancelled = true;
            break;
        }

        fs::create_dir_all(&to).map_err(io_error(&to))?;
        let mut entries = fs::read_dir(&from)
            .and_then(|entries| entries.collect::<Result<Vec<_>, _>>())
            .map_err(io_error(&from))?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let target = to.join(entry.file_name());
            if entry.file_type().map_err(io_error(&path))?.is_dir() {
                queue.push_back((path, target));
                continue;
            }

            let mut bytes = 0;
            let status = copy_file(&path, &target, policy, cancel, &mut |n| bytes += n)?;
            match status {
                CopyStatus::Completed => {
                    totals.files += 1;
                    totals.bytes += bytes;
                }
                CopyStatus::Cancelled => {
                    totals.cancelled = true;
                    return Ok(totals);
                }
            }
        }
    }

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn copy(source: &Path, destination: &Path, policy: ExistingFilePolicy) -> CopyStatus {
        copy_file(source, destination, policy, &CancelFlag::new(), &mut |_| {}).unwrap()
    }

    #[test]
    fn test_copy_creates_parents_and_keeps_mtime() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.txt");
        fs::write(&source, "content").unwrap();
        let past = FileTime::from_unix_time(1_000_000_000, 0);
        filetime::set_file_mtime(&source, past).unwrap();

        let destination = temp.path().join("out/deep/a.txt");
        assert_eq!(copy(&source, &destination, ExistingFilePolicy::Replace), CopyStatus::Completed);

        assert_eq!(fs::read_to_string(&destination).unwrap(), "content");
        let metadata = fs::metadata(&destination).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&metadata), past);
    }

    #[test]
    fn test_replace_overwrites_readonly() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("new");
        let destination = temp.path().join("old");
        fs::write(&source, "new").unwrap();
        fs::write(&destination, "old content").unwrap();
        let mut permissions = fs::metadata(&destination).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&destination, permissions).unwrap();

        copy(&source, &destination, ExistingFilePolicy::Replace);
        assert_eq!(fs::read_to_string(&destination).unwrap(), "new");
        assert!(!backup_path(&destination).exists());
    }

    #[test]
    fn test_backup_keeps_original() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("fix.dll");
        let destination = temp.path().join("game.dll");
        fs::write(&source, "fixed").unwrap();
        fs::write(&destination, "base").unwrap();
        fs::write(backup_path(&destination), "stale").unwrap();

        copy(&source, &destination, ExistingFilePolicy::Backup);

        assert_eq!(fs::read_to_string(&destination).unwrap(), "fixed");
        assert_eq!(
            fs::read_to_string(temp.path().join("game.dll.original")).unwrap(),
            "base"
        );
    }

    #[test]
    fn test_progress_reports_bytes() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("big");
        fs::write(&source, vec![7u8; COPY_BUFFER_SIZE + 10]).unwrap();

        let mut reported = Vec::new();
        copy_file(
            &source,
            &temp.path().join("copy"),
            ExistingFilePolicy::Replace,
            &CancelFlag::new(),
            &mut |n| reported.push(n),
        )
        .unwrap();

        assert_eq!(reported.iter().sum::<u64>(), (COPY_BUFFER_SIZE + 10) as u64);
        assert!(reported.len() >= 2);
    }

    #[test]
    fn test_cancel_mid_file_restores_backup() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("big");
        let destination = temp.path().join("target");
        fs::write(&source, vec![1u8; COPY_BUFFER_SIZE * 2]).unwrap();
        fs::write(&destination, "previous").unwrap();

        let cancel = CancelFlag::new();
        let trigger = cancel.clone();
        let status = copy_file(
            &source,
            &destination,
            ExistingFilePolicy::Backup,
            &cancel,
            &mut |_| trigger.request(),
        )
        .unwrap();

        assert_eq!(status, CopyStatus::Cancelled);
        assert_eq!(fs::read_to_string(&destination).unwrap(), "previous");
        assert!(!backup_path(&destination).exists());
    }

    #[test]
    fn test_cancel_before_start() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a");
        fs::write(&source, "a").unwrap();
        let cancel = CancelFlag::new();
        cancel.request();

        let status = copy_file(
            &source,
            &temp.path().join("b"),
            ExistingFilePolicy::Replace,
            &cancel,
            &mut |_| {},
        )
        .unwrap();
        assert_eq!(status, CopyStatus::Cancelled);
        assert!(!temp.path().join("b").exists());
    }

    #[test]
    fn test_copy_directory_tree() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("src");
        fs::create_dir_all(source.join("a/b")).unwrap();
        fs::create_dir_all(source.join("empty")).unwrap();
        fs::write(source.join("root.txt"), "r").unwrap();
        fs::write(source.join("a/b/leaf.txt"), "leaf").unwrap();

        let destination = temp.path().join("dst");
        let totals = copy_directory(
            &source,
            &destination,
            ExistingFilePolicy::Replace,
            &CancelFlag::new(),
        )
        .unwrap();

        assert_eq!(totals.files, 2);
        assert_eq!(totals.bytes, 5);
        assert!(!totals.cancelled);
        assert!(destination.join("empty").is_dir());
        assert_eq!(fs::read_to_string(destination.join("a/b/leaf.txt")).unwrap(), "leaf");
    }

    #[test]
    fn test_copy_directory_cancelled() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("src");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("a"), "a").unwrap();
        let cancel = CancelFlag::new();
        cancel.request();

        let totals =
            copy_directory(&source, &temp.path().join("dst"), ExistingFilePolicy::Replace, &cancel)
                .unwrap();
        assert!(totals.cancelled);
        assert_eq!(totals.files, 0);
    }
}
