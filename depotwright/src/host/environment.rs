//! Well-known folders of the machine the installer runs on.

use std::collections::HashMap;
use std::path::PathBuf;

/// Folders an install script can refer to through placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialFolder {
    /// Documents shared by all users (`%ALLUSERSPROFILE%`).
    CommonDocuments,
    /// Operating system directory (`%WINDIR%`, `%SYSTEMROOT%`).
    Windows,
    /// Temporary directory, with a trailing separator (`%TEMP%`).
    Temp,
    /// Home directory of the current user (`%USERPROFILE%`).
    UserProfile,
    /// Documents of the current user (`%USER_MYDOCS%`).
    MyDocuments,
}

impl SpecialFolder {
    pub fn all() -> &'static [SpecialFolder] {
        &[
            Self::CommonDocuments,
            Self::Windows,
            Self::Temp,
            Self::UserProfile,
            Self::MyDocuments,
        ]
    }
}

/// Source of special folder locations.
pub trait HostEnvironment: Send + Sync {
    /// Location of `folder`, or `None` when the host has no such folder.
    fn special_folder(&self, folder: SpecialFolder) -> Option<PathBuf>;
}

/// Folders of the running system, looked up through `dirs` and the
/// environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl HostEnvironment for SystemEnvironment {
    fn special_folder(&self, folder: SpecialFolder) -> Option<PathBuf> {
        match folder {
            SpecialFolder::CommonDocuments => std::env::var_os("PUBLIC")
                .map(|public| PathBuf::from(public).join("Documents"))
                .or_else(|| std::env::var_os("ALLUSERSPROFILE").map(PathBuf::from)),
            SpecialFolder::Windows => std::env::var_os("SystemRoot")
                .or_else(|| std::env::var_os("WINDIR"))
                .map(PathBuf::from),
            // join("") appends the trailing separator
            SpecialFolder::Temp => Some(std::env::temp_dir().join("")),
            SpecialFolder::UserProfile => dirs::home_dir(),
            SpecialFolder::MyDocuments => dirs::document_dir(),
        }
    }
}

/// Fixed folder table, for tests and sandboxed installs.
#[derive(Debug, Clone, Default)]
pub struct FixedEnvironment {
    folders: HashMap<SpecialFolder, PathBuf>,
}

impl FixedEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_folder(mut self, folder: SpecialFolder, path: impl Into<PathBuf>) -> Self {
        self.folders.insert(folder, path.into());
        self
    }
}

impl HostEnvironment for FixedEnvironment {
    fn special_folder(&self, folder: SpecialFolder) -> Option<PathBuf> {
        self.folders.get(&folder).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_environment_lookup() {
        let env = FixedEnvironment::new().with_folder(SpecialFolder::Temp, "/scratch/");

        assert_eq!(
            env.special_folder(SpecialFolder::Temp),
            Some(PathBuf::from("/scratch/"))
        );
        assert_eq!(env.special_folder(SpecialFolder::Windows), None);
    }

    #[test]
    fn test_system_temp_has_trailing_separator() {
        let temp = SystemEnvironment
            .special_folder(SpecialFolder::Temp)
            .unwrap();
        let text = temp.to_string_lossy();
        assert!(text.ends_with(std::path::MAIN_SEPARATOR));
    }

    #[test]
    fn test_all_lists_every_folder() {
        assert_eq!(SpecialFolder::all().len(), 5);
    }
}
