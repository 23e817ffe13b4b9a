//! File kinds and resolved file records.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::path::PathBuf;

/// Set of file kinds requested from a [`FilesMap`](super::FilesMap) query.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FileTypes(u8);

impl FileTypes {
    pub const NONE: FileTypes = FileTypes(0);
    pub const COMMON: FileTypes = FileTypes(0x1);
    pub const FIX: FileTypes = FileTypes(0x2);
    pub const UPDATE: FileTypes = FileTypes(0x4);
    pub const ANY: FileTypes = FileTypes(0x7);

    /// Raw bit representation.
    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Whether every kind in `other` is part of this set.
    pub fn contains(&self, other: FileTypes) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether this set and `other` share a kind.
    pub fn intersects(&self, other: FileTypes) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for FileTypes {
    type Output = FileTypes;

    fn bitor(self, rhs: Self) -> Self::Output {
        FileTypes(self.0 | rhs.0)
    }
}

impl BitOrAssign for FileTypes {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for FileTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "FileTypes(NONE)");
        }
        let names: Vec<&str> = [
            (FileTypes::COMMON, "COMMON"),
            (FileTypes::FIX, "FIX"),
            (FileTypes::UPDATE, "UPDATE"),
        ]
        .iter()
        .filter(|(bit, _)| self.contains(*bit))
        .map(|(_, name)| *name)
        .collect();
        write!(f, "FileTypes({})", names.join(" | "))
    }
}

/// Kind of a single resolved file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Regular depot content.
    Common,
    /// Overlay replacing a file of the same version.
    Fix,
    /// Incremental update content.
    Update,
}

impl FileKind {
    /// The single-kind [`FileTypes`] set for this kind.
    pub fn as_types(&self) -> FileTypes {
        match self {
            Self::Common => FileTypes::COMMON,
            Self::Fix => FileTypes::FIX,
            Self::Update => FileTypes::UPDATE,
        }
    }

    pub fn is_fix(&self) -> bool {
        matches!(self, Self::Fix)
    }
}

/// A physical file chosen to represent a relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Path below the destination, `/`-separated.
    pub relative_path: String,
    /// Full path of the file inside its depot directory.
    pub source_path: PathBuf,
    /// Depot that contributes the file.
    pub depot_id: u32,
    pub kind: FileKind,
    /// Version of the directory the file came from, `-1` if unversioned.
    pub version: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_operations() {
        let both = FileTypes::COMMON | FileTypes::FIX;
        assert!(both.contains(FileTypes::COMMON));
        assert!(both.contains(FileTypes::FIX));
        assert!(!both.contains(FileTypes::UPDATE));
        assert!(both.intersects(FileTypes::FIX | FileTypes::UPDATE));
        assert!(!FileTypes::NONE.intersects(FileTypes::ANY));
        assert!(FileTypes::ANY.contains(both));
        assert_eq!(both.bits(), 3);
    }

    #[test]
    fn test_bitor_assign() {
        let mut types = FileTypes::NONE;
        types |= FileTypes::FIX;
        assert_eq!(types, FileTypes::FIX);
    }

    #[test]
    fn test_debug_names() {
        assert_eq!(format!("{:?}", FileTypes::COMMON | FileTypes::FIX), "FileTypes(COMMON | FIX)");
        assert_eq!(format!("{:?}", FileTypes::NONE), "FileTypes(NONE)");
    }

    #[test]
    fn test_kind_as_types() {
        assert_eq!(FileKind::Fix.as_types(), FileTypes::FIX);
        assert!(FileKind::Fix.is_fix());
        assert!(!FileKind::Common.is_fix());
    }
}
