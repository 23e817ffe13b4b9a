//! Error types for the install service.

use crate::files_map::FilesMapError;
use crate::script::ScriptError;

use super::CopyError;

/// Result type for install operations.
pub type InstallResult<T> = Result<T, InstallError>;

/// Errors that can occur while planning or running an install.
#[derive(Debug)]
pub enum InstallError {
    /// Install options are incomplete or invalid.
    InvalidOptions(String),

    /// No application with that name or id in the catalog.
    UnknownApplication(String),

    /// The application exists but its depots did not pass the check.
    NotInstallable(String),

    /// Enumerating depot files failed.
    FilesMap(FilesMapError),

    /// Copying a file failed.
    Copy(CopyError),

    /// The install script could not be parsed or failed.
    Script(ScriptError),

    /// The worker thread is gone.
    WorkerStopped,
}

impl std::fmt::Display for InstallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidOptions(msg) => write!(f, "invalid install options: {}", msg),
            Self::UnknownApplication(name) => write!(f, "unknown application: {}", name),
            Self::NotInstallable(name) => {
                write!(f, "application {} has no installable content", name)
            }
            Self::FilesMap(e) => write!(f, "failed to enumerate depot files: {}", e),
            Self::Copy(e) => write!(f, "{}", e),
            Self::Script(e) => write!(f, "install script failed: {}", e),
            Self::WorkerStopped => write!(f, "install worker is not running"),
        }
    }
}

impl std::error::Error for InstallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FilesMap(e) => Some(e),
            Self::Copy(e) => Some(e),
            Self::Script(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FilesMapError> for InstallError {
    fn from(e: FilesMapError) -> Self {
        Self::FilesMap(e)
    }
}

impl From<CopyError> for InstallError {
    fn from(e: CopyError) -> Self {
        Self::Copy(e)
    }
}

impl From<ScriptError> for InstallError {
    fn from(e: ScriptError) -> Self {
        Self::Script(e)
    }
}
