//! CLI error type.

use std::path::PathBuf;

use thiserror::Error;

use depotwright::catalog::CatalogError;
use depotwright::config::ConfigError;
use depotwright::depot::{CheckError, ProbeError};
use depotwright::files_map::FilesMapError;
use depotwright::host::HostError;
use depotwright::installer::InstallError;
use depotwright::logging::LoggingError;
use depotwright::script::ScriptError;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Check(#[from] CheckError),

    #[error(transparent)]
    FilesMap(#[from] FilesMapError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("unknown application '{0}'. Use 'depotwright apps' to see available applications.")]
    UnknownApplication(String),

    #[error("no depot roots configured. Use --depot or set depots.roots in {}", .0.display())]
    NoDepotRoots(PathBuf),

    #[error("no destination given. Use --dest or set install.destination in {}", .0.display())]
    NoDestination(PathBuf),

    #[error("install failed: {0}")]
    InstallFailed(String),

    #[error("install cancelled")]
    Cancelled,

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Cancelled => 130,
            Self::Config(_) | Self::ConfigFile(_) | Self::NoDepotRoots(_) | Self::NoDestination(_) => 2,
            _ => 1,
        }
    }
}
