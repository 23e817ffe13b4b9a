//! Collaborators of the machine the installer runs on.
//!
//! Install scripts touch three host facilities: special folders for
//! placeholder substitution, the registry, and process launching. Each one is
//! a trait so the install pipeline can run against in-memory doubles.

mod environment;
mod process;
mod registry;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

pub use environment::{FixedEnvironment, HostEnvironment, SpecialFolder, SystemEnvironment};
pub use process::{ProcessHandle, ProcessLauncher, SystemProcessLauncher};
pub use registry::{
    FileRegistry, Hive, MemoryRegistry, Registry, RegistryKey, RegistryValue, RegistryView,
};

/// Errors raised by host collaborators.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("unknown registry hive in key {0}")]
    UnknownHive(String),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start {image}: {source}")]
    Spawn {
        image: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid registry file {path}: {message}")]
    Storage { path: PathBuf, message: String },
}

/// The set of host collaborators handed to the install service.
#[derive(Clone)]
pub struct Host {
    pub registry: Arc<dyn Registry>,
    pub processes: Arc<dyn ProcessLauncher>,
    pub environment: Arc<dyn HostEnvironment>,
}

impl Host {
    pub fn new(
        registry: Arc<dyn Registry>,
        processes: Arc<dyn ProcessLauncher>,
        environment: Arc<dyn HostEnvironment>,
    ) -> Self {
        Self {
            registry,
            processes,
            environment,
        }
    }

    /// Real processes and folders, with the registry persisted at
    /// `registry_file`.
    pub fn system(registry_file: impl Into<PathBuf>) -> Result<Self, HostError> {
        Ok(Self::new(
            Arc::new(FileRegistry::open(registry_file)?),
            Arc::new(SystemProcessLauncher),
            Arc::new(SystemEnvironment),
        ))
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host").finish_non_exhaustive()
    }
}
