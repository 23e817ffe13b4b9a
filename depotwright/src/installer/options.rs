//! Options of one install run.

use std::path::{Path, PathBuf};

use crate::catalog::Culture;
use crate::files_map::FileTypes;

use super::InstallError;

/// What to install, where and in which language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOptions {
    application: String,
    destination: PathBuf,
    culture: Culture,
    run_script: bool,
    install_common: bool,
    install_fixes: bool,
}

impl InstallOptions {
    /// Validates the required options.
    ///
    /// `culture` is a culture code, English name or display name as accepted
    /// by [`Culture::find`]. Common files, fixes and the install script are
    /// enabled by default.
    pub fn new(
        application: impl Into<String>,
        destination: impl Into<PathBuf>,
        culture: &str,
    ) -> Result<Self, InstallError> {
        let application = application.into();
        let destination = destination.into();

        if application.trim().is_empty() {
            return Err(InstallError::InvalidOptions(
                "application name is empty".to_string(),
            ));
        }
        if destination.as_os_str().is_empty() {
            return Err(InstallError::InvalidOptions(
                "destination path is empty".to_string(),
            ));
        }
        let culture = Culture::find(culture)
            .ok_or_else(|| InstallError::InvalidOptions(format!("unknown language '{}'", culture)))?;

        Ok(Self {
            application,
            destination,
            culture,
            run_script: true,
            install_common: true,
            install_fixes: true,
        })
    }

    pub fn with_run_script(mut self, enabled: bool) -> Self {
        self.run_script = enabled;
        self
    }

    pub fn with_common(mut self, enabled: bool) -> Self {
        self.install_common = enabled;
        self
    }

    pub fn with_fixes(mut self, enabled: bool) -> Self {
        self.install_fixes = enabled;
        self
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn culture(&self) -> Culture {
        self.culture
    }

    pub fn run_script(&self) -> bool {
        self.run_script
    }

    /// File kinds selected by the toggles.
    pub fn file_types(&self) -> FileTypes {
        let mut types = FileTypes::NONE;
        if self.install_common {
            types |= FileTypes::COMMON;
        }
        if self.install_fixes {
            types |= FileTypes::FIX;
        }
        types
    }
}
