//! Shared setup for commands: configuration, logging, catalog and host.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use depotwright::catalog::Catalog;
use depotwright::config::{config_file_path, ConfigFile};
use depotwright::depot::{DepotChecker, DepotProber};
use depotwright::host::Host;
use depotwright::logging::{init_logging, WorkerGuard};

use crate::commands::common::DepotArgs;
use crate::error::CliError;

/// Loaded configuration plus the logging guard, kept for the whole run.
pub struct CliRunner {
    config: ConfigFile,
    config_path: PathBuf,
    _log_guard: Option<WorkerGuard>,
}

impl CliRunner {
    /// Loads the config (the default file unless `config_path` is given) and
    /// installs logging.
    pub fn new(config_path: Option<&Path>, verbosity: u8) -> Result<Self, CliError> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&config_path)?;
        let log_guard = init_logging(&config.logging, verbosity)?;

        Ok(Self {
            config,
            config_path,
            _log_guard: log_guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            command,
            config = %self.config_path.display(),
            "depotwright starting"
        );
    }

    /// Catalog with depot directories probed and installability checked.
    ///
    /// Command-line depot options take precedence over the config file.
    pub fn load_catalog(&self, args: &DepotArgs) -> Result<Catalog, CliError> {
        let depots = &self.config.depots;

        let catalog_file = args.catalog.as_ref().or(depots.catalog.as_ref());
        let mut catalog = match catalog_file {
            Some(path) => {
                debug!(path = %path.display(), "Loading catalog file");
                Catalog::from_json_file(path)?
            }
            None => Catalog::builtin(),
        };

        let roots = if args.depots.is_empty() {
            depots.roots.clone()
        } else {
            args.depots.clone()
        };
        if roots.is_empty() {
            return Err(CliError::NoDepotRoots(self.config_path.clone()));
        }

        let prober = DepotProber::new()
            .with_fixes_dir(args.fixes_dir.clone().unwrap_or_else(|| depots.fixes_dir.clone()))
            .with_max_depth(args.probe_depth.unwrap_or(depots.probe_depth));
        prober.probe_catalog(&mut catalog, &roots)?;
        DepotChecker::new().check_catalog(&mut catalog)?;

        Ok(catalog)
    }

    /// Host collaborators backed by the configured registry file.
    pub fn host(&self) -> Result<Host, CliError> {
        Ok(Host::system(&self.config.host.registry_file)?)
    }
}
