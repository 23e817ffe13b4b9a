//! Configuration file handling.
//!
//! Settings live in an INI file at `~/.depotwright/config.ini`:
//!
//! ```ini
//! [depots]
//! roots = /mnt/depots, /media/dvd
//! catalog = /home/me/catalog.json
//! fixes_dir = _Fixes
//! probe_depth = 1
//!
//! [install]
//! destination = /games/steamapps
//! language = en
//! run_script = true
//! install_common = true
//! install_fixes = true
//!
//! [host]
//! registry_file = /home/me/.depotwright/registry.ini
//!
//! [logging]
//! level = info
//! file = /home/me/.depotwright/depotwright.log
//! ```
//!
//! Missing files and missing keys fall back to defaults. [`ConfigKey`] names
//! every setting as `section.key` for the `config get|set|list` commands.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;

use crate::catalog::Culture;
use crate::depot::{DEFAULT_FIXES_DIR, DEFAULT_MAX_DEPTH};
use crate::logging::{LoggingSettings, LOG_LEVELS};

const CONFIG_DIR_NAME: &str = ".depotwright";
const CONFIG_FILE_NAME: &str = "config.ini";
const REGISTRY_FILE_NAME: &str = "registry.ini";

/// Errors that can occur while reading or writing the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Directory holding the config file and the registry file.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Default location of the config file.
pub fn config_file_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// `[depots]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepotsSettings {
    /// Directories searched for depot directories.
    pub roots: Vec<PathBuf>,
    /// JSON catalog replacing the built-in one.
    pub catalog: Option<PathBuf>,
    /// Name of the container directory holding fixes.
    pub fixes_dir: String,
    /// How deep below a root depot directories are searched.
    pub probe_depth: usize,
}

impl Default for DepotsSettings {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            catalog: None,
            fixes_dir: DEFAULT_FIXES_DIR.to_string(),
            probe_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// `[install]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallSettings {
    pub destination: Option<PathBuf>,
    /// Culture code or name.
    pub language: Option<String>,
    pub run_script: bool,
    pub install_common: bool,
    pub install_fixes: bool,
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self {
            destination: None,
            language: None,
            run_script: true,
            install_common: true,
            install_fixes: true,
        }
    }
}

/// `[host]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSettings {
    /// File backing the registry used by install scripts.
    pub registry_file: PathBuf,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            registry_file: config_dir().join(REGISTRY_FILE_NAME),
        }
    }
}

/// All settings of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub depots: DepotsSettings,
    pub install: InstallSettings,
    pub host: HostSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Loads the config from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Loads the config at `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if !path.exists() {
            return Ok(config);
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|section| section.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }

        Ok(config)
    }

    /// Saves the config to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Writes every setting to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        ini.write_to_file(path).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// A single setting, addressed as `section.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    DepotsRoots,
    DepotsCatalog,
    DepotsFixesDir,
    DepotsProbeDepth,
    InstallDestination,
    InstallLanguage,
    InstallRunScript,
    InstallCommon,
    InstallFixes,
    HostRegistryFile,
    LoggingLevel,
    LoggingFile,
}

impl ConfigKey {
    /// Every key, in config file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            Self::DepotsRoots,
            Self::DepotsCatalog,
            Self::DepotsFixesDir,
            Self::DepotsProbeDepth,
            Self::InstallDestination,
            Self::InstallLanguage,
            Self::InstallRunScript,
            Self::InstallCommon,
            Self::InstallFixes,
            Self::HostRegistryFile,
            Self::LoggingLevel,
            Self::LoggingFile,
        ]
    }

    pub fn section(&self) -> &'static str {
        match self {
            Self::DepotsRoots | Self::DepotsCatalog | Self::DepotsFixesDir | Self::DepotsProbeDepth => {
                "depots"
            }
            Self::InstallDestination
            | Self::InstallLanguage
            | Self::InstallRunScript
            | Self::InstallCommon
            | Self::InstallFixes => "install",
            Self::HostRegistryFile => "host",
            Self::LoggingLevel | Self::LoggingFile => "logging",
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            Self::DepotsRoots => "roots",
            Self::DepotsCatalog => "catalog",
            Self::DepotsFixesDir => "fixes_dir",
            Self::DepotsProbeDepth => "probe_depth",
            Self::InstallDestination => "destination",
            Self::InstallLanguage => "language",
            Self::InstallRunScript => "run_script",
            Self::InstallCommon => "install_common",
            Self::InstallFixes => "install_fixes",
            Self::HostRegistryFile => "registry_file",
            Self::LoggingLevel => "level",
            Self::LoggingFile => "file",
        }
    }

    /// Full name, `section.key`.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as text; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        fn path_text(path: &Option<PathBuf>) -> String {
            path.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        }

        match self {
            Self::DepotsRoots => config
                .depots
                .roots
                .iter()
                .map(|root| root.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            Self::DepotsCatalog => path_text(&config.depots.catalog),
            Self::DepotsFixesDir => config.depots.fixes_dir.clone(),
            Self::DepotsProbeDepth => config.depots.probe_depth.to_string(),
            Self::InstallDestination => path_text(&config.install.destination),
            Self::InstallLanguage => config.install.language.clone().unwrap_or_default(),
            Self::InstallRunScript => config.install.run_script.to_string(),
            Self::InstallCommon => config.install.install_common.to_string(),
            Self::InstallFixes => config.install.install_fixes.to_string(),
            Self::HostRegistryFile => config.host.registry_file.display().to_string(),
            Self::LoggingLevel => config.logging.level.clone(),
            Self::LoggingFile => path_text(&config.logging.file),
        }
    }

    /// Validates `value` and stores it. An empty value clears optional
    /// settings and restores the default of the others.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let invalid = |reason: &str| ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        };
        let optional_path = || (!value.is_empty()).then(|| PathBuf::from(value));

        match self {
            Self::DepotsRoots => {
                config.depots.roots = value
                    .split(',')
                    .map(str::trim)
                    .filter(|root| !root.is_empty())
                    .map(PathBuf::from)
                    .collect();
            }
            Self::DepotsCatalog => config.depots.catalog = optional_path(),
            Self::DepotsFixesDir => {
                config.depots.fixes_dir = if value.is_empty() {
                    DEFAULT_FIXES_DIR.to_string()
                } else if value.contains(['/', '\\']) {
                    return Err(invalid("must be a directory name, not a path"));
                } else {
                    value.to_string()
                };
            }
            Self::DepotsProbeDepth => {
                config.depots.probe_depth = if value.is_empty() {
                    DEFAULT_MAX_DEPTH
                } else {
                    value
                        .parse()
                        .map_err(|_| invalid("expected a non-negative integer"))?
                };
            }
            Self::InstallDestination => config.install.destination = optional_path(),
            Self::InstallLanguage => {
                config.install.language = if value.is_empty() {
                    None
                } else if Culture::find(value).is_some() {
                    Some(value.to_string())
                } else {
                    return Err(invalid("unknown language"));
                };
            }
            Self::InstallRunScript => {
                config.install.run_script = parse_bool(value, true).ok_or_else(|| invalid("expected true or false"))?
            }
            Self::InstallCommon => {
                config.install.install_common = parse_bool(value, true).ok_or_else(|| invalid("expected true or false"))?
            }
            Self::InstallFixes => {
                config.install.install_fixes = parse_bool(value, true).ok_or_else(|| invalid("expected true or false"))?
            }
            Self::HostRegistryFile => {
                config.host.registry_file =
                    optional_path().unwrap_or_else(|| HostSettings::default().registry_file)
            }
            Self::LoggingLevel => {
                let level = value.to_lowercase();
                config.logging.level = if level.is_empty() {
                    LoggingSettings::default().level
                } else if LOG_LEVELS.contains(&level.as_str()) {
                    level
                } else {
                    return Err(invalid("expected error, warn, info, debug or trace"));
                };
            }
            Self::LoggingFile => config.logging.file = optional_path(),
        }
        Ok(())
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

fn parse_bool(value: &str, default: bool) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "" => Some(default),
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Human-readable byte count, e.g. `1.5 GB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
