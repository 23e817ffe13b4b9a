//! Registry access for install scripts.
//!
//! Scripts write string and DWORD values below well-known hives and use
//! marker values to remember which setup processes already ran. The
//! [`Registry`] trait is the seam; [`MemoryRegistry`] keeps everything in
//! memory and [`FileRegistry`] persists the same data to an INI file so
//! markers survive between runs on hosts without a native registry.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use ini::Ini;
use parking_lot::Mutex;
use tracing::debug;

use super::HostError;

/// Which registry view a key is opened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum RegistryView {
    #[default]
    Default,
    Registry32,
    Registry64,
}

impl RegistryView {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Registry32 => "Registry32",
            Self::Registry64 => "Registry64",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        [Self::Default, Self::Registry32, Self::Registry64]
            .into_iter()
            .find(|view| view.name().eq_ignore_ascii_case(name))
    }
}

/// Top-level registry hive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Hive {
    ClassesRoot,
    CurrentUser,
    LocalMachine,
    Users,
    CurrentConfig,
}

impl Hive {
    /// Canonical long name, e.g. `HKEY_LOCAL_MACHINE`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ClassesRoot => "HKEY_CLASSES_ROOT",
            Self::CurrentUser => "HKEY_CURRENT_USER",
            Self::LocalMachine => "HKEY_LOCAL_MACHINE",
            Self::Users => "HKEY_USERS",
            Self::CurrentConfig => "HKEY_CURRENT_CONFIG",
        }
    }

    fn short_name(&self) -> &'static str {
        match self {
            Self::ClassesRoot => "HKCR",
            Self::CurrentUser => "HKCU",
            Self::LocalMachine => "HKLM",
            Self::Users => "HKU",
            Self::CurrentConfig => "HKCC",
        }
    }

    /// Parses a long or abbreviated hive name, ignoring case.
    pub fn parse(text: &str) -> Option<Self> {
        [
            Self::ClassesRoot,
            Self::CurrentUser,
            Self::LocalMachine,
            Self::Users,
            Self::CurrentConfig,
        ]
        .into_iter()
        .find(|hive| {
            hive.name().eq_ignore_ascii_case(text) || hive.short_name().eq_ignore_ascii_case(text)
        })
    }
}

/// A registry value as scripts read and write it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryValue {
    String(String),
    DWord(u32),
}

impl RegistryValue {
    fn encode(&self) -> String {
        match self {
            Self::String(text) => format!("string:{}", text),
            Self::DWord(value) => format!("dword:{}", value),
        }
    }

    fn decode(text: &str) -> Option<Self> {
        if let Some(rest) = text.strip_prefix("string:") {
            Some(Self::String(rest.to_string()))
        } else if let Some(rest) = text.strip_prefix("dword:") {
            rest.trim().parse().ok().map(Self::DWord)
        } else {
            None
        }
    }
}

impl fmt::Display for RegistryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(text) => write!(f, "\"{}\"", text),
            Self::DWord(value) => write!(f, "dword:{:08x}", value),
        }
    }
}

/// A key path resolved to its hive and view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryKey {
    view: RegistryView,
    hive: Hive,
    /// Subkey segments below the hive.
    segments: Vec<String>,
}

impl RegistryKey {
    /// Parses `HIVE\sub\key`. Empty segments are dropped.
    pub fn parse(path: &str, view: RegistryView) -> Result<Self, HostError> {
        let mut parts = path.split(['\\', '/']).filter(|part| !part.is_empty());
        let hive = parts
            .next()
            .and_then(Hive::parse)
            .ok_or_else(|| HostError::UnknownHive(path.to_string()))?;

        Ok(Self {
            view,
            hive,
            segments: parts.map(str::to_string).collect(),
        })
    }

    pub fn view(&self) -> RegistryView {
        self.view
    }

    pub fn hive(&self) -> Hive {
        self.hive
    }

    /// Subkey path below the hive, `\`-separated.
    pub fn subkey(&self) -> String {
        self.segments.join("\\")
    }

    /// Case-insensitive identity of the key.
    fn identity(&self) -> String {
        self.storage_name().to_lowercase()
    }

    /// Section name used by [`FileRegistry`].
    fn storage_name(&self) -> String {
        let mut name = format!("{}/{}", self.view.name(), self.hive.name());
        for segment in &self.segments {
            name.push('/');
            name.push_str(segment);
        }
        name
    }

    fn from_storage_name(name: &str) -> Option<Self> {
        let mut parts = name.split('/');
        let view = RegistryView::from_name(parts.next()?)?;
        let hive = Hive::parse(parts.next()?)?;
        Some(Self {
            view,
            hive,
            segments: parts.filter(|p| !p.is_empty()).map(str::to_string).collect(),
        })
    }
}

impl fmt::Display for RegistryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hive.name())?;
        for segment in &self.segments {
            write!(f, "\\{}", segment)?;
        }
        Ok(())
    }
}

/// Registry operations used by install scripts.
pub trait Registry: Send + Sync {
    /// Opens an existing key; `None` when it does not exist.
    fn open_key(&self, path: &str, view: RegistryView) -> Result<Option<RegistryKey>, HostError>;

    /// Opens a key, creating it when missing.
    fn create_key(&self, path: &str, view: RegistryView) -> Result<RegistryKey, HostError>;

    fn get_value(&self, key: &RegistryKey, name: &str) -> Result<Option<RegistryValue>, HostError>;

    /// Writes a value, creating the key when missing.
    fn set_value(&self, key: &RegistryKey, name: &str, value: RegistryValue) -> Result<(), HostError>;
}

#[derive(Debug, Clone)]
struct KeyData {
    key: RegistryKey,
    /// Lowercased name -> (original name, value).
    values: BTreeMap<String, (String, RegistryValue)>,
}

impl KeyData {
    fn new(key: RegistryKey) -> Self {
        Self {
            key,
            values: BTreeMap::new(),
        }
    }
}

/// In-memory registry. Key paths and value names compare case-insensitively.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    keys: Mutex<BTreeMap<String, KeyData>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every key currently stored.
    pub fn keys(&self) -> Vec<RegistryKey> {
        self.keys.lock().values().map(|data| data.key.clone()).collect()
    }

    /// Values of `key` with their original names, sorted by name.
    pub fn values(&self, key: &RegistryKey) -> Vec<(String, RegistryValue)> {
        self.keys
            .lock()
            .get(&key.identity())
            .map(|data| data.values.values().cloned().collect())
            .unwrap_or_default()
    }

    fn insert_key(&self, key: RegistryKey) -> RegistryKey {
        self.keys
            .lock()
            .entry(key.identity())
            .or_insert_with(|| KeyData::new(key))
            .key
            .clone()
    }
}

impl Registry for MemoryRegistry {
    fn open_key(&self, path: &str, view: RegistryView) -> Result<Option<RegistryKey>, HostError> {
        let key = RegistryKey::parse(path, view)?;
        Ok(self
            .keys
            .lock()
            .get(&key.identity())
            .map(|data| data.key.clone()))
    }

    fn create_key(&self, path: &str, view: RegistryView) -> Result<RegistryKey, HostError> {
        let key = RegistryKey::parse(path, view)?;
        Ok(self.insert_key(key))
    }

    fn get_value(&self, key: &RegistryKey, name: &str) -> Result<Option<RegistryValue>, HostError> {
        Ok(self.keys.lock().get(&key.identity()).and_then(|data| {
            data.values
                .get(&name.to_lowercase())
                .map(|(_, value)| value.clone())
        }))
    }

    fn set_value(&self, key: &RegistryKey, name: &str, value: RegistryValue) -> Result<(), HostError> {
        debug!(key = %key, name, value = %value, "Registry write");
        self.keys
            .lock()
            .entry(key.identity())
            .or_insert_with(|| KeyData::new(key.clone()))
            .values
            .insert(name.to_lowercase(), (name.to_string(), value));
        Ok(())
    }
}

/// Registry persisted to an INI file.
///
/// Each key is a section named `<view>/<hive>/<sub>/<key>`; each value is an
/// entry `name = dword:N` or `name = string:text`. The file is rewritten after
/// every change.
#[derive(Debug)]
pub struct FileRegistry {
    path: PathBuf,
    memory: MemoryRegistry,
}

impl FileRegistry {
    /// Opens the registry stored at `path`. A missing file is an empty
    /// registry.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HostError> {
        let path = path.into();
        let memory = MemoryRegistry::new();

        if path.exists() {
            let ini = Ini::load_from_file(&path).map_err(|e| HostError::Storage {
                path: path.clone(),
                message: e.to_string(),
            })?;

            for (section, properties) in ini.iter() {
                let Some(section) = section else { continue };
                let key = RegistryKey::from_storage_name(section).ok_or_else(|| {
                    HostError::Storage {
                        path: path.clone(),
                        message: format!("invalid key section [{}]", section),
                    }
                })?;
                let key = memory.insert_key(key);

                for (name, text) in properties.iter() {
                    let value = RegistryValue::decode(text).ok_or_else(|| HostError::Storage {
                        path: path.clone(),
                        message: format!("invalid value {} = {}", name, text),
                    })?;
                    memory.set_value(&key, name, value)?;
                }
            }
            debug!(path = %path.display(), keys = memory.keys().len(), "Loaded registry file");
        }

        Ok(Self { path, memory })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Values of `key`, see [`MemoryRegistry::values`].
    pub fn values(&self, key: &RegistryKey) -> Vec<(String, RegistryValue)> {
        self.memory.values(key)
    }

    fn save(&self) -> Result<(), HostError> {
        let mut ini = Ini::new();
        for key in self.memory.keys() {
            let section = key.storage_name();
            // Sections without values still have to appear in the file
            ini.with_section(Some(section.as_str()));
            for (name, value) in self.memory.values(&key) {
                ini.with_section(Some(section.as_str()))
                    .set(name, value.encode());
            }
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| HostError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        ini.write_to_file(&self.path).map_err(|source| HostError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl Registry for FileRegistry {
    fn open_key(&self, path: &str, view: RegistryView) -> Result<Option<RegistryKey>, HostError> {
        self.memory.open_key(path, view)
    }

    fn create_key(&self, path: &str, view: RegistryView) -> Result<RegistryKey, HostError> {
        let existed = self.memory.open_key(path, view)?.is_some();
        let key = self.memory.create_key(path, view)?;
        if !existed {
            self.save()?;
        }
        Ok(key)
    }

    fn get_value(&self, key: &RegistryKey, name: &str) -> Result<Option<RegistryValue>, HostError> {
        self.memory.get_value(key, name)
    }

    fn set_value(&self, key: &RegistryKey, name: &str, value: RegistryValue) -> Result<(), HostError> {
        self.memory.set_value(key, name, value)?;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_key_hives() {
        let key = RegistryKey::parse(
            "HKEY_LOCAL_MACHINE\\Software\\Valve\\Steam\\Apps\\1000",
            RegistryView::Registry32,
        )
        .unwrap();
        assert_eq!(key.hive(), Hive::LocalMachine);
        assert_eq!(key.subkey(), "Software\\Valve\\Steam\\Apps\\1000");
        assert_eq!(key.view(), RegistryView::Registry32);

        let short = RegistryKey::parse("hkcu\\Software\\", RegistryView::Default).unwrap();
        assert_eq!(short.hive(), Hive::CurrentUser);
        assert_eq!(short.to_string(), "HKEY_CURRENT_USER\\Software");
    }

    #[test]
    fn test_parse_unknown_hive() {
        let result = RegistryKey::parse("HKEY_NOWHERE\\Software", RegistryView::Default);
        assert!(matches!(result, Err(HostError::UnknownHive(_))));
        assert!(RegistryKey::parse("", RegistryView::Default).is_err());
    }

    #[test]
    fn test_memory_open_missing_key() {
        let registry = MemoryRegistry::new();
        let key = registry
            .open_key("HKLM\\Software\\Nothing", RegistryView::Default)
            .unwrap();
        assert!(key.is_none());
    }

    #[test]
    fn test_memory_case_insensitive() {
        let registry = MemoryRegistry::new();
        let key = registry
            .create_key("HKEY_LOCAL_MACHINE\\Software\\Game", RegistryView::Registry32)
            .unwrap();
        registry
            .set_value(&key, "Installed", RegistryValue::DWord(1))
            .unwrap();

        let reopened = registry
            .open_key("hklm\\SOFTWARE\\game", RegistryView::Registry32)
            .unwrap()
            .unwrap();
        assert_eq!(
            registry.get_value(&reopened, "INSTALLED").unwrap(),
            Some(RegistryValue::DWord(1))
        );

        // Views are separate
        assert!(registry
            .open_key("HKLM\\Software\\Game", RegistryView::Registry64)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_memory_overwrite_value() {
        let registry = MemoryRegistry::new();
        let key = registry
            .create_key("HKCU\\Software\\Game", RegistryView::Default)
            .unwrap();
        registry
            .set_value(&key, "Language", RegistryValue::String("english".into()))
            .unwrap();
        registry
            .set_value(&key, "language", RegistryValue::String("german".into()))
            .unwrap();

        let values = registry.values(&key);
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].1, RegistryValue::String("german".into()));
    }

    #[test]
    fn test_file_registry_persists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state").join("registry.ini");

        {
            let registry = FileRegistry::open(&path).unwrap();
            let key = registry
                .create_key("HKEY_LOCAL_MACHINE\\Software\\Valve\\Steam\\Apps\\1000", RegistryView::Registry32)
                .unwrap();
            registry
                .set_value(&key, "DirectX", RegistryValue::DWord(1))
                .unwrap();
            registry
                .set_value(&key, "Path", RegistryValue::String("C:\\Games\\Game".into()))
                .unwrap();
            registry
                .create_key("HKCU\\Software\\Empty", RegistryView::Default)
                .unwrap();
        }

        let registry = FileRegistry::open(&path).unwrap();
        let key = registry
            .open_key("HKLM\\Software\\Valve\\Steam\\Apps\\1000", RegistryView::Registry32)
            .unwrap()
            .unwrap();
        assert_eq!(
            registry.get_value(&key, "directx").unwrap(),
            Some(RegistryValue::DWord(1))
        );
        assert_eq!(
            registry.get_value(&key, "Path").unwrap(),
            Some(RegistryValue::String("C:\\Games\\Game".into()))
        );
        assert!(registry
            .open_key("HKCU\\Software\\Empty", RegistryView::Default)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_file_registry_rejects_bad_value() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("registry.ini");
        std::fs::write(&path, "[Default/HKEY_CURRENT_USER/Software]\nName = binary:00\n").unwrap();

        let result = FileRegistry::open(&path);
        assert!(matches!(result, Err(HostError::Storage { .. })));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(RegistryValue::DWord(1).to_string(), "dword:00000001");
        assert_eq!(RegistryValue::String("x".into()).to_string(), "\"x\"");
    }
}
