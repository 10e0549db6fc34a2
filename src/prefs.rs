use crate::error::PrefsError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// ============================================================================
// PREFERENCES
// ============================================================================

/// Key holding the background style.
pub const SPACE_THEME_KEY: &str = "space-theme";

/// Key holding the accent color scheme.
pub const COLOR_SCHEME_KEY: &str = "color-scheme";

/// Key holding "dark" or "light".
pub const THEME_MODE_KEY: &str = "theme";

pub const PREFERENCES_FILE_NAME: &str = "preferences.toml";

/// A small key-value record of plain strings.
pub trait PreferenceStorage {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError>;

    fn remove(&mut self, key: &str) -> Result<(), PrefsError>;
}

/// In-memory storage, used when no config directory exists and in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryPreferences {
    values: BTreeMap<String, String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStorage for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PrefsError> {
        self.values.remove(key);
        Ok(())
    }
}

/// TOML-file backed storage. Values are cached in memory and the whole file
/// is rewritten on each change.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FilePreferences {
    /// Default location inside the platform config directory.
    pub fn default_path() -> Result<PathBuf, PrefsError> {
        crate::config::project_dirs()
            .map(|dirs| dirs.config_dir().join(PREFERENCES_FILE_NAME))
            .ok_or(PrefsError::NoConfigDir)
    }

    /// Opens the record at `path`; a missing file is an empty record.
    /// Entries that are not strings are skipped with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PrefsError> {
        let path = path.into();
        let values = if path.exists() {
            let content = fs::read_to_string(&path)?;
            string_entries(toml::from_str(&content)?)
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), entries = values.len(), "loaded preferences");
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), PrefsError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string(&self.values)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

fn string_entries(table: toml::Table) -> BTreeMap<String, String> {
    table
        .into_iter()
        .filter_map(|(key, value)| match value {
            toml::Value::String(s) => Some((key, s)),
            other => {
                warn!(key = %key, kind = other.type_str(), "ignoring non-string preference");
                None
            }
        })
        .collect()
}

impl PreferenceStorage for FilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), PrefsError> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_set_get_remove() {
        let mut prefs = MemoryPreferences::new();
        assert_eq!(prefs.get(SPACE_THEME_KEY), None);
        prefs.set(SPACE_THEME_KEY, "nebula").unwrap();
        assert_eq!(prefs.get(SPACE_THEME_KEY).as_deref(), Some("nebula"));
        prefs.remove(SPACE_THEME_KEY).unwrap();
        assert_eq!(prefs.get(SPACE_THEME_KEY), None);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(PREFERENCES_FILE_NAME);

        let mut prefs = FilePreferences::open(&path).unwrap();
        prefs.set(SPACE_THEME_KEY, "nebula").unwrap();
        prefs.set(COLOR_SCHEME_KEY, "violet").unwrap();
        assert!(path.exists());

        let reopened = FilePreferences::open(&path).unwrap();
        assert_eq!(reopened.get(SPACE_THEME_KEY).as_deref(), Some("nebula"));
        assert_eq!(reopened.get(COLOR_SCHEME_KEY).as_deref(), Some("violet"));
    }

    #[test]
    fn test_file_skips_non_string_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE_NAME);
        fs::write(&path, "space-theme = 3\ntheme = \"light\"\n[color-scheme]\nx = 1\n").unwrap();

        let mut prefs = FilePreferences::open(&path).unwrap();
        assert_eq!(prefs.get(SPACE_THEME_KEY), None);
        assert_eq!(prefs.get(COLOR_SCHEME_KEY), None);
        assert_eq!(prefs.get(THEME_MODE_KEY).as_deref(), Some("light"));

        // the next write replaces the bad entries on disk
        prefs.set(SPACE_THEME_KEY, "nebula").unwrap();
        let reopened = FilePreferences::open(&path).unwrap();
        assert_eq!(reopened.get(SPACE_THEME_KEY).as_deref(), Some("nebula"));
        assert_eq!(reopened.get(THEME_MODE_KEY).as_deref(), Some("light"));
        assert_eq!(reopened.get(COLOR_SCHEME_KEY), None);
    }

    #[test]
    fn test_file_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE_NAME);
        fs::write(&path, "this is = = not toml").unwrap();
        assert!(matches!(
            FilePreferences::open(&path),
            Err(PrefsError::TomlDeserialize(_))
        ));
    }
}
