//! Configuration file: palette name, saved filters, connection profiles,
//! last namespace. Loaded on startup, saved on explicit user action
//! (save-filter, set-theme, quit).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use weft_core::SavedFilter;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// A named server connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    pub name: String,
    pub address: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuiConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub last_namespace: Option<String>,
    #[serde(default)]
    pub profiles: Vec<ConnectionProfile>,
    #[serde(default, rename = "filters")]
    pub saved_filters: Vec<SavedFilter>,
}

fn default_theme() -> String {
    "synthwave".to_string()
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            last_namespace: None,
            profiles: Vec::new(),
            saved_filters: Vec::new(),
        }
    }
}

impl TuiConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Missing file yields defaults; a malformed file is an error the
    /// caller reports before falling back.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_path(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Inserts or replaces a saved filter by name. Setting a default
    /// clears the previous default.
    pub fn save_filter(&mut self, filter: SavedFilter) {
        if filter.is_default {
            for existing in &mut self.saved_filters {
                existing.is_default = false;
            }
        }
        match self.saved_filters.iter_mut().find(|f| f.name == filter.name) {
            Some(existing) => *existing = filter,
            None => self.saved_filters.push(filter),
        }
    }

    pub fn delete_filter(&mut self, name: &str) {
        self.saved_filters.retain(|f| f.name != name);
    }

    pub fn set_default_filter(&mut self, name: &str) {
        for filter in &mut self.saved_filters {
            filter.is_default = filter.name == name;
        }
    }

    pub fn default_filter(&self) -> Option<&SavedFilter> {
        self.saved_filters.iter().find(|f| f.is_default)
    }
}

/// Resolution order: `WEFT_CONFIG`, then `$XDG_CONFIG_HOME/weft/config.toml`,
/// then `~/.config/weft/config.toml`.
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("WEFT_CONFIG") {
        return PathBuf::from(path);
    }
    if let Ok(base) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(base).join("weft").join("config.toml");
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".config").join("weft").join("config.toml")
}

/// Log file next to the config file.
pub fn log_path() -> PathBuf {
    let mut path = config_path();
    path.set_file_name("weft.log");
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn filter(name: &str, query: &str, is_default: bool) -> SavedFilter {
        SavedFilter {
            name: name.to_string(),
            query: query.to_string(),
            is_default,
        }
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = TuiConfig::load_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.theme, "synthwave");
        assert!(config.saved_filters.is_empty());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "theme = [not toml").unwrap();
        assert!(matches!(
            TuiConfig::load_or_default(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn save_and_reload_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weft").join("config.toml");

        let mut config = TuiConfig {
            theme: "midnight".to_string(),
            last_namespace: Some("production".to_string()),
            ..Default::default()
        };
        config.profiles.push(ConnectionProfile {
            name: "local".to_string(),
            address: "localhost:7233".to_string(),
            namespace: "default".to_string(),
        });
        config.save_filter(filter("failures", "ExecutionStatus='Failed'", true));

        config.save(&path).unwrap();
        let back = TuiConfig::from_path(&path).unwrap();
        assert_eq!(config, back);
        assert_eq!(back.default_filter().map(|f| f.name.as_str()), Some("failures"));
    }

    #[test]
    fn save_filter_replaces_by_name_and_moves_default() {
        let mut config = TuiConfig::default();
        config.save_filter(filter("a", "q1", true));
        config.save_filter(filter("b", "q2", false));
        assert_eq!(config.default_filter().map(|f| f.name.as_str()), Some("a"));

        config.save_filter(filter("b", "q2-new", true));
        assert_eq!(config.saved_filters.len(), 2);
        assert_eq!(config.default_filter().map(|f| f.name.as_str()), Some("b"));
        assert_eq!(
            config.saved_filters.iter().find(|f| f.name == "b").map(|f| f.query.as_str()),
            Some("q2-new")
        );
    }

    #[test]
    fn delete_and_set_default() {
        let mut config = TuiConfig::default();
        config.save_filter(filter("a", "q1", false));
        config.save_filter(filter("b", "q2", false));

        config.set_default_filter("a");
        assert_eq!(config.default_filter().map(|f| f.name.as_str()), Some("a"));

        config.delete_filter("a");
        assert_eq!(config.saved_filters.len(), 1);
        assert!(config.default_filter().is_none());
    }
}
