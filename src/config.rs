//! Configuration module for lexicache.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `LC_` and use double underscores
//! to separate nested levels:
//! - `LC_SOURCE__EXACT_LENGTH=3` sets `source.exact_length`
//! - `LC_SOURCE__DATABASE_PATH=/tmp/dict.redb` sets `source.database_path`
//! - `LC_STORE__MAX_MUTATIONS=500` sets `store.max_mutations`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::storage::BatchLimits;

/// Directory holding the settings file, searched upwards from the current
/// directory.
pub const CONFIG_DIR: &str = ".lexicache";
const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "LC_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .lexicache is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Dictionary source settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Write batching for the persistent store
    #[serde(default)]
    pub store: BatchLimits,

    /// File watcher settings
    #[serde(default)]
    pub watch: WatchConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SourceConfig {
    /// Dictionary files to index
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    /// Number of leading characters of the input used as the query prefix
    #[serde(default = "default_exact_length")]
    pub exact_length: usize,

    /// Also match words whose first letter differs only in case
    #[serde(default)]
    pub first_case_insensitive: bool,

    /// Report the originating dictionary in each item's info
    #[serde(default)]
    pub show_path: bool,

    /// Command whose output documents a word, e.g. `["dict", "${item.word}"]`
    #[serde(default)]
    pub document_command: Vec<String>,

    /// Persistent store location; empty disables the persistent backend
    #[serde(default)]
    pub database_path: PathBuf,

    /// Command used instead of a local index, e.g. `["look", "${prefix}", "${path}"]`
    #[serde(default)]
    pub external_command: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WatchConfig {
    /// Quiet period before a changed dictionary is re-indexed
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

/// Logging configuration with per-module level overrides.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `dictionary = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_exact_length() -> usize {
    2
}
fn default_debounce_ms() -> u64 {
    500
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            source: SourceConfig::default(),
            store: BatchLimits::default(),
            watch: WatchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            exact_length: default_exact_length(),
            first_case_insensitive: false,
            show_path: false,
            document_command: Vec::new(),
            database_path: PathBuf::new(),
            external_command: Vec::new(),
        }
    }
}

impl SourceConfig {
    /// Configured store location, `None` when left empty.
    pub fn database_path(&self) -> Option<&Path> {
        let path = self.database_path.as_path();
        (!path.as_os_str().is_empty()).then_some(path)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace root by looking for .lexicache directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));

        Self::load_from(config_path).map(|mut settings| {
            // If workspace_root is not set in config, detect it
            if settings.workspace_root.is_none() {
                settings.workspace_root = Self::workspace_root();
            }
            settings
        })
    }

    /// Load configuration from a specific file, still honoring env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path.as_ref()))
            // Double underscore (__) separates nested levels; single
            // underscores stay part of the field name
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find the workspace config by looking for .lexicache directory
    /// Searches from current directory up to root
    pub fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Get the workspace root directory (where .lexicache is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file under `dir`
    pub fn init_config_file(dir: &Path, force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = dir.join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        let settings = Settings {
            workspace_root: Some(dir.to_path_buf()),
            ..Settings::default()
        };
        settings.save(&config_path)?;

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.source.exact_length, 2);
        assert!(settings.source.database_path().is_none());
        assert_eq!(settings.store.max_mutations, 1000);
        assert_eq!(settings.store.max_key_bytes, 81920);
        assert_eq!(settings.watch.debounce_ms, 500);
        assert_eq!(settings.logging.default, "warn");
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
version = 2

[source]
paths = ["/usr/share/dict/words", "~/words.txt"]
exact_length = 3
first_case_insensitive = true
database_path = "/tmp/dict.redb"
document_command = ["dict", "${item.word}"]

[store]
max_mutations = 10
max_key_bytes = 4096

[logging.modules]
dictionary = "debug"
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.version, 2);
        assert_eq!(settings.source.paths.len(), 2);
        assert_eq!(settings.source.exact_length, 3);
        assert!(settings.source.first_case_insensitive);
        assert_eq!(
            settings.source.database_path(),
            Some(Path::new("/tmp/dict.redb"))
        );
        assert_eq!(settings.source.document_command, vec!["dict", "${item.word}"]);
        assert_eq!(settings.store.max_mutations, 10);
        assert_eq!(settings.logging.modules["dictionary"], "debug");
    }

    #[test]
    fn test_save_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.source.show_path = true;
        settings.source.external_command = vec!["look".into(), "${prefix}".into()];

        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert!(loaded.source.show_path);
        assert_eq!(loaded.source.external_command, vec!["look", "${prefix}"]);
    }

    #[test]
    fn test_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        // Only specify a few settings
        let toml_content = r#"
[source]
show_path = true
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();

        // Modified values
        assert!(settings.source.show_path);

        // Default values should still be present
        assert_eq!(settings.version, 1);
        assert_eq!(settings.source.exact_length, 2);
        assert_eq!(settings.store, BatchLimits::default());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from(temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.source, SourceConfig::default());
    }

    #[test]
    fn test_init_config_file_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();

        let path = Settings::init_config_file(temp_dir.path(), false).unwrap();
        assert!(path.ends_with(".lexicache/settings.toml"));
        assert!(Settings::init_config_file(temp_dir.path(), false).is_err());
        assert!(Settings::init_config_file(temp_dir.path(), true).is_ok());

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.workspace_root.as_deref(), Some(temp_dir.path()));
    }
}
