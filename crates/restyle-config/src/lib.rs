use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum retained undo snapshots.
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Keystrokes closer together than this coalesce into one undo step.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Atomic element vocabulary accepted by the parser. Empty means the
    /// standard plugin set.
    #[serde(default)]
    pub custom_tags: Vec<String>,

    /// Document opened when none is given on the command line.
    #[serde(default)]
    pub default_document: Option<PathBuf>,
}

fn default_history_size() -> usize {
    100
}

fn default_debounce_ms() -> u64 {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
            debounce_ms: default_debounce_ms(),
            custom_tags: Vec::new(),
            default_document: None,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the loaded document path
        config.default_document = config
            .default_document
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/restyle");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        // Should not contain tilde anymore
        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/restyle/config.toml"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.history_size, 100);
        assert_eq!(config.debounce_ms, 300);
        assert!(config.custom_tags.is_empty());
        assert!(config.default_document.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("history_size = 25\n").unwrap();

        assert_eq!(config.history_size, 25);
        assert_eq!(config.debounce_ms, 300);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let original = Config {
            history_size: 50,
            debounce_ms: 150,
            custom_tags: vec!["x-link".to_string(), "x-widget".to_string()],
            default_document: Some(PathBuf::from("/tmp/doc.html")),
        };

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(deserialized.history_size, original.history_size);
        assert_eq!(deserialized.debounce_ms, original.debounce_ms);
        assert_eq!(deserialized.custom_tags, original.custom_tags);
        assert_eq!(deserialized.default_document, original.default_document);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        let test_config = Config {
            history_size: 10,
            debounce_ms: 500,
            custom_tags: vec!["x-comment".to_string()],
            default_document: Some(PathBuf::from("/tmp/doc.html")),
        };

        test_config.save_to_path(&config_file).unwrap();

        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config.history_size, test_config.history_size);
        assert_eq!(loaded_config.custom_tags, test_config.custom_tags);
    }

    #[test]
    fn test_document_path_with_tilde_in_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "default_document = \"~/docs/page.html\"\n").unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();

        let expanded = config.default_document.unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("docs/page.html"));
    }

    #[test]
    fn test_document_path_with_env_var_in_toml() {
        unsafe {
            env::set_var("RESTYLE_DOCS", "/custom/docs");
        }

        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "default_document = \"$RESTYLE_DOCS/page.html\"\n").unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();
        assert_eq!(
            config.default_document,
            Some(PathBuf::from("/custom/docs/page.html"))
        );

        unsafe {
            env::remove_var("RESTYLE_DOCS");
        }
    }

    #[test]
    fn test_parse_error_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "history_size = \"lots\"\n").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }
}
