//! Board configuration.
//!
//! Resolution order, later wins:
//! 1. Built-in defaults (local backend on `127.0.0.1:54321`, no key)
//! 2. `<config_dir>/roadmap-board/config.json`
//! 3. `ROADMAP_BACKEND_URL` / `ROADMAP_ANON_KEY`
//! 4. Command-line flags (applied by the binary)

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "roadmap-board";
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:54321";
pub const BACKEND_URL_ENV: &str = "ROADMAP_BACKEND_URL";
pub const ANON_KEY_ENV: &str = "ROADMAP_ANON_KEY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Project URL of the table backend, without the `/rest/v1` suffix.
    pub backend_url: String,
    /// Public (anon) key sent with every request.
    #[serde(default)]
    pub anon_key: Option<String>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            anon_key: None,
        }
    }
}

impl BoardConfig {
    /// Load from the config file and environment.
    /// Falls back to defaults if the file is missing or fails to parse.
    pub fn load() -> Self {
        let mut config = match get_config_path().and_then(|p| Self::try_load(&p)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn try_load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config = serde_json::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Override fields from environment variables looked up through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(BACKEND_URL_ENV).filter(|s| !s.trim().is_empty()) {
            self.backend_url = url;
        }
        if let Some(key) = var(ANON_KEY_ENV).filter(|s| !s.trim().is_empty()) {
            self.anon_key = Some(key);
        }
    }

    /// Override fields given on the command line.
    pub fn with_overrides(mut self, backend_url: Option<String>, anon_key: Option<String>) -> Self {
        if let Some(url) = backend_url {
            self.backend_url = url;
        }
        if anon_key.is_some() {
            self.anon_key = anon_key;
        }
        self
    }

    /// Save the configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BoardConfig::try_load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, BoardConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = BoardConfig {
            backend_url: "https://roadmap.example.com".to_string(),
            anon_key: Some("anon".to_string()),
        };
        config.save(&path).unwrap();
        assert_eq!(BoardConfig::try_load(&path).unwrap(), config);
    }

    #[test]
    fn test_overrides_keep_unset_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        BoardConfig {
            backend_url: "https://roadmap.example.com".to_string(),
            anon_key: Some("anon".to_string()),
        }
        .save(&path)
        .unwrap();

        BoardConfig::try_load(&path)
            .unwrap()
            .with_overrides(Some("https://other.example.com".to_string()), None)
            .save(&path)
            .unwrap();

        let saved = BoardConfig::try_load(&path).unwrap();
        assert_eq!(saved.backend_url, "https://other.example.com");
        assert_eq!(saved.anon_key.as_deref(), Some("anon"));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = BoardConfig::default();
        config.apply_env(|key| match key {
            BACKEND_URL_ENV => Some("https://hosted.example.com".to_string()),
            ANON_KEY_ENV => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.backend_url, "https://hosted.example.com");
        assert!(config.anon_key.is_none());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(BoardConfig::try_load(&path).is_err());
    }
}
