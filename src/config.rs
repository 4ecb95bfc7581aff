//! Configuration loading
//!
//! Resolution order:
//! 1. Path given on the command line (must exist)
//! 2. `DISCOVER_PARITY_CONFIG` environment variable (skipped with a warning
//!    when the file is missing)
//! 3. `<config dir>/discover-parity/config.json`
//! 4. Built-in defaults
//!
//! `TMDB_API_KEY` always overrides `api.api_key`.

use crate::error::{ParityError, Result};
use crate::normalize::{Normalizer, PAGE_DATE_FORMATS};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "DISCOVER_PARITY_CONFIG";
pub const API_KEY_ENV: &str = "TMDB_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ui: UiConfig,
    pub api: ApiConfig,
    pub browser: BrowserSettings,
    pub compare: CompareConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Site root the Discover page lives under
    pub discover_url: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            discover_url: "https://www.themoviedb.org".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.themoviedb.org/3".to_string(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    pub no_sandbox: bool,
    pub chrome_path: Option<String>,
    pub page_timeout_secs: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            no_sandbox: true,
            chrome_path: None,
            page_timeout_secs: 15,
        }
    }
}

impl BrowserSettings {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    pub max_pages: u32,
    /// Cards read from the Discover page
    pub card_limit: usize,
    pub min_match_ratio: f64,
    /// Extra `chrono` date formats accepted from the page (ISO is always accepted)
    pub date_formats: Vec<String>,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            max_pages: 2,
            card_limit: 10,
            min_match_ratio: 0.0,
            date_formats: PAGE_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl CompareConfig {
    pub fn normalizer(&self) -> Normalizer {
        Normalizer::with_formats(self.date_formats.iter().cloned())
    }
}

impl Config {
    /// Resolve and load configuration, then apply environment overrides
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match Self::resolve_path(explicit)? {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                log::info!("No config file found, using defaults");
                Self::default()
            }
        };
        config.apply_env();
        Ok(config)
    }

    fn resolve_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ParityError::InvalidConfig(format!(
                    "Config file not found at {}",
                    path.display()
                )));
            }
            return Ok(Some(path.to_path_buf()));
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok(Some(path));
            }
            log::warn!("{} points at missing file {}", CONFIG_ENV, path.display());
        }

        Ok(Self::default_path().filter(|p| p.exists()))
    }

    /// Platform config location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("discover-parity").join("config.json"))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| ParityError::InvalidConfig(format!("Malformed config: {}", e)))
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.api.api_key = key.trim().to_string();
            }
        }
    }

    /// Check values that would otherwise fail deep inside a run
    pub fn validate(&self, needs_api_key: bool) -> Result<()> {
        Url::parse(&self.api.base_url).map_err(|e| {
            ParityError::InvalidConfig(format!("api.base_url {:?}: {}", self.api.base_url, e))
        })?;
        Url::parse(&self.ui.discover_url).map_err(|e| {
            ParityError::InvalidConfig(format!(
                "ui.discover_url {:?}: {}",
                self.ui.discover_url, e
            ))
        })?;
        if needs_api_key && self.api.api_key.trim().is_empty() {
            return Err(ParityError::InvalidConfig(format!(
                "api.api_key is empty; set it in the config file or {}",
                API_KEY_ENV
            )));
        }
        if self.compare.max_pages == 0 {
            return Err(ParityError::InvalidConfig(
                "compare.max_pages must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.compare.min_match_ratio) {
            return Err(ParityError::InvalidConfig(format!(
                "compare.min_match_ratio must be within [0, 1], got {}",
                self.compare.min_match_ratio
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_json(r#"{"api": {"api_key": "abc"}, "compare": {"max_pages": 3}}"#)
            .unwrap();
        assert_eq!(config.api.api_key, "abc");
        assert_eq!(config.api.base_url, "https://api.themoviedb.org/3");
        assert_eq!(config.compare.max_pages, 3);
        assert_eq!(config.compare.card_limit, 10);
        assert!(config.browser.headless);
        assert!(config.validate(true).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.validate(false).is_ok());
        assert!(config.validate(true).is_err(), "empty api key");

        config.compare.min_match_ratio = 1.5;
        assert!(config.validate(false).is_err());

        config.compare.min_match_ratio = 0.5;
        config.compare.max_pages = 0;
        assert!(config.validate(false).is_err());

        config.compare.max_pages = 1;
        config.api.base_url = "not a url".to_string();
        assert!(config.validate(false).is_err());
    }

    #[test]
    fn test_malformed_json_is_invalid_config() {
        let err = Config::from_json("{ nope").unwrap_err();
        assert!(matches!(err, ParityError::InvalidConfig(_)));
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let err = Config::load(Some(Path::new("/definitely/not/here.json"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"ui": {"discover_url": "http://127.0.0.1:9"}}"#).unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.ui.discover_url, "http://127.0.0.1:9");
    }

    #[test]
    fn test_env_path_is_used_and_missing_env_file_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("env-config.json");
        std::fs::write(&path, r#"{"compare": {"card_limit": 4}}"#).unwrap();

        std::env::set_var(CONFIG_ENV, &path);
        let from_env = Config::load(None).unwrap();
        assert_eq!(from_env.compare.card_limit, 4);

        std::env::set_var(CONFIG_ENV, dir.path().join("missing.json"));
        let fallback = Config::resolve_path(None).unwrap();
        std::env::remove_var(CONFIG_ENV);
        assert_ne!(fallback, Some(dir.path().join("missing.json")));
    }
}
