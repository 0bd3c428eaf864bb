use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stats::ESTIMATE_DEFAULT_PAGES;

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;
const DEFAULT_WORD_CLOUD_SIZE: usize = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("invalid config file {path}: {source}")]
    Toml { path: String, source: toml::de::Error },
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Settings read from `config.toml` in the state directory. Every key is
/// optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub search_debounce_ms: u64,
    pub word_cloud_size: usize,
    pub estimate_default_pages: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            word_cloud_size: DEFAULT_WORD_CLOUD_SIZE,
            estimate_default_pages: ESTIMATE_DEFAULT_PAGES,
        }
    }
}

impl AppConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        let base = self.api_base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api_base_url must start with http:// or https://, got {base:?}"
            )));
        }
        Ok(Self {
            api_base_url: base.trim_end_matches('/').to_string(),
            ..self
        })
    }
}

/// Loads the config file, then applies `WRAPPEDUP_API_URL`.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let mut config = read_config_file(path)?;
    if let Ok(url) = env::var("WRAPPEDUP_API_URL") {
        if !url.trim().is_empty() {
            config.api_base_url = url;
        }
    }
    config.validate()
}

fn read_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("no config at {}, using defaults", path.display());
            return Ok(AppConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            });
        }
    };

    toml::from_str(&raw).map_err(|source| ConfigError::Toml {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::{AppConfig, ConfigError, read_config_file};

    #[test]
    fn partial_file_keeps_defaults() {
        let path = temp_file("wrappedup_config_partial.toml");
        fs::write(&path, "search_debounce_ms = 150\napi_base_url = \"https://books.example.com/\"\n").unwrap();

        let config = read_config_file(&path).unwrap().validate().unwrap();
        assert_eq!(config.search_debounce_ms, 150);
        assert_eq!(config.api_base_url, "https://books.example.com");
        assert_eq!(config.word_cloud_size, AppConfig::default().word_cloud_size);
        assert_eq!(config.estimate_default_pages, 300);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_default() {
        let path = temp_file("wrappedup_config_missing.toml");
        let _ = fs::remove_file(&path);
        assert_eq!(read_config_file(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn rejects_bad_values() {
        let path = temp_file("wrappedup_config_bad.toml");
        fs::write(&path, "word_cloud_size = \"lots\"\n").unwrap();
        assert!(matches!(read_config_file(&path), Err(ConfigError::Toml { .. })));

        let config = AppConfig {
            api_base_url: "books.example.com".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        let _ = fs::remove_file(path);
    }

    fn temp_file(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("{}_{}", name, std::process::id()));
        path
    }
}
