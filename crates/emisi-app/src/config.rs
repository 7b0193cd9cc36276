//! Configuration management for uji-emisi
//!
//! Config stored at: ~/.config/uji-emisi/config.json

use std::path::{Path, PathBuf};
use std::time::Duration;

use emisi_infra::HttpSettings;
use emisi_types::{ConfigError, OutputFormat, Result};
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Backend origin
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Vehicles fetched per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Operator id attached to submitted test results
    #[serde(default)]
    pub user_id: Option<i64>,

    /// Cookie header of a logged-in session, passed through as-is
    #[serde(default)]
    pub session_cookie: Option<String>,

    /// HTTP request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Default output format (json, table)
    #[serde(default)]
    pub output_format: OutputFormat,

    /// How long a notification stays visible
    #[serde(default = "default_toast_seconds")]
    pub toast_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_page_size() -> usize {
    10
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_toast_seconds() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
            user_id: None,
            session_cookie: None,
            timeout_secs: default_timeout_secs(),
            output_format: OutputFormat::default(),
            toast_seconds: default_toast_seconds(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("uji-emisi");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from the default location, or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
        Ok(config.sanitized())
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::SaveError(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveError(e.to_string()))?;
        Ok(())
    }

    /// Zero page size or timeout would stall the client; fall back to defaults
    fn sanitized(mut self) -> Self {
        if self.page_size == 0 {
            self.page_size = default_page_size();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        self
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            session_cookie: self.session_cookie.clone(),
        }
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_secs(self.toast_seconds)
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Uji Emisi Configuration")?;
        writeln!(f, "=======================")?;
        writeln!(f)?;
        writeln!(f, "Base URL:       {}", self.base_url)?;
        writeln!(f, "Page size:      {}", self.page_size)?;
        writeln!(
            f,
            "User id:        {}",
            self.user_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "(none)".to_string())
        )?;
        writeln!(
            f,
            "Session cookie: {}",
            if self.session_cookie.is_some() { "(set)" } else { "(none)" }
        )?;
        writeln!(f, "Timeout:        {}s", self.timeout_secs)?;
        writeln!(f, "Output format:  {}", self.output_format)?;
        writeln!(f, "Toast duration: {}s", self.toast_seconds)?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:    {}", path.display())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            base_url: "https://emisi.example.org".to_string(),
            user_id: Some(4),
            output_format: OutputFormat::Json,
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"page_size": 0, "user_id": 2}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.user_id, Some(2));
        assert_eq!(config.base_url, "http://localhost:5000");
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(
            err,
            emisi_types::Error::Config(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_http_settings() {
        let config = Config {
            timeout_secs: 3,
            session_cookie: Some("session=abc".to_string()),
            ..Default::default()
        };
        let settings = config.http_settings();
        assert_eq!(settings.timeout, Duration::from_secs(3));
        assert_eq!(settings.session_cookie.as_deref(), Some("session=abc"));
    }
}
