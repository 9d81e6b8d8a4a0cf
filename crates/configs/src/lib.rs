use std::time::Duration;

use anyhow::{anyhow, Result};
use common::types::LogFormat;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub apper: ApperConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection settings for the hosted record backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ApperConfig {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub public_key: String,
    /// Empty until set by the file or `APPER_BASE_URL`; see [`ApperConfig::normalize_from_env`].
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ApperConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            public_key: String::new(),
            base_url: String::new(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

fn default_base_url() -> String {
    "https://api.apper.io".to_string()
}
fn default_connect_timeout() -> u64 {
    5
}
fn default_request_timeout() -> u64 {
    30
}

/// Load from `CONFIG_PATH` (default `config.toml`); a missing file yields defaults.
pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if std::fs::metadata(&path).is_err() {
        return Ok(AppConfig::default());
    }
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.apper.normalize_from_env(|key| std::env::var(key).ok());
        self.apper.validate()?;
        Ok(())
    }
}

impl ApperConfig {
    /// Fill empty values from `APPER_PROJECT_ID`, `APPER_PUBLIC_KEY` and `APPER_BASE_URL`.
    /// Values set in the file win; an unset base URL falls back to the hosted default.
    pub fn normalize_from_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.project_id.trim().is_empty() {
            if let Some(v) = lookup("APPER_PROJECT_ID") {
                self.project_id = v;
            }
        }
        if self.public_key.trim().is_empty() {
            if let Some(v) = lookup("APPER_PUBLIC_KEY") {
                self.public_key = v;
            }
        }
        if self.base_url.trim().is_empty() {
            self.base_url = lookup("APPER_BASE_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(default_base_url);
        }
        self.base_url = self.base_url.trim_end_matches('/').to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if self.project_id.trim().is_empty() {
            return Err(anyhow!("apper.project_id is empty; set it in config.toml or APPER_PROJECT_ID"));
        }
        if self.public_key.trim().is_empty() {
            return Err(anyhow!("apper.public_key is empty; set it in config.toml or APPER_PUBLIC_KEY"));
        }
        let lower = self.base_url.to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("apper.base_url must start with http:// or https://"));
        }
        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(anyhow!("apper timeouts must be positive seconds"));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
