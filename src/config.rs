use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::series::LabelFormat;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_DAYS: u32 = 30;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub label_format: LabelFormat,
    pub default_days: u32,
    pub timeout_secs: u64,
}

/// On-disk shape of `config.json`; every key is optional.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_url: Option<String>,
    label_format: Option<String>,
    default_days: Option<u32>,
    timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            label_format: LabelFormat::default(),
            default_days: DEFAULT_DAYS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Defaults, then the config file, then `JOBPULSE_*` environment variables.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = Self::default_path() {
            if path.exists() {
                log::debug!("Reading config from {}", path.display());
                config.apply_file(&path)?;
            }
        }
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "jobpulse")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    fn apply_file(&mut self, path: &Path) -> Result<()> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let file: FileConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if let Some(url) = file.api_url {
            self.set_api_url(&url)?;
        }
        if let Some(pattern) = file.label_format {
            self.label_format = LabelFormat::new(&pattern)?;
        }
        if let Some(days) = file.default_days {
            self.default_days = days;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout_secs = secs;
        }
        Ok(())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("JOBPULSE_API_URL") {
            self.set_api_url(&url)?;
        }
        if let Some(pattern) = lookup("JOBPULSE_LABEL_FORMAT") {
            self.label_format = LabelFormat::new(&pattern)?;
        }
        if let Some(days) = lookup("JOBPULSE_DEFAULT_DAYS") {
            self.default_days = days
                .trim()
                .parse()
                .with_context(|| format!("JOBPULSE_DEFAULT_DAYS is not a number: {}", days))?;
        }
        Ok(())
    }

    pub fn set_api_url(&mut self, url: &str) -> Result<()> {
        let url = url.trim().trim_end_matches('/');
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(anyhow!("API URL must start with http:// or https://, got '{}'", url));
        }
        self.api_url = url.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.label_format.as_str(), "%b %-d");
        assert_eq!(config.default_days, 30);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("JOBPULSE_API_URL", "https://stats.example.com/"),
            ("JOBPULSE_LABEL_FORMAT", "%d.%m"),
            ("JOBPULSE_DEFAULT_DAYS", "90"),
        ]);
        let mut config = Config::default();
        config
            .apply_env(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.api_url, "https://stats.example.com");
        assert_eq!(config.label_format.as_str(), "%d.%m");
        assert_eq!(config.default_days, 90);
    }

    #[test]
    fn test_env_rejects_bad_days() {
        let mut config = Config::default();
        let result = config.apply_env(|key| {
            (key == "JOBPULSE_DEFAULT_DAYS").then(|| "thirty".to_string())
        });
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("JOBPULSE_DEFAULT_DAYS"));
    }

    #[test]
    fn test_config_file_layer() {
        let path = env::temp_dir().join(format!("jobpulse-config-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"api_url": "http://10.0.0.5:8080", "default_days": 7, "timeout_secs": 5}"#,
        )
        .unwrap();

        let mut config = Config::default();
        let result = config.apply_file(&path);
        std::fs::remove_file(&path).ok();

        result.unwrap();
        assert_eq!(config.api_url, "http://10.0.0.5:8080");
        assert_eq!(config.default_days, 7);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.label_format, LabelFormat::default());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let mut config = Config::default();
        assert!(config.set_api_url("localhost:8080").is_err());
    }
}
