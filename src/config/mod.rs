use anyhow::Result;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub web: WebConfig,
    pub upstream: UpstreamConfig,
    pub ingestion: IngestionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

/// Where channel files are fetched from. Defaults point at the public
/// iptv-org style EPG repository on GitHub; tests point these at a local
/// stub server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub api_base: String,
    pub raw_base: String,
    pub repo: String,
    pub branch: String,
}

impl UpstreamConfig {
    /// Recursive git tree listing for the configured branch.
    pub fn tree_url(&self) -> String {
        format!(
            "{}/repos/{}/git/trees/{}?recursive=1",
            self.api_base, self.repo, self.branch
        )
    }

    /// Raw content URL for a repository path.
    pub fn raw_url(&self, path: &str) -> String {
        format!("{}/{}/{}/{}", self.raw_base, self.repo, self.branch, path)
    }

    /// Reject malformed base URLs at startup instead of at the first
    /// refresh.
    pub fn validate(&self) -> AppResult<()> {
        for (field, value) in [("api_base", &self.api_base), ("raw_base", &self.raw_base)] {
            Url::parse(value).map_err(|e| {
                AppError::configuration(format!("invalid upstream {field} '{value}': {e}"))
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    pub batch_size: usize,
    pub batch_pause_seconds: u64,
    pub request_timeout_seconds: u64,
    pub refresh_on_empty: bool,
    /// Cron expression for scheduled refreshes, `None` disables them.
    pub refresh_cron: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://./data/epg-channels.db".to_string(),
                max_connections: Some(10),
            },
            web: WebConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            upstream: UpstreamConfig {
                api_base: "https://api.github.com".to_string(),
                raw_base: "https://raw.githubusercontent.com".to_string(),
                repo: "dj1p/epg".to_string(),
                branch: "master".to_string(),
            },
            ingestion: IngestionConfig {
                batch_size: 5,
                batch_pause_seconds: 1,
                request_timeout_seconds: 30,
                refresh_on_empty: true,
                refresh_cron: Some("0 0 3 * * *".to_string()),
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from(&config_file)
    }

    pub fn load_from(config_file: &str) -> Result<Self> {
        if std::path::Path::new(config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::create_dir_all("./data")?;
            std::fs::write(config_file, contents)?;
            Ok(default_config)
        }
    }
}
