use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::paging;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: io::Error,
    },

    #[error("error reading toml: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub paging: PagingConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
        let config_str = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io { path: path.to_owned(), source: e })?;
        AppConfig::parse(&config_str)
    }

    pub fn parse(config_str: &str) -> Result<AppConfig, ConfigError> {
        let app: AppConfig = toml::from_str(config_str)?;
        if app.paging.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "paging.page_size",
                message: "must be at least 1".into(),
            });
        }
        Ok(app)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct DatabaseConfig {
    pub read_url: Option<String>,
    pub write_url: String,
}

impl DatabaseConfig {
    pub fn read_url(&self) -> &str
    {
        if let Some(ref url) = self.read_url {
            return url;
        }
        &self.write_url
    }

    pub fn write_url(&self) -> &str
    {
        &self.write_url
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub idle_timeout_minutes: u64,
    pub cookie_name: String,
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_minutes * 60)
    }
}

impl Default for SessionConfig {
    fn default() -> SessionConfig {
        SessionConfig {
            idle_timeout_minutes: 30,
            cookie_name: "songbook_session".into(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PagingConfig {
    pub page_size: usize,
}

impl Default for PagingConfig {
    fn default() -> PagingConfig {
        PagingConfig { page_size: paging::DEFAULT_PAGE_SIZE }
    }
}
