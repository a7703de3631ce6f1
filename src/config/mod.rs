//! Application configuration management

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::scrapers::Locale;
use crate::services::logging::LogFormat;
use crate::services::network::HttpConfig;
use crate::services::scanner::SettingsDir;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Locale sent to scrapers and used to partition the response cache
    pub locale: Locale,

    /// Movie root directories
    pub movie_directories: Vec<PathBuf>,

    /// Every movie in the configured directories lives in its own folder
    pub movie_separate_folders: bool,

    /// User agent sent with every request (MusicBrainz requires a contact)
    pub user_agent: Option<String>,

    /// Transport timeout for a single request
    pub http_timeout: Duration,

    /// Where export templates are installed
    pub export_templates_path: PathBuf,

    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let locale = env::var("SCRAPELINE_LOCALE")
            .unwrap_or_else(|_| "en-US".to_string())
            .parse::<Locale>()
            .context("Invalid SCRAPELINE_LOCALE")?;

        let movie_directories: Vec<PathBuf> = env::var_os("MOVIE_DIRECTORIES")
            .map(|dirs| env::split_paths(&dirs).filter(|p| !p.as_os_str().is_empty()).collect())
            .unwrap_or_default();

        Ok(Self {
            locale,

            movie_directories,

            movie_separate_folders: env::var("MOVIE_SEPARATE_FOLDERS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),

            user_agent: env::var("HTTP_USER_AGENT").ok(),

            http_timeout: Duration::from_secs(
                env::var("HTTP_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse::<u64>()
                    .context("Invalid HTTP_TIMEOUT_SECS")?,
            ),

            export_templates_path: env::var("EXPORT_TEMPLATES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data/export_themes")),

            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse::<LogFormat>()
                .context("Invalid LOG_FORMAT")?,
        })
    }

    /// Transport settings derived from this configuration
    pub fn http_config(&self) -> HttpConfig {
        let mut http = HttpConfig {
            timeout: self.http_timeout,
            ..HttpConfig::default()
        };
        if let Some(user_agent) = &self.user_agent {
            http.user_agent = user_agent.clone();
        }
        http
    }

    /// Movie directories as load queue entries
    pub fn movie_settings_dirs(&self) -> Vec<SettingsDir> {
        self.movie_directories
            .iter()
            .map(|path| SettingsDir::new(path).with_separate_folders(self.movie_separate_folders))
            .collect()
    }
}
