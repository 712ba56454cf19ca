//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::TheatreSource;
use crate::utils::url;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Show storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Theatre listing sources
    #[serde(default, rename = "theatre")]
    pub theatres: Vec<TheatreSource>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, falling back to the default only when the file
    /// does not exist. A file that cannot be read or parsed is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match Self::load(path) {
            Err(AppError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("No config at {:?}. Using defaults.", path);
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Theatres that take part in ingestion.
    pub fn active_theatres(&self) -> impl Iterator<Item = &TheatreSource> {
        self.theatres.iter().filter(|t| t.active)
    }

    /// Look up a theatre by name.
    pub fn theatre(&self, name: &str) -> Option<&TheatreSource> {
        self.theatres.iter().find(|t| t.name == name)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.crawler.max_pages == 0 {
            return Err(AppError::validation("crawler.max_pages must be > 0"));
        }
        if self.storage.file.trim().is_empty() {
            return Err(AppError::validation("storage.file is empty"));
        }
        if self.theatres.is_empty() {
            return Err(AppError::validation("No theatres defined"));
        }

        let mut names = HashSet::new();
        for theatre in &self.theatres {
            if theatre.name.trim().is_empty() {
                return Err(AppError::validation("theatre with empty name"));
            }
            if !names.insert(theatre.name.as_str()) {
                return Err(AppError::validation(format!(
                    "duplicate theatre name '{}'",
                    theatre.name
                )));
            }
            Self::validate_theatre(theatre)?;
        }
        Ok(())
    }

    fn validate_theatre(theatre: &TheatreSource) -> Result<()> {
        for (key, value) in [("url", &theatre.url), ("root-url", &theatre.root_url)] {
            url::validate(value).map_err(|e| {
                AppError::validation(format!("{}: invalid {} '{}': {}", theatre.name, key, value, e))
            })?;
        }

        for (key, selector) in theatre.selectors.all() {
            Selector::parse(selector).map_err(|e| {
                AppError::validation(format!(
                    "{}: invalid {} '{}': {:?}",
                    theatre.name, key, selector, e
                ))
            })?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            storage: StorageConfig::default(),
            theatres: defaults::default_theatres(),
        }
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between page fetches of one theatre in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum theatres ingested concurrently
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Upper bound on listing pages fetched per theatre
    #[serde(default = "defaults::max_pages")]
    pub max_pages: usize,
}

impl CrawlerConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
            max_pages: defaults::max_pages(),
        }
    }
}

/// What the ingestion run does after a non-conflict storage failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FatalPolicy {
    /// Stop writing and report the failure
    #[default]
    Abort,
    /// Record the failure and keep writing
    Continue,
}

/// Show storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Show file name, relative to the storage directory
    #[serde(default = "defaults::storage_file")]
    pub file: String,

    #[serde(default)]
    pub on_fatal: FatalPolicy,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            file: defaults::storage_file(),
            on_fatal: FatalPolicy::default(),
        }
    }
}

mod defaults {
    use crate::models::{DateFormat, ShowSelectors, TheatreSource};

    // Crawler defaults
    pub fn user_agent() -> String {
        "whatson/0.1.0".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        0
    }
    pub fn max_concurrent() -> usize {
        4
    }
    pub fn max_pages() -> usize {
        50
    }

    // Storage defaults
    pub fn storage_file() -> String {
        "shows.json".into()
    }

    // Theatre defaults
    pub fn default_theatres() -> Vec<TheatreSource> {
        vec![TheatreSource {
            name: "albany".to_string(),
            active: true,
            root_url: "https://albanytheatre.co.uk/".to_string(),
            url: "https://albanytheatre.co.uk/whats-on/".to_string(),
            fetcher: "http".to_string(),
            selectors: ShowSelectors {
                container_selector: "div.query_block_content".to_string(),
                link_selector: "h4 > a".to_string(),
                image_selector: "img".to_string(),
                title_selector: "h4 > a".to_string(),
                date_selector: ".show-date".to_string(),
                link_relative: true,
                next_selector: None,
                link_attr: "href".to_string(),
                image_attr: "src".to_string(),
                date_format: DateFormat::Default,
            },
        }]
    }
}
