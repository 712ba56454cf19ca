//! Page fetch strategies.
//!
//! A theatre selects its fetch strategy by name. The [`FetcherRegistry`] maps
//! those names to shared [`Fetcher`] instances; it is built once at startup
//! and only read afterwards.

mod http;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

pub use http::HttpFetcher;

/// Retrieves the textual content addressed by a URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url`, failing on transport errors and non-success statuses.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Named lookup table of fetch strategies.
#[derive(Clone, Default)]
pub struct FetcherRegistry {
    fetchers: HashMap<String, Arc<dyn Fetcher>>,
}

impl FetcherRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in HTTP fetcher under `http` and `stdlib`.
    pub fn with_defaults(config: &CrawlerConfig) -> Result<Self> {
        let http: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(config)?);
        Ok(Self::new()
            .with("http", Arc::clone(&http))
            .with("stdlib", http))
    }

    /// Add or replace a named fetcher.
    pub fn with(mut self, name: impl Into<String>, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetchers.insert(name.into(), fetcher);
        self
    }

    /// Look up a fetcher by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Fetcher>> {
        self.fetchers
            .get(name)
            .cloned()
            .ok_or_else(|| {
                AppError::config(format!(
                    "no fetcher named {name} available (known: {})",
                    self.names().join(", ")
                ))
            })
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.fetchers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
