// src/fetch/http.rs

//! Plain HTTP fetch strategy.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;
use crate::fetch::Fetcher;
use crate::models::CrawlerConfig;
use crate::utils::http::{create_async_client, fetch_text};

/// Fetches server-rendered pages with a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher with the configured user agent and timeout.
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        log::debug!("fetching from url {}", url);
        fetch_text(&self.client, url).await
    }
}
