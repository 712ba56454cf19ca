// src/services/paginate.rs

//! Page-by-page traversal of one theatre's listing.

use std::collections::HashSet;
use std::time::Duration;

use scraper::Html;

use crate::error::Result;
use crate::fetch::Fetcher;
use crate::models::{ExtractionWarning, Show};
use crate::services::ShowExtractor;

/// Why a pagination run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStop {
    /// The source has no next-page selector
    SinglePage,
    /// The last page had no next link
    LastPage,
    /// The next link pointed at a page already fetched
    Revisit,
    /// The page bound was reached with a next link still present
    PageLimit,
}

impl PageStop {
    /// Whether the run stopped before the listing ran out of pages.
    pub fn is_truncated(self) -> bool {
        matches!(self, PageStop::Revisit | PageStop::PageLimit)
    }
}

/// Everything extracted from one source, in page then document order.
#[derive(Debug)]
pub struct PageRun {
    pub shows: Vec<Show>,
    pub warnings: Vec<ExtractionWarning>,
    /// URLs fetched, in order
    pub pages: Vec<String>,
    pub stop: PageStop,
}

/// Drives fetch and extraction across a source's listing pages.
pub struct PaginationDriver<'a> {
    extractor: &'a ShowExtractor<'a>,
    fetcher: &'a dyn Fetcher,
    max_pages: usize,
    delay: Duration,
}

impl<'a> PaginationDriver<'a> {
    pub fn new(extractor: &'a ShowExtractor<'a>, fetcher: &'a dyn Fetcher) -> Self {
        Self {
            extractor,
            fetcher,
            max_pages: usize::MAX,
            delay: Duration::ZERO,
        }
    }

    /// Upper bound on pages fetched in one run (at least one).
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Pause between consecutive page fetches.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fetch and extract until the listing runs out of pages.
    ///
    /// A fetch failure on any page fails the whole run; shows gathered from
    /// earlier pages are discarded.
    pub async fn run(&self) -> Result<PageRun> {
        let source = self.extractor.source();
        let mut shows = Vec::new();
        let mut warnings = Vec::new();
        let mut pages = Vec::new();
        let mut visited = HashSet::new();
        let mut url = source.url.clone();

        let stop = loop {
            if !pages.is_empty() && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let html = self.fetcher.fetch(&url).await?;
            visited.insert(url.clone());

            // Html is not Send; keep it out of scope across awaits.
            let next = {
                let document = Html::parse_document(&html);
                let page = self.extractor.extract(&document, &url);
                log::info!(
                    "{}: fetched {} ({} shows, {} warnings)",
                    source.name,
                    url,
                    page.shows.len(),
                    page.warnings.len()
                );
                shows.extend(page.shows);
                warnings.extend(page.warnings);
                self.extractor.next_page_url(&document, &url)
            };
            pages.push(std::mem::take(&mut url));

            if !source.is_paginated() {
                break PageStop::SinglePage;
            }
            let Some(next) = next else {
                break PageStop::LastPage;
            };
            if visited.contains(&next) {
                log::warn!(
                    "{}: next page {} was already fetched, stopping",
                    source.name,
                    next
                );
                break PageStop::Revisit;
            }
            if pages.len() >= self.max_pages {
                log::warn!(
                    "{}: stopping after {} pages, {} not fetched",
                    source.name,
                    pages.len(),
                    next
                );
                break PageStop::PageLimit;
            }
            url = next;
        };

        Ok(PageRun {
            shows,
            warnings,
            pages,
            stop,
        })
    }
}
