// src/models/theatre.rs

//! Theatre listing source definitions.

use serde::{Deserialize, Serialize};

use crate::models::ShowSelectors;
use crate::utils::url::{join_root, resolve};

/// One configured theatre listing site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TheatreSource {
    /// Theatre identifier, also stored on every show
    pub name: String,

    /// Inactive theatres are skipped during ingestion
    #[serde(default = "default_active")]
    pub active: bool,

    /// Base URL that relative links are appended to
    pub root_url: String,

    /// First listing page
    pub url: String,

    /// Name of the fetch strategy in the fetcher registry
    #[serde(default = "default_fetcher")]
    pub fetcher: String,

    #[serde(flatten)]
    pub selectors: ShowSelectors,
}

fn default_active() -> bool {
    true
}

fn default_fetcher() -> String {
    "http".to_string()
}

impl TheatreSource {
    /// Whether the listing spans more than one page.
    pub fn is_paginated(&self) -> bool {
        self.selectors.next_selector().is_some()
    }

    /// Turn an extracted link into an absolute URL.
    ///
    /// Relative sources concatenate the root URL with the path; otherwise the
    /// link is resolved against the page it was found on. Query-only and
    /// fragment-only links always resolve against the page, since they keep
    /// its path.
    pub fn resolve_link(&self, page_url: &str, link: &str) -> String {
        let link = link.trim();
        if self.selectors.link_relative && !link.starts_with(['?', '#']) {
            join_root(&self.root_url, link)
        } else {
            resolve(page_url, link).unwrap_or_else(|| link.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALBANY: &str = r#"
name = "albany"
root-url = "https://albanytheatre.co.uk/"
url = "https://albanytheatre.co.uk/whats-on/"
container-selector = "div.query_block_content"
link-selector = "h4 > a"
image-selector = "img"
title-selector = "h4 > a"
date-selector = ".show-date"
link-relative = true
"#;

    #[test]
    fn test_deserialize_with_defaults() {
        let source: TheatreSource = toml::from_str(ALBANY).unwrap();
        assert_eq!(source.name, "albany");
        assert!(source.active);
        assert_eq!(source.fetcher, "http");
        assert_eq!(source.selectors.container_selector, "div.query_block_content");
        assert_eq!(source.selectors.link_attr, "href");
        assert_eq!(source.selectors.image_attr, "src");
        assert!(!source.is_paginated());
    }

    #[test]
    fn test_resolve_relative_link() {
        let source: TheatreSource = toml::from_str(ALBANY).unwrap();
        assert_eq!(
            source.resolve_link(&source.url, "/shows/panto"),
            "https://albanytheatre.co.uk/shows/panto"
        );
    }

    #[test]
    fn test_relative_source_keeps_page_path_for_query_links() {
        let source: TheatreSource = toml::from_str(ALBANY).unwrap();
        assert_eq!(
            source.resolve_link(&source.url, "?page=2"),
            "https://albanytheatre.co.uk/whats-on/?page=2"
        );
        assert_eq!(
            source.resolve_link("https://albanytheatre.co.uk/whats-on/?page=2", "?page=3"),
            "https://albanytheatre.co.uk/whats-on/?page=3"
        );
    }

    #[test]
    fn test_resolve_absolute_source_link() {
        let mut source: TheatreSource = toml::from_str(ALBANY).unwrap();
        source.selectors.link_relative = false;
        assert_eq!(
            source.resolve_link("https://other.org/list/", "https://cdn.org/a.jpg"),
            "https://cdn.org/a.jpg"
        );
        assert_eq!(
            source.resolve_link("https://other.org/list/", "?page=2"),
            "https://other.org/list/?page=2"
        );
    }
}
