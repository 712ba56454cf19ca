// src/models/selectors.rs

//! CSS selectors describing how to read one theatre's listing page.

use serde::{Deserialize, Serialize};

/// Date conventions used by a theatre's listing text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateFormat {
    /// `14 September 2019`, `1 Dec - 5 Jan 2024`
    #[default]
    Default,
    /// Ranges joined with `-` or `&`, each half may carry a year
    Hippodrome,
    /// `10 March 2024`, `10 - 12 March 2024`
    Resortsworld,
    /// `2024-03-10` or two ISO dates
    Iso,
}

/// Extraction descriptor for a listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ShowSelectors {
    /// Element whose direct children are the individual listings
    pub container_selector: String,

    /// Link element within a listing
    pub link_selector: String,

    /// Image element within a listing
    pub image_selector: String,

    /// Title element within a listing
    pub title_selector: String,

    /// Date element within a listing
    pub date_selector: String,

    /// Whether extracted links and images are paths under the root URL
    #[serde(default)]
    pub link_relative: bool,

    /// "Next page" link; absent means the listing is a single page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_selector: Option<String>,

    /// HTML attribute holding the link URL (usually "href")
    #[serde(default = "default_link_attr")]
    pub link_attr: String,

    /// HTML attribute holding the image URL (usually "src")
    #[serde(default = "default_image_attr")]
    pub image_attr: String,

    #[serde(default)]
    pub date_format: DateFormat,
}

fn default_link_attr() -> String {
    "href".to_string()
}

fn default_image_attr() -> String {
    "src".to_string()
}

impl ShowSelectors {
    /// The next-page selector, treating a blank string as absent.
    pub fn next_selector(&self) -> Option<&str> {
        self.next_selector
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// All selector strings with their config key, for validation.
    pub fn all(&self) -> Vec<(&'static str, &str)> {
        let mut selectors = vec![
            ("container-selector", self.container_selector.as_str()),
            ("link-selector", self.link_selector.as_str()),
            ("image-selector", self.image_selector.as_str()),
            ("title-selector", self.title_selector.as_str()),
            ("date-selector", self.date_selector.as_str()),
        ];
        if let Some(next) = self.next_selector() {
            selectors.push(("next-selector", next));
        }
        selectors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectors(next: Option<&str>) -> ShowSelectors {
        ShowSelectors {
            container_selector: "ul".to_string(),
            link_selector: "a".to_string(),
            image_selector: "img".to_string(),
            title_selector: "h3".to_string(),
            date_selector: ".date".to_string(),
            link_relative: false,
            next_selector: next.map(str::to_string),
            link_attr: default_link_attr(),
            image_attr: default_image_attr(),
            date_format: DateFormat::Default,
        }
    }

    #[test]
    fn test_blank_next_selector_is_absent() {
        assert_eq!(selectors(None).next_selector(), None);
        assert_eq!(selectors(Some("  ")).next_selector(), None);
        assert_eq!(selectors(Some("a.next")).next_selector(), Some("a.next"));
    }

    #[test]
    fn test_all_includes_next_only_when_present() {
        assert_eq!(selectors(None).all().len(), 5);
        assert_eq!(selectors(Some("a.next")).all().len(), 6);
    }
}
