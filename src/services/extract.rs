// src/services/extract.rs

//! Show extraction from a single listing page.
//!
//! Each direct child of the container element is one listing. A listing with
//! a missing or unreadable field is dropped with a warning; the rest of the
//! page is still extracted.

use chrono::{Datelike, Local};
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{ExtractionWarning, Show, ShowCandidate, TheatreSource, WarningReason};
use crate::services::DateParser;
use crate::utils::normalize_whitespace;

/// Shows and warnings from one page, in document order.
#[derive(Debug, Default)]
pub struct PageExtraction {
    pub shows: Vec<Show>,
    pub warnings: Vec<ExtractionWarning>,
}

impl PageExtraction {
    /// Number of listings examined.
    pub fn attempted(&self) -> usize {
        self.shows.len() + self.warnings.len()
    }
}

struct CompiledSelectors {
    container: Selector,
    link: Selector,
    image: Selector,
    title: Selector,
    date: Selector,
    next: Option<Selector>,
}

/// Extracts shows from a theatre's listing pages using its configured selectors.
pub struct ShowExtractor<'a> {
    source: &'a TheatreSource,
    selectors: CompiledSelectors,
    date_parser: &'static dyn DateParser,
    current_year: i32,
}

impl<'a> ShowExtractor<'a> {
    /// Compile the source's selectors.
    pub fn new(source: &'a TheatreSource) -> Result<Self> {
        let s = &source.selectors;
        let selectors = CompiledSelectors {
            container: parse_selector(&s.container_selector)?,
            link: parse_selector(&s.link_selector)?,
            image: parse_selector(&s.image_selector)?,
            title: parse_selector(&s.title_selector)?,
            date: parse_selector(&s.date_selector)?,
            next: s.next_selector().map(parse_selector).transpose()?,
        };

        Ok(Self {
            source,
            selectors,
            date_parser: s.date_format.parser(),
            current_year: Local::now().year(),
        })
    }

    /// Year assumed for dates printed without one.
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    pub fn source(&self) -> &TheatreSource {
        self.source
    }

    /// Extract every listing under the container of `document`.
    ///
    /// A page without the container yields nothing.
    pub fn extract(&self, document: &Html, page_url: &str) -> PageExtraction {
        let mut page = PageExtraction::default();

        let Some(container) = document.select(&self.selectors.container).next() else {
            log::debug!(
                "{}: no container '{}' on {}",
                self.source.name,
                self.source.selectors.container_selector,
                page_url
            );
            return page;
        };

        for (index, item) in container.children().filter_map(ElementRef::wrap).enumerate() {
            match self.extract_item(item, page_url) {
                Ok(show) => page.shows.push(show),
                Err(reason) => {
                    let warning = ExtractionWarning {
                        theatre: self.source.name.clone(),
                        page_url: page_url.to_string(),
                        index,
                        reason,
                    };
                    log::debug!("parsing error: {}", warning);
                    page.warnings.push(warning);
                }
            }
        }

        page
    }

    /// Absolute URL of the next listing page, if the source paginates and
    /// the page links onwards.
    pub fn next_page_url(&self, document: &Html, page_url: &str) -> Option<String> {
        let selector = self.selectors.next.as_ref()?;
        let href = document
            .select(selector)
            .find_map(|link| link.value().attr("href"))?
            .trim();
        if href.is_empty() || href == "#" {
            return None;
        }
        Some(self.source.resolve_link(page_url, href))
    }

    fn extract_item(&self, item: ElementRef, page_url: &str) -> std::result::Result<Show, WarningReason> {
        let s = &self.source.selectors;
        let mut candidate = ShowCandidate::for_theatre(&self.source.name);

        candidate.link_url = first_attr(item, &self.selectors.link, &s.link_attr)
            .map(|href| self.source.resolve_link(page_url, href));
        candidate.image_url = first_attr(item, &self.selectors.image, &s.image_attr)
            .map(|src| self.source.resolve_link(page_url, src));
        candidate.name = first_text(item, &self.selectors.title);
        candidate.check_required()?;

        let date_text = first_text(item, &self.selectors.date).ok_or(WarningReason::MissingDate)?;
        let range = self
            .date_parser
            .parse(&date_text, self.current_year)
            .map_err(|e| WarningReason::InvalidDate {
                text: date_text.clone(),
                message: match e {
                    AppError::DateParse { message, .. } => message,
                    other => other.to_string(),
                },
            })?;
        candidate.set_dates(range);

        candidate.into_show()
    }
}

fn first_attr<'b>(item: ElementRef<'b>, selector: &Selector, attr: &str) -> Option<&'b str> {
    item.select(selector)
        .next()?
        .value()
        .attr(attr)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn first_text(item: ElementRef, selector: &Selector) -> Option<String> {
    let element = item.select(selector).next()?;
    let text = normalize_whitespace(&element.text().collect::<String>());
    (!text.is_empty()).then_some(text)
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
