// src/services/dates.rs

//! Theatre-specific date text parsers.
//!
//! Listing pages print run dates in free text (`14 September 2019`,
//! `Tue 5 Mar - Sat 9 Mar`, `10 - 12 March 2024`). Each [`DateFormat`] maps to
//! a parser that turns such text into a [`DateRange`]. A single date yields a
//! range whose start equals its end.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::{DateFormat, DateRange};

/// Parses listing date text into a run of days.
pub trait DateParser: Send + Sync {
    /// Parse `text`, assuming `current_year` wherever the text omits a year.
    fn parse(&self, text: &str, current_year: i32) -> Result<DateRange>;
}

impl DateFormat {
    /// The parser implementing this convention.
    pub fn parser(self) -> &'static dyn DateParser {
        match self {
            DateFormat::Default => &DefaultDateParser,
            DateFormat::Hippodrome => &HippodromeDateParser,
            DateFormat::Resortsworld => &ResortsworldDateParser,
            DateFormat::Iso => &IsoDateParser,
        }
    }
}

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

static SINGLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<day>\d+)\w*\s*(?P<month>[a-z]+)\.?\s*(?P<year>\d{4})?")
        .expect("single date pattern is valid")
});

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b20\d{2}\b").expect("year pattern is valid"));

static RW_SINGLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<day>\d+)\s+(?P<month>[a-z]+)\s+(?P<year>20\d{2})")
        .expect("resortsworld single pattern is valid")
});

static RW_JOINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<start_day>\d+)\s*(?P<start_month>[a-z]+)?\s*-\s*(?P<end_day>\d+)\s+(?P<end_month>[a-z]+)\s+(?P<year>20\d{2})",
    )
    .expect("resortsworld range pattern is valid")
});

static ISO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("iso pattern is valid"));

/// `14 September 2019`, `14th sep`, `1 Dec - 5 Jan 2024`.
///
/// A range takes its year from the first `20xx` anywhere in the text.
pub struct DefaultDateParser;

impl DateParser for DefaultDateParser {
    fn parse(&self, text: &str, current_year: i32) -> Result<DateRange> {
        let text = normalize(text);
        match split_range(&text, &['-']) {
            Some((first, second)) => {
                let year = find_year(&text).unwrap_or(current_year);
                let start = parse_single(first, Some(year), current_year)?;
                let end = parse_single(second, Some(year), current_year)?;
                order_range(&text, start, end)
            }
            None => parse_single(&text, None, current_year).map(DateRange::single),
        }
    }
}

/// Like the default, but ranges may be joined with `&` and each half may
/// carry its own year.
pub struct HippodromeDateParser;

impl DateParser for HippodromeDateParser {
    fn parse(&self, text: &str, current_year: i32) -> Result<DateRange> {
        let text = normalize(text);
        match split_range(&text, &['-', '&']) {
            Some((first, second)) => {
                let end_year = find_year(second);
                let start_year = find_year(first).or(end_year).unwrap_or(current_year);
                let end_year = end_year.unwrap_or(start_year);

                let start = parse_single(first, Some(start_year), current_year)?;
                let end = parse_single(second, Some(end_year), current_year)?;
                order_range(&text, start, end)
            }
            None => parse_single(&text, None, current_year).map(DateRange::single),
        }
    }
}

/// `15 June 2024`, `10 - 12 March 2024`, `28 March - 2 April 2024`.
pub struct ResortsworldDateParser;

impl DateParser for ResortsworldDateParser {
    fn parse(&self, text: &str, _current_year: i32) -> Result<DateRange> {
        let normalized = normalize(text);

        if let Some(caps) = RW_SINGLE_RE.captures(&normalized) {
            let year = parse_number(&normalized, &caps["year"])?;
            let month = month_number(&normalized, &caps["month"])?;
            let day = parse_number(&normalized, &caps["day"])?;
            return make_date(&normalized, year, month, day).map(DateRange::single);
        }

        if let Some(caps) = RW_JOINT_RE.captures(&normalized) {
            let year = parse_number(&normalized, &caps["year"])?;
            let end_month = month_number(&normalized, &caps["end_month"])?;
            let start_month = match caps.name("start_month") {
                Some(m) => month_number(&normalized, m.as_str())?,
                None => end_month,
            };
            let start_day = parse_number(&normalized, &caps["start_day"])?;
            let end_day = parse_number(&normalized, &caps["end_day"])?;

            let start = make_date(&normalized, year, start_month, start_day)?;
            let end = make_date(&normalized, year, end_month, end_day)?;
            return Ok(DateRange::new(start, end));
        }

        Err(AppError::date_parse(text.trim(), "no recognised date"))
    }
}

/// One or two `YYYY-MM-DD` dates.
pub struct IsoDateParser;

impl DateParser for IsoDateParser {
    fn parse(&self, text: &str, _current_year: i32) -> Result<DateRange> {
        let dates = ISO_RE
            .find_iter(text)
            .map(|m| {
                NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d")
                    .map_err(|e| AppError::date_parse(text.trim(), e))
            })
            .collect::<Result<Vec<_>>>()?;

        match dates.as_slice() {
            [day] => Ok(DateRange::single(*day)),
            [start, end] if start <= end => Ok(DateRange::new(*start, *end)),
            [_, _] => Err(AppError::date_parse(text.trim(), "range ends before it starts")),
            [] => Err(AppError::date_parse(text.trim(), "no ISO date found")),
            _ => Err(AppError::date_parse(text.trim(), "more than two dates")),
        }
    }
}

fn normalize(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .replace(['\u{2013}', '\u{2014}'], "-")
}

/// Split on the first separator present, keeping the first two parts.
fn split_range<'a>(text: &'a str, separators: &[char]) -> Option<(&'a str, &'a str)> {
    let separator = separators.iter().find(|s| text.contains(**s))?;
    let mut parts = text.split(*separator);
    Some((parts.next()?, parts.next()?))
}

fn find_year(text: &str) -> Option<i32> {
    YEAR_RE.find(text).and_then(|m| m.as_str().parse().ok())
}

/// `year` overrides any year written in `text`.
fn parse_single(text: &str, year: Option<i32>, current_year: i32) -> Result<NaiveDate> {
    let caps = SINGLE_RE
        .captures(text)
        .ok_or_else(|| AppError::date_parse(text.trim(), "no day and month found"))?;

    let day = parse_number(text, &caps["day"])?;
    let month = month_number(text, &caps["month"])?;
    let year = match (year, caps.name("year")) {
        (Some(year), _) => year,
        (None, Some(written)) => parse_number(text, written.as_str())?,
        (None, None) => current_year,
    };

    make_date(text, year, month, day)
}

fn month_number(text: &str, name: &str) -> Result<u32> {
    let name = name.to_lowercase();
    if name == "sept" {
        return Ok(9);
    }
    MONTHS
        .iter()
        .position(|m| *m == name || (name.len() == 3 && m.starts_with(name.as_str())))
        .map(|i| i as u32 + 1)
        .ok_or_else(|| AppError::date_parse(text.trim(), format!("unknown month '{name}'")))
}

fn parse_number<T: std::str::FromStr>(text: &str, digits: &str) -> Result<T> {
    digits
        .parse()
        .map_err(|_| AppError::date_parse(text.trim(), format!("bad number '{digits}'")))
}

fn make_date(text: &str, year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| AppError::date_parse(text.trim(), "day out of range for month"))
}

/// A range printed without years that wraps past December started last year.
fn order_range(text: &str, start: NaiveDate, end: NaiveDate) -> Result<DateRange> {
    if start <= end {
        return Ok(DateRange::new(start, end));
    }
    match start.with_year(start.year() - 1) {
        Some(start) if start <= end => Ok(DateRange::new(start, end)),
        _ => Err(AppError::date_parse(text.trim(), "range ends before it starts")),
    }
}
