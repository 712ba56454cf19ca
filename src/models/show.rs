//! Show data structures.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::{CalendarPeriod, WarningReason};

/// Inclusive span of days a show runs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A one-day run.
    pub fn single(day: NaiveDate) -> Self {
        Self::new(day, day)
    }

    /// Whether any day of the range falls within the month.
    pub fn overlaps(&self, period: CalendarPeriod) -> bool {
        match (period.first_day(), period.last_day()) {
            (Some(first), Some(last)) => self.start <= last && self.end >= first,
            _ => false,
        }
    }
}

/// A show as extracted from a listing page, before required-field checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowCandidate {
    pub name: Option<String>,
    pub theatre: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ShowCandidate {
    /// Start a candidate for the given theatre.
    pub fn for_theatre(theatre: impl Into<String>) -> Self {
        Self {
            theatre: Some(theatre.into()),
            ..Self::default()
        }
    }

    pub fn set_dates(&mut self, range: DateRange) {
        self.start_date = Some(range.start);
        self.end_date = Some(range.end);
    }

    /// First missing field among link, image and title.
    pub fn check_required(&self) -> Result<(), WarningReason> {
        if self.link_url.is_none() {
            return Err(WarningReason::MissingLink);
        }
        if self.image_url.is_none() {
            return Err(WarningReason::MissingImage);
        }
        if self.name.is_none() {
            return Err(WarningReason::MissingTitle);
        }
        Ok(())
    }

    /// Promote to a complete show, or name the first missing field.
    pub fn into_show(self) -> Result<Show, WarningReason> {
        self.check_required()?;
        let (Some(start_date), Some(end_date)) = (self.start_date, self.end_date) else {
            return Err(WarningReason::MissingDate);
        };

        Ok(Show {
            theatre: self.theatre.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            image_url: self.image_url.unwrap_or_default(),
            link_url: self.link_url.unwrap_or_default(),
            start_date,
            end_date,
        })
    }
}

/// A complete show record with absolute URLs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Show {
    /// Theatre identifier
    pub theatre: String,

    /// Display name
    pub name: String,

    /// Absolute image URL
    pub image_url: String,

    /// Absolute link to the show page
    pub link_url: String,

    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Show {
    /// Stable identifier derived from the natural key (theatre + link URL).
    pub fn canonical_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.theatre.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.link_url.as_bytes());
        hex::encode(&hasher.finalize()[..12])
    }

    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    /// Format show for display using a template.
    ///
    /// Supported placeholders: `{theatre}`, `{name}`, `{start}`, `{end}`, `{link}`
    pub fn format(&self, template: &str) -> String {
        template
            .replace("{theatre}", &self.theatre)
            .replace("{name}", &self.name)
            .replace("{start}", &self.start_date.to_string())
            .replace("{end}", &self.end_date.to_string())
            .replace("{link}", &self.link_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn complete_candidate() -> ShowCandidate {
        let mut candidate = ShowCandidate::for_theatre("albany");
        candidate.name = Some("Cinderella".to_string());
        candidate.link_url = Some("https://example.com/cinderella".to_string());
        candidate.image_url = Some("https://example.com/cinderella.jpg".to_string());
        candidate.set_dates(DateRange::new(day(2023, 12, 1), day(2024, 1, 5)));
        candidate
    }

    #[test]
    fn test_into_show_complete() {
        let show = complete_candidate().into_show().unwrap();
        assert_eq!(show.theatre, "albany");
        assert_eq!(show.start_date, day(2023, 12, 1));
        assert_eq!(show.end_date, day(2024, 1, 5));
    }

    #[test]
    fn test_into_show_reports_first_missing_field() {
        let mut candidate = complete_candidate();
        candidate.link_url = None;
        candidate.image_url = None;
        assert_eq!(candidate.into_show(), Err(WarningReason::MissingLink));

        let mut candidate = complete_candidate();
        candidate.image_url = None;
        assert_eq!(candidate.into_show(), Err(WarningReason::MissingImage));

        let mut candidate = complete_candidate();
        candidate.end_date = None;
        assert_eq!(candidate.into_show(), Err(WarningReason::MissingDate));
    }

    #[test]
    fn test_canonical_id_uses_natural_key() {
        let a = complete_candidate().into_show().unwrap();
        let mut b = a.clone();
        b.name = "Cinderella (relaxed performance)".to_string();
        assert_eq!(a.canonical_id(), b.canonical_id());

        b.link_url.push_str("-relaxed");
        assert_ne!(a.canonical_id(), b.canonical_id());
        assert_eq!(a.canonical_id().len(), 24);
    }

    #[test]
    fn test_overlaps_period() {
        let range = DateRange::new(day(2023, 1, 15), day(2023, 3, 2));
        assert!(range.overlaps(CalendarPeriod::new(1, 2023)));
        assert!(range.overlaps(CalendarPeriod::new(2, 2023)));
        assert!(range.overlaps(CalendarPeriod::new(3, 2023)));
        assert!(!range.overlaps(CalendarPeriod::new(4, 2023)));
        assert!(!range.overlaps(CalendarPeriod::new(12, 2022)));
    }

    #[test]
    fn test_format() {
        let show = complete_candidate().into_show().unwrap();
        assert_eq!(
            show.format("[{theatre}] {name} {start}..{end}"),
            "[albany] Cinderella 2023-12-01..2024-01-05"
        );
    }
}
