//! Calendar month buckets.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A (month, year) pair.
///
/// Identity is purely by value. Ordering is chronological (year, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CalendarPeriod {
    // Field order drives the derived chronological ordering.
    pub year: i32,
    pub month: u32,
}

impl CalendarPeriod {
    pub fn new(month: u32, year: i32) -> Self {
        Self { year, month }
    }

    /// The period a date falls within.
    pub fn of(date: NaiveDate) -> Self {
        Self::new(date.month(), date.year())
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1).and_then(|d| d.pred_opt())
    }
}

impl fmt::Display for CalendarPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl FromStr for CalendarPeriod {
    type Err = AppError;

    /// Parse `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| AppError::validation("Invalid month format. Use YYYY-MM (e.g., 2025-01)"))?;
        let year: i32 = year
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid year '{year}'")))?;
        let month: u32 = month
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid month '{month}'")))?;
        if !(1..=12).contains(&month) {
            return Err(AppError::validation(format!("Invalid month '{month}'")));
        }
        Ok(Self::new(month, year))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_date() {
        let date = NaiveDate::from_ymd_opt(2023, 2, 3).unwrap();
        assert_eq!(CalendarPeriod::of(date), CalendarPeriod::new(2, 2023));
    }

    #[test]
    fn test_ordering_is_chronological() {
        let mut periods = vec![
            CalendarPeriod::new(1, 2024),
            CalendarPeriod::new(12, 2023),
            CalendarPeriod::new(3, 2023),
        ];
        periods.sort();
        assert_eq!(
            periods,
            vec![
                CalendarPeriod::new(3, 2023),
                CalendarPeriod::new(12, 2023),
                CalendarPeriod::new(1, 2024),
            ]
        );
    }

    #[test]
    fn test_month_bounds() {
        let feb = CalendarPeriod::new(2, 2024);
        assert_eq!(feb.first_day(), NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29));

        let dec = CalendarPeriod::new(12, 2023);
        assert_eq!(dec.last_day(), NaiveDate::from_ymd_opt(2023, 12, 31));
    }

    #[test]
    fn test_parse_and_display() {
        let period: CalendarPeriod = "2023-03".parse().unwrap();
        assert_eq!(period, CalendarPeriod::new(3, 2023));
        assert_eq!(period.to_string(), "2023-03");

        assert!("2023".parse::<CalendarPeriod>().is_err());
        assert!("2023-13".parse::<CalendarPeriod>().is_err());
        assert!("year-01".parse::<CalendarPeriod>().is_err());
    }
}
