// src/services/months.rs

//! Month aggregation over show date ranges.

use std::collections::HashSet;

use crate::models::{CalendarPeriod, DateRange};

/// Distinct periods containing the start or end date of any range.
///
/// A range whose start and end share a month contributes one period.
/// Months strictly between start and end are not included.
pub fn distinct_periods<I>(ranges: I) -> HashSet<CalendarPeriod>
where
    I: IntoIterator<Item = DateRange>,
{
    let mut periods = HashSet::new();
    for range in ranges {
        periods.insert(CalendarPeriod::of(range.start));
        periods.insert(CalendarPeriod::of(range.end));
    }
    periods
}

/// [`distinct_periods`], in chronological order.
pub fn sorted_periods<I>(ranges: I) -> Vec<CalendarPeriod>
where
    I: IntoIterator<Item = DateRange>,
{
    let mut periods: Vec<_> = distinct_periods(ranges).into_iter().collect();
    periods.sort_unstable();
    periods
}
