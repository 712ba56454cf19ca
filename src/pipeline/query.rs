// src/pipeline/query.rs

//! Read-side queries over stored shows.

use crate::error::Result;
use crate::models::{CalendarPeriod, Show};
use crate::services::sorted_periods;
use crate::storage::ShowStorage;

/// Months that some stored show starts or ends in, oldest first.
pub async fn available_months(storage: &dyn ShowStorage) -> Result<Vec<CalendarPeriod>> {
    let ranges = storage.date_ranges().await?;
    Ok(sorted_periods(ranges))
}

/// Shows running during the month.
pub async fn shows_for_month(
    storage: &dyn ShowStorage,
    period: CalendarPeriod,
) -> Result<Vec<Show>> {
    storage.shows_in_period(period).await
}
