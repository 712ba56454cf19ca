//! Storage abstractions for show persistence.
//!
//! Shows are keyed by their natural key (theatre + link URL, see
//! [`Show::canonical_id`]). A theatre may list each title only once: a show
//! whose title is already stored for the theatre under another link is a
//! [`AppError::StorageConflict`].
//!
//! ## Backends
//!
//! - [`MemoryStorage`]: process-local, used for dry runs and tests
//! - [`LocalStorage`]: a single JSON document on disk
//!
//! ```text
//! storage/
//! ├── config.toml           # Theatre configuration
//! └── shows.json            # { updated_at, count, shows }
//! ```

pub mod local;
pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{CalendarPeriod, DateRange, Show};

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStorage;

/// What an upsert did to the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// On-disk document holding every stored show.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowsData {
    /// ISO 8601 timestamp of last write
    pub updated_at: DateTime<Utc>,
    /// Total show count
    pub count: usize,
    /// The shows array
    pub shows: Vec<Show>,
}

impl ShowsData {
    pub fn new(shows: Vec<Show>) -> Self {
        Self {
            updated_at: Utc::now(),
            count: shows.len(),
            shows,
        }
    }
}

/// Trait for show storage backends.
///
/// Implementations must be safe to share between concurrently running
/// ingestion tasks.
#[async_trait]
pub trait ShowStorage: Send + Sync {
    /// Insert or replace a show by its natural key.
    ///
    /// Fails with [`AppError::StorageConflict`] on a uniqueness violation;
    /// any other error is a systemic storage failure.
    async fn upsert(&self, show: &Show) -> Result<UpsertOutcome>;

    /// Date range of every stored show.
    async fn date_ranges(&self) -> Result<Vec<DateRange>>;

    /// Shows running at any point during the month, by start date then name.
    async fn shows_in_period(&self, period: CalendarPeriod) -> Result<Vec<Show>>;

    /// Number of stored shows.
    async fn count(&self) -> Result<usize>;

    /// Persist pending writes.
    async fn flush(&self) -> Result<()>;
}

/// Indexed in-memory show table shared by the storage backends.
#[derive(Debug, Default)]
pub(crate) struct ShowTable {
    shows: HashMap<String, Show>,
    /// (theatre, title) -> canonical id
    titles: HashMap<(String, String), String>,
}

impl ShowTable {
    pub fn from_shows(shows: impl IntoIterator<Item = Show>) -> Result<Self> {
        let mut table = Self::default();
        for show in shows {
            table.upsert(&show)?;
        }
        Ok(table)
    }

    pub fn upsert(&mut self, show: &Show) -> Result<UpsertOutcome> {
        let id = show.canonical_id();
        let title_key = (show.theatre.clone(), show.name.clone());

        if let Some(owner) = self.titles.get(&title_key) {
            if *owner != id {
                let existing = self.shows.get(owner).map_or("", |s| s.link_url.as_str());
                return Err(AppError::conflict(
                    format!("{}/{}", show.theatre, show.name),
                    format!(
                        "title already stored with link {}, got {}",
                        existing, show.link_url
                    ),
                ));
            }
        }

        match self.shows.insert(id.clone(), show.clone()) {
            None => {
                self.titles.insert(title_key, id);
                Ok(UpsertOutcome::Inserted)
            }
            Some(previous) if previous == *show => Ok(UpsertOutcome::Unchanged),
            Some(previous) => {
                if previous.name != show.name {
                    self.titles
                        .remove(&(previous.theatre.clone(), previous.name.clone()));
                    self.titles.insert(title_key, id);
                }
                Ok(UpsertOutcome::Updated)
            }
        }
    }

    pub fn date_ranges(&self) -> Vec<DateRange> {
        self.shows.values().map(Show::date_range).collect()
    }

    pub fn shows_in_period(&self, period: CalendarPeriod) -> Vec<Show> {
        let mut shows: Vec<_> = self
            .shows
            .values()
            .filter(|s| s.date_range().overlaps(period))
            .cloned()
            .collect();
        shows.sort_by(|a, b| {
            a.start_date
                .cmp(&b.start_date)
                .then_with(|| a.name.cmp(&b.name))
        });
        shows
    }

    pub fn len(&self) -> usize {
        self.shows.len()
    }

    /// All shows, ordered by theatre, start date, then name.
    pub fn to_sorted_vec(&self) -> Vec<Show> {
        let mut shows: Vec<_> = self.shows.values().cloned().collect();
        shows.sort_by(|a, b| {
            (&a.theatre, a.start_date, &a.name).cmp(&(&b.theatre, b.start_date, &b.name))
        });
        shows
    }
}
