//! In-memory storage backend.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::{CalendarPeriod, DateRange, Show};
use crate::storage::{ShowStorage, ShowTable, UpsertOutcome};

/// Process-local show store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    table: RwLock<ShowTable>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing shows.
    pub fn with_shows(shows: impl IntoIterator<Item = Show>) -> Result<Self> {
        Ok(Self {
            table: RwLock::new(ShowTable::from_shows(shows)?),
        })
    }

    /// Snapshot of every stored show.
    pub async fn shows(&self) -> Vec<Show> {
        self.table.read().await.to_sorted_vec()
    }
}

#[async_trait]
impl ShowStorage for MemoryStorage {
    async fn upsert(&self, show: &Show) -> Result<UpsertOutcome> {
        self.table.write().await.upsert(show)
    }

    async fn date_ranges(&self) -> Result<Vec<DateRange>> {
        Ok(self.table.read().await.date_ranges())
    }

    async fn shows_in_period(&self, period: CalendarPeriod) -> Result<Vec<Show>> {
        Ok(self.table.read().await.shows_in_period(period))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.table.read().await.len())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}
