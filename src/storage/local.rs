//! Local filesystem storage implementation.
//!
//! Keeps the whole show table in memory and writes it back to a single JSON
//! document on [`ShowStorage::flush`].
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── config.toml           # Theatre configuration
//! └── shows.json            # Stored shows
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::models::{CalendarPeriod, DateRange, Show};
use crate::storage::{ShowStorage, ShowTable, ShowsData, UpsertOutcome};

/// Local filesystem storage backend.
#[derive(Debug)]
pub struct LocalStorage {
    root_dir: PathBuf,
    file: String,
    table: RwLock<ShowTable>,
    dirty: AtomicBool,
}

impl LocalStorage {
    /// Open the show file under `root_dir`, starting empty if it does not exist.
    pub async fn open(root_dir: impl Into<PathBuf>, file: impl Into<String>) -> Result<Self> {
        let mut storage = Self {
            root_dir: root_dir.into(),
            file: file.into(),
            table: RwLock::new(ShowTable::default()),
            dirty: AtomicBool::new(false),
        };

        let existing = storage.read_json::<ShowsData>(&storage.file).await?;
        match existing {
            Some(data) => {
                log::debug!("Loaded {} shows from {:?}", data.shows.len(), storage.file_path());
                storage.table = RwLock::new(ShowTable::from_shows(data.shows)?);
            }
            None => log::warn!("No {} found, starting empty", storage.file),
        }
        Ok(storage)
    }

    /// Full path of the show file.
    pub fn file_path(&self) -> PathBuf {
        self.path(&self.file)
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ShowStorage for LocalStorage {
    async fn upsert(&self, show: &Show) -> Result<UpsertOutcome> {
        let outcome = self.table.write().await.upsert(show)?;
        if outcome != UpsertOutcome::Unchanged {
            self.dirty.store(true, Ordering::Release);
        }
        Ok(outcome)
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
        if !self.dirty.swap(false, Ordering::AcqRel) {
            log::debug!("No show changes to write");
            return Ok(());
        }

        let data = ShowsData::new(self.table.read().await.to_sorted_vec());
        if let Err(e) = self.write_json(&self.file, &data).await {
            self.dirty.store(true, Ordering::Release);
            return Err(AppError::storage(format!(
                "writing {:?}: {}",
                self.file_path(),
                e
            )));
        }
        log::info!("{} shows written to {}", data.count, self.file);
        Ok(())
    }
}
