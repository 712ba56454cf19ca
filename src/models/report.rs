//! Ingestion run reporting.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Why a listing item was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarningReason {
    MissingLink,
    MissingImage,
    MissingTitle,
    MissingDate,
    InvalidDate { text: String, message: String },
}

impl fmt::Display for WarningReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLink => write!(f, "cannot find link url"),
            Self::MissingImage => write!(f, "cannot find image url"),
            Self::MissingTitle => write!(f, "cannot find title"),
            Self::MissingDate => write!(f, "cannot find date"),
            Self::InvalidDate { text, message } => {
                write!(f, "invalid date '{}': {}", text, message)
            }
        }
    }
}

/// A single malformed listing item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionWarning {
    pub theatre: String,
    /// Page the item was found on
    pub page_url: String,
    /// Position among the container's child elements
    pub index: usize,
    pub reason: WarningReason,
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} item #{} on {}: {}",
            self.theatre, self.index, self.page_url, self.reason
        )
    }
}

/// How severe a failed upsert was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageFailureKind {
    Conflict,
    Fatal,
}

/// A show that could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageFailure {
    pub link_url: String,
    pub kind: StorageFailureKind,
    pub message: String,
}

/// Outcome for one theatre.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceReport {
    pub theatre: String,
    pub pages_fetched: usize,
    pub shows_extracted: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub warnings: Vec<ExtractionWarning>,
    /// Pagination stopped early on a revisit or the page bound
    pub truncated: bool,
    /// Fetch/extraction failure that ended this theatre's run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub storage_failures: Vec<StorageFailure>,
}

impl SourceReport {
    pub fn new(theatre: impl Into<String>) -> Self {
        Self {
            theatre: theatre.into(),
            ..Self::default()
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn stored(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }
}

/// Summary of a whole ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Per-theatre results, in configuration order
    pub sources: Vec<SourceReport>,
    /// Inactive theatres that were not attempted
    pub skipped: Vec<String>,
    /// First non-conflict storage failure of the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal: Option<String>,
    /// Whether writing stopped because of `fatal`
    pub aborted: bool,
    /// Whether the final write to storage failed
    pub flush_failed: bool,
}

impl IngestionReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            sources: Vec::new(),
            skipped: Vec::new(),
            fatal: None,
            aborted: false,
            flush_failed: false,
        }
    }

    /// Whether the run lost data it should have stored.
    pub fn failed(&self) -> bool {
        self.aborted || self.flush_failed
    }

    pub fn source(&self, theatre: &str) -> Option<&SourceReport> {
        self.sources.iter().find(|s| s.theatre == theatre)
    }

    pub fn total_extracted(&self) -> usize {
        self.sources.iter().map(|s| s.shows_extracted).sum()
    }

    pub fn total_stored(&self) -> usize {
        self.sources.iter().map(SourceReport::stored).sum()
    }

    pub fn total_warnings(&self) -> usize {
        self.sources.iter().map(|s| s.warnings.len()).sum()
    }

    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|s| !s.succeeded()).count()
    }

    /// No source errors, no warnings, no storage failures.
    pub fn is_clean(&self) -> bool {
        self.fatal.is_none()
            && self
                .sources
                .iter()
                .all(|s| s.succeeded() && s.warnings.is_empty() && s.storage_failures.is_empty())
    }

    /// Write the per-theatre summary to the log.
    pub fn log_summary(&self) {
        log::info!("Ingestion summary ({} theatres)", self.sources.len());
        for source in &self.sources {
            match &source.error {
                None => log::info!(
                    "  ✓ {} - {} shows from {} page(s): {} new, {} updated, {} unchanged, {} warnings, {} storage failures",
                    source.theatre,
                    source.shows_extracted,
                    source.pages_fetched,
                    source.inserted,
                    source.updated,
                    source.unchanged,
                    source.warnings.len(),
                    source.storage_failures.len()
                ),
                Some(error) => log::error!("  ✗ {} - Error: {}", source.theatre, error),
            }
            if source.truncated {
                log::warn!("      listing truncated after {} page(s)", source.pages_fetched);
            }
            for warning in &source.warnings {
                log::debug!("      {}", warning);
            }
            for failure in &source.storage_failures {
                log::warn!("      {:?} {}: {}", failure.kind, failure.link_url, failure.message);
            }
        }
        for name in &self.skipped {
            log::info!("  - {} (inactive)", name);
        }
        if let Some(fatal) = &self.fatal {
            if self.flush_failed {
                log::error!("Nothing written, storage flush failed: {}", fatal);
            } else if self.aborted {
                log::error!("Ingestion aborted after storage failure: {}", fatal);
            } else {
                log::error!("Storage failure: {}", fatal);
            }
        }
        log::info!(
            "Total: {} extracted, {} stored, {} warnings, {} failed theatres in {}s",
            self.total_extracted(),
            self.total_stored(),
            self.total_warnings(),
            self.failed_sources(),
            (self.finished_at - self.started_at).num_seconds()
        );
    }
}
