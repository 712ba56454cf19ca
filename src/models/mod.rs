// src/models/mod.rs

//! Domain models for the ingestion engine.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod period;
mod report;
mod selectors;
mod show;
mod theatre;

// Re-export all public types
pub use config::{Config, CrawlerConfig, FatalPolicy, StorageConfig};
pub use period::CalendarPeriod;
pub use report::{
    ExtractionWarning, IngestionReport, SourceReport, StorageFailure, StorageFailureKind,
    WarningReason,
};
pub use selectors::{DateFormat, ShowSelectors};
pub use show::{DateRange, Show, ShowCandidate};
pub use theatre::TheatreSource;
