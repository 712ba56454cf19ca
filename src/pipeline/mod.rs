//! Pipeline entry points.
//!
//! - `ingest_all`: Scrape every active theatre and store its shows
//! - `available_months` / `shows_for_month`: Month-based queries over stored shows

pub mod ingest;
pub mod query;

pub use ingest::{IngestOptions, ingest_all};
pub use query::{available_months, shows_for_month};
