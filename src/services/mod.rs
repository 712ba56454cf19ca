//! Service layer for the ingestion engine.
//!
//! This module contains the business logic for:
//! - Date text parsing (`DateParser` and its per-theatre conventions)
//! - Show extraction from one page (`ShowExtractor`)
//! - Paginated fetch-and-extract runs (`PaginationDriver`)
//! - Month aggregation (`distinct_periods`)

mod dates;
mod extract;
mod months;
mod paginate;

pub use dates::{
    DateParser, DefaultDateParser, HippodromeDateParser, IsoDateParser, ResortsworldDateParser,
};
pub use extract::{PageExtraction, ShowExtractor};
pub use months::{distinct_periods, sorted_periods};
pub use paginate::{PageRun, PageStop, PaginationDriver};
