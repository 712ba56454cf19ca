// src/pipeline/ingest.rs

//! Show ingestion pipeline.
//!
//! Every active theatre is scraped independently; a theatre whose pages
//! cannot be fetched is reported and the run moves on. Extracted shows are
//! written theatre by theatre, in configuration order.

use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};
use crate::fetch::FetcherRegistry;
use crate::models::{
    Config, FatalPolicy, IngestionReport, Show, SourceReport, StorageFailure,
    StorageFailureKind, TheatreSource,
};
use crate::services::{PageRun, PaginationDriver, ShowExtractor};
use crate::storage::{ShowStorage, UpsertOutcome};

/// Tunables for one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Theatres scraped at the same time
    pub max_concurrent: usize,
    /// Page bound per theatre
    pub max_pages: usize,
    /// Pause between pages of one theatre
    pub request_delay: Duration,
    pub on_fatal: FatalPolicy,
}

impl IngestOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_concurrent: config.crawler.max_concurrent,
            max_pages: config.crawler.max_pages,
            request_delay: config.crawler.request_delay(),
            on_fatal: config.storage.on_fatal,
        }
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Ingest every active source into `storage`.
///
/// Per-item, per-source and per-show failures end up in the report. Only a
/// source list with nothing active to ingest is an error.
pub async fn ingest_all(
    sources: &[TheatreSource],
    fetchers: &FetcherRegistry,
    storage: &dyn ShowStorage,
    options: &IngestOptions,
) -> Result<IngestionReport> {
    let mut report = IngestionReport::new(Utc::now());

    let (active, inactive): (Vec<_>, Vec<_>) = sources.iter().partition(|s| s.active);
    report.skipped = inactive.iter().map(|s| s.name.clone()).collect();
    if active.is_empty() {
        return Err(AppError::config("no active theatres to ingest"));
    }

    log::info!(
        "Ingesting {} theatres ({} inactive skipped)",
        active.len(),
        report.skipped.len()
    );

    let mut runs = stream::iter(active.iter().copied())
        .map(|source| async move { (source, scrape(source, fetchers, options).await) })
        .buffered(options.max_concurrent.max(1));

    while let Some((source, result)) = runs.next().await {
        let mut source_report = SourceReport::new(&source.name);

        match result {
            Ok(run) => {
                source_report.pages_fetched = run.pages.len();
                source_report.truncated = run.stop.is_truncated();
                source_report.shows_extracted = run.shows.len();
                source_report.warnings = run.warnings;
                log::info!(
                    "{}: {} shows from {} page(s)",
                    source.name,
                    run.shows.len(),
                    run.pages.len()
                );
                store(&run.shows, storage, options.on_fatal, &mut source_report, &mut report).await;
            }
            Err(error) => {
                log::error!("{}: {}", source.name, error);
                source_report.error = Some(error.to_string());
            }
        }

        report.sources.push(source_report);
        if report.aborted {
            break;
        }
    }
    drop(runs);

    if let Some(fatal) = report.fatal.clone().filter(|_| report.aborted) {
        for source in &active[report.sources.len()..] {
            let mut source_report = SourceReport::new(&source.name);
            source_report.error = Some(format!("not ingested, run aborted: {fatal}"));
            report.sources.push(source_report);
        }
    }

    if let Err(error) = storage.flush().await {
        log::error!("Storage flush failed: {}", error);
        report.fatal.get_or_insert_with(|| error.to_string());
        report.flush_failed = true;
    }

    report.finished_at = Utc::now();
    Ok(report)
}

/// Fetch and extract every page of one source.
async fn scrape(
    source: &TheatreSource,
    fetchers: &FetcherRegistry,
    options: &IngestOptions,
) -> Result<PageRun> {
    let fetcher = fetchers.get(&source.fetcher)?;
    let extractor = ShowExtractor::new(source)?;

    PaginationDriver::new(&extractor, fetcher.as_ref())
        .max_pages(options.max_pages)
        .delay(options.request_delay)
        .run()
        .await
}

/// Upsert a source's shows, recording outcomes on the reports.
async fn store(
    shows: &[Show],
    storage: &dyn ShowStorage,
    policy: FatalPolicy,
    source_report: &mut SourceReport,
    report: &mut IngestionReport,
) {
    if report.aborted {
        return;
    }

    for show in shows {
        let error = match storage.upsert(show).await {
            Ok(UpsertOutcome::Inserted) => {
                source_report.inserted += 1;
                continue;
            }
            Ok(UpsertOutcome::Updated) => {
                source_report.updated += 1;
                continue;
            }
            Ok(UpsertOutcome::Unchanged) => {
                source_report.unchanged += 1;
                continue;
            }
            Err(error) => error,
        };

        let kind = if error.is_conflict() {
            log::warn!("Skipping {}: {}", show.link_url, error);
            StorageFailureKind::Conflict
        } else {
            log::error!("Failed to store {}: {}", show.link_url, error);
            StorageFailureKind::Fatal
        };
        source_report.storage_failures.push(StorageFailure {
            link_url: show.link_url.clone(),
            kind,
            message: error.to_string(),
        });

        if kind == StorageFailureKind::Fatal {
            report.fatal.get_or_insert_with(|| error.to_string());
            if policy == FatalPolicy::Abort {
                report.aborted = true;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::fetch::testing::ScriptedFetcher;
    use crate::models::{CalendarPeriod, DateFormat, DateRange, ShowSelectors};
    use crate::storage::MemoryStorage;

    fn source(name: &str, next: Option<&str>) -> TheatreSource {
        TheatreSource {
            name: name.to_string(),
            active: true,
            root_url: format!("https://{name}.test"),
            url: format!("https://{name}.test/whats-on/"),
            fetcher: "scripted".to_string(),
            selectors: ShowSelectors {
                container_selector: "div.events".to_string(),
                link_selector: "a".to_string(),
                image_selector: "img".to_string(),
                title_selector: ".title".to_string(),
                date_selector: ".dates".to_string(),
                link_relative: true,
                next_selector: next.map(str::to_string),
                link_attr: "href".to_string(),
                image_attr: "src".to_string(),
                date_format: DateFormat::Iso,
            },
        }
    }

    fn listing(titles: &[&str], next: Option<&str>) -> String {
        let items: String = titles
            .iter()
            .map(|title| {
                let slug = title.to_lowercase().replace(' ', "-");
                format!(
                    r#"<article><a href="/shows/{slug}"><img src="/img/{slug}.jpg"></a><span class="title">{title}</span><span class="dates">2024-03-01 to 2024-04-02</span></article>"#
                )
            })
            .collect();
        let nav = next
            .map(|href| format!(r#"<a class="next" href="{href}">More</a>"#))
            .unwrap_or_default();
        format!(r#"<html><body><div class="events">{items}</div>{nav}</body></html>"#)
    }

    fn registry(fetcher: Arc<ScriptedFetcher>) -> FetcherRegistry {
        FetcherRegistry::new().with("scripted", fetcher)
    }

    /// Memory storage that fails upserts for marked links and, optionally, flushes.
    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_flush: AtomicBool,
    }

    #[async_trait]
    impl ShowStorage for FlakyStorage {
        async fn upsert(&self, show: &Show) -> Result<UpsertOutcome> {
            if show.link_url.contains("broken") {
                return Err(AppError::storage("connection lost"));
            }
            self.inner.upsert(show).await
        }

        async fn date_ranges(&self) -> Result<Vec<DateRange>> {
            self.inner.date_ranges().await
        }

        async fn shows_in_period(&self, period: CalendarPeriod) -> Result<Vec<Show>> {
            self.inner.shows_in_period(period).await
        }

        async fn count(&self) -> Result<usize> {
            self.inner.count().await
        }

        async fn flush(&self) -> Result<()> {
            if self.fail_flush.load(Ordering::Relaxed) {
                return Err(AppError::storage("disk full"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_source_does_not_stop_others() {
        let palace = source("palace", Some("a.next"));
        let albany = source("albany", None);
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .page(&palace.url, listing(&["Annie", "Hamlet"], Some("/whats-on/2/")))
                .failing("https://palace.test/whats-on/2/", "HTTP status 503")
                .page(&albany.url, listing(&["Cinderella", "Oliver", "Grease"], None)),
        );
        let storage = MemoryStorage::new();

        let report = ingest_all(
            &[palace, albany],
            &registry(fetcher.clone()),
            &storage,
            &IngestOptions::default(),
        )
        .await
        .unwrap();

        let names: Vec<_> = report.sources.iter().map(|s| s.theatre.as_str()).collect();
        assert_eq!(names, vec!["palace", "albany"]);

        let palace = report.source("palace").unwrap();
        assert!(!palace.succeeded());
        assert!(palace.error.as_deref().unwrap().contains("whats-on/2/"));
        assert_eq!(palace.stored(), 0);

        let albany = report.source("albany").unwrap();
        assert!(albany.succeeded());
        assert_eq!(albany.inserted, 3);

        assert_eq!(storage.count().await.unwrap(), 3);
        assert_eq!(report.failed_sources(), 1);
        assert_eq!(fetcher.call_count(), 3);
    }

    #[tokio::test]
    async fn test_second_run_is_unchanged() {
        let albany = source("albany", None);
        let fetcher = Arc::new(
            ScriptedFetcher::new().page(&albany.url, listing(&["Cinderella", "Oliver"], None)),
        );
        let registry = registry(fetcher);
        let storage = MemoryStorage::new();
        let sources = [albany];

        let first = ingest_all(&sources, &registry, &storage, &IngestOptions::default())
            .await
            .unwrap();
        assert_eq!(first.sources[0].inserted, 2);

        let second = ingest_all(&sources, &registry, &storage, &IngestOptions::default())
            .await
            .unwrap();
        assert_eq!(second.sources[0].unchanged, 2);
        assert!(second.is_clean());
        assert_eq!(storage.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_conflicts_are_skipped() {
        let albany = source("albany", None);
        let fetcher = Arc::new(
            ScriptedFetcher::new().page(&albany.url, listing(&["Cinderella", "Oliver"], None)),
        );

        let existing = Show {
            theatre: "albany".to_string(),
            name: "Cinderella".to_string(),
            image_url: "https://albany.test/img/old.jpg".to_string(),
            link_url: "https://albany.test/shows/cinderella-2023".to_string(),
            start_date: chrono::NaiveDate::from_ymd_opt(2023, 12, 1).unwrap(),
            end_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        };
        let storage = MemoryStorage::with_shows([existing.clone()]).unwrap();

        let report = ingest_all(&[albany], &registry(fetcher), &storage, &IngestOptions::default())
            .await
            .unwrap();

        let albany = &report.sources[0];
        assert_eq!(albany.inserted, 1);
        assert_eq!(albany.storage_failures.len(), 1);
        assert_eq!(albany.storage_failures[0].kind, StorageFailureKind::Conflict);
        assert!(report.fatal.is_none());
        assert_eq!(storage.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_fatal_storage_error_aborts() {
        let palace = source("palace", None);
        let albany = source("albany", None);
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .page(&palace.url, listing(&["Broken Show", "Annie"], None))
                .page(&albany.url, listing(&["Cinderella"], None)),
        );
        let storage = FlakyStorage::default();

        let report = ingest_all(
            &[palace, albany],
            &registry(fetcher),
            &storage,
            &IngestOptions::default(),
        )
        .await
        .unwrap();

        assert!(report.aborted);
        assert!(report.fatal.as_deref().unwrap().contains("connection lost"));
        assert_eq!(report.sources[0].stored(), 0);
        assert_eq!(report.sources[0].storage_failures[0].kind, StorageFailureKind::Fatal);
        assert!(report.sources[1].error.as_deref().unwrap().contains("aborted"));
        assert_eq!(storage.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fatal_storage_error_continue_policy() {
        let palace = source("palace", None);
        let albany = source("albany", None);
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .page(&palace.url, listing(&["Broken Show", "Annie"], None))
                .page(&albany.url, listing(&["Cinderella"], None)),
        );
        let storage = FlakyStorage::default();
        let options = IngestOptions {
            on_fatal: FatalPolicy::Continue,
            ..IngestOptions::default()
        };

        let report = ingest_all(&[palace, albany], &registry(fetcher), &storage, &options)
            .await
            .unwrap();

        assert!(!report.aborted);
        assert!(report.fatal.is_some());
        assert_eq!(report.sources[0].inserted, 1);
        assert_eq!(report.sources[1].inserted, 1);
        assert_eq!(storage.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_flush_failure_is_fatal() {
        let albany = source("albany", None);
        let fetcher = Arc::new(ScriptedFetcher::new().page(&albany.url, listing(&["Annie"], None)));
        let storage = FlakyStorage::default();
        storage.fail_flush.store(true, Ordering::Relaxed);

        let report = ingest_all(&[albany], &registry(fetcher), &storage, &IngestOptions::default())
            .await
            .unwrap();
        assert!(report.fatal.as_deref().unwrap().contains("disk full"));
        assert!(report.flush_failed);
        assert!(report.failed());
    }

    #[tokio::test]
    async fn test_flush_failure_fails_run_under_continue_policy() {
        let albany = source("albany", None);
        let fetcher = Arc::new(ScriptedFetcher::new().page(&albany.url, listing(&["Annie"], None)));
        let storage = FlakyStorage::default();
        storage.fail_flush.store(true, Ordering::Relaxed);
        let options = IngestOptions {
            on_fatal: FatalPolicy::Continue,
            ..IngestOptions::default()
        };

        let report = ingest_all(&[albany], &registry(fetcher), &storage, &options)
            .await
            .unwrap();
        assert!(!report.aborted);
        assert!(report.failed());
    }

    #[tokio::test]
    async fn test_self_linking_listing_is_marked_truncated() {
        let albany = source("albany", Some("a.next"));
        let fetcher = Arc::new(
            ScriptedFetcher::new().page(&albany.url, listing(&["Annie"], Some("/whats-on/"))),
        );
        let storage = MemoryStorage::new();

        let report = ingest_all(&[albany], &registry(fetcher), &storage, &IngestOptions::default())
            .await
            .unwrap();
        assert!(report.sources[0].truncated);
        assert_eq!(report.sources[0].pages_fetched, 1);
        assert!(!report.failed());
    }

    #[tokio::test]
    async fn test_no_active_sources_is_an_error() {
        let mut albany = source("albany", None);
        albany.active = false;
        let fetcher = Arc::new(ScriptedFetcher::new());

        let err = ingest_all(
            &[albany],
            &registry(fetcher.clone()),
            &MemoryStorage::new(),
            &IngestOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert_eq!(fetcher.call_count(), 0);

        let err = ingest_all(&[], &registry(fetcher), &MemoryStorage::new(), &IngestOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_inactive_sources_are_listed_as_skipped() {
        let mut palace = source("palace", None);
        palace.active = false;
        let albany = source("albany", None);
        let fetcher = Arc::new(ScriptedFetcher::new().page(&albany.url, listing(&["Annie"], None)));

        let report = ingest_all(
            &[palace, albany],
            &registry(fetcher.clone()),
            &MemoryStorage::new(),
            &IngestOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.skipped, vec!["palace"]);
        assert_eq!(report.sources.len(), 1);
        assert_eq!(fetcher.calls(), vec!["https://albany.test/whats-on/"]);
    }

    #[tokio::test]
    async fn test_unknown_fetcher_fails_only_that_source() {
        let mut palace = source("palace", None);
        palace.fetcher = "selenium".to_string();
        let albany = source("albany", None);
        let fetcher = Arc::new(ScriptedFetcher::new().page(&albany.url, listing(&["Annie"], None)));

        let report = ingest_all(
            &[palace, albany],
            &registry(fetcher),
            &MemoryStorage::new(),
            &IngestOptions::default(),
        )
        .await
        .unwrap();

        assert!(report.sources[0].error.as_deref().unwrap().contains("selenium"));
        assert!(report.sources[1].succeeded());
    }

    #[tokio::test]
    async fn test_extraction_warnings_are_reported() {
        let albany = source("albany", None);
        let page = r#"<div class="events">
            <article><a href="/shows/a"><img src="/a.jpg"></a><span class="title">A</span><span class="dates">2024-03-01</span></article>
            <article><span class="title">No link</span><span class="dates">2024-03-01</span></article>
        </div>"#;
        let fetcher = Arc::new(ScriptedFetcher::new().page(&albany.url, page));

        let storage = MemoryStorage::new();
        let report = ingest_all(&[albany], &registry(fetcher), &storage, &IngestOptions::default())
            .await
            .unwrap();
        assert_eq!(report.total_extracted(), 1);
        assert_eq!(report.total_warnings(), 1);
        assert!(!report.is_clean());
    }
}
