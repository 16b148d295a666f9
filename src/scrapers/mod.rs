//! Solicitation scrapers.
//!
//! A scrape session follows the same two-phase pattern for every source:
//!
//! 1. **Navigation**: discover solicitation pages from the site's sitemap
//!    and queue them ([`sitemap`])
//! 2. **Scraping**: drain the queue, fetch each page and stream the
//!    extracted records to the caller ([`detail`])
//!
//! The phases only meet at the bounded [`WorkQueue`]; the sitemap pass
//! finishes before the first solicitation page is requested.
//!
//! # Supported Sources
//!
//! | Source | Type | Notes |
//! |--------|------|-------|
//! | Comic Releases | [`ComicReleasesScraper`] | `urlset` sitemap, WordPress column blocks |

pub mod detail;
pub mod sitemap;

use crate::config::SyncConfig;
use crate::creators::CreatorParser;
use crate::error::Error;
use crate::extract::ComicReleasesExtractor;
use crate::models::{ComicBook, RunStats};
use crate::net::{CrawlLimits, Fetcher};
use crate::observer::{CountingObserver, Observer};
use crate::patterns::PatternSet;
use crate::queue::WorkQueue;
use async_trait::async_trait;
use detail::DetailCrawler;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use url::Url;

/// What to look for in one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    /// Lowercase month names, e.g. `march`.
    pub months: Vec<String>,
    /// Lowercase publisher slugs, e.g. `dc`.
    pub publishers: Vec<String>,
}

impl ScrapeRequest {
    pub fn new(months: Vec<String>, publishers: Vec<String>) -> Self {
        Self { months, publishers }
    }
}

/// A source of solicitation records.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Run one scrape session, sending every record to `results`.
    ///
    /// `stats` belongs to this session alone. It is reset when the session
    /// starts and kept current while it runs.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] for unusable inputs, the sitemap failure, or
    /// [`Error::Cancelled`].
    async fn get_data(
        &self,
        request: &ScrapeRequest,
        observer: &dyn Observer,
        stats: &RunStats,
        cancel: &CancellationToken,
        results: mpsc::Sender<ComicBook>,
    ) -> Result<(), Error>;
}

/// Scraper for comicreleases.com solicitation posts.
pub struct ComicReleasesScraper {
    fetcher: Arc<dyn Fetcher>,
    sitemap_url: Url,
    queue_capacity: usize,
    list_limits: CrawlLimits,
    detail_limits: CrawlLimits,
    roles: Vec<String>,
    year: Option<i32>,
}

impl ComicReleasesScraper {
    pub fn new(config: &SyncConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            fetcher,
            sitemap_url: Url::parse(&config.sitemap_url)?,
            queue_capacity: config.queue_capacity,
            list_limits: config.list,
            detail_limits: config.detail,
            roles: config.roles.clone(),
            year: None,
        })
    }

    /// Match solicitations for `year` and `year + 1` instead of the current year.
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    fn patterns(&self, request: &ScrapeRequest) -> Result<PatternSet, Error> {
        let patterns = match self.year {
            Some(year) => PatternSet::new(request.months.as_slice(), request.publishers.as_slice(), year)?,
            None => PatternSet::current(request.months.as_slice(), request.publishers.as_slice())?,
        };
        Ok(patterns)
    }
}

#[async_trait]
impl DataProvider for ComicReleasesScraper {
    #[instrument(level = "info", skip_all, fields(months = ?request.months, publishers = ?request.publishers))]
    async fn get_data(
        &self,
        request: &ScrapeRequest,
        observer: &dyn Observer,
        stats: &RunStats,
        cancel: &CancellationToken,
        results: mpsc::Sender<ComicBook>,
    ) -> Result<(), Error> {
        if request.months.is_empty() || request.publishers.is_empty() {
            return Err(Error::Config("at least one month and one publisher are required".into()));
        }

        let extractor = ComicReleasesExtractor::new(self.patterns(request)?, CreatorParser::new(self.roles.clone()));
        let queue = WorkQueue::new(self.queue_capacity)?;

        stats.reset();
        let observer = CountingObserver::new(observer, stats);

        let queued = sitemap::crawl(
            self.fetcher.as_ref(),
            &self.sitemap_url,
            &self.list_limits,
            &extractor,
            &queue,
            &observer,
            cancel,
        )
        .await?;

        if cancel.is_cancelled() {
            info!("Session cancelled after navigation");
            return Err(Error::Cancelled);
        }

        DetailCrawler {
            fetcher: self.fetcher.as_ref(),
            limits: &self.detail_limits,
            extractor: &extractor,
            observer: &observer,
            stats,
            cancel,
            results: &results,
        }
        .run(queue.close())
        .await;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        info!(
            queued,
            pages = stats.pages_scraped(),
            comics = stats.comics_scraped(),
            errors = stats.errors(),
            "Scrape session finished"
        );
        Ok(())
    }
}
