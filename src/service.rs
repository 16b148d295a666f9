//! Sync orchestration: crawl, dedup, batch, persist.
//!
//! # Architecture
//!
//! ```text
//! DataProvider ──mpsc(result_buffer)──> consumer task ──bulk_save(batch)──> Persistence
//!       ▲                                   │
//!       └──────── session token ◄───────────┘ cancelled on a failed write
//! ```
//!
//! The crawl runs on the caller's task while a single spawned consumer owns
//! the dedup cache and the pending batch. The store is only ever called
//! from the consumer, one batch at a time.
//!
//! # Failure semantics
//!
//! - A failed batch write stops the consumer, cancels the crawl and becomes
//!   the result of [`SolicitationService::sync`]. Batches written before it
//!   stay written.
//! - Cancellation is checked before every write. A cancelled sync drops the
//!   pending partial batch and returns [`Error::Cancelled`].

use crate::cache::DedupCache;
use crate::config::SyncConfig;
use crate::error::Error;
use crate::models::{ComicBook, RunStats};
use crate::observer::{Observer, Severity};
use crate::scrapers::{DataProvider, ScrapeRequest};
use crate::store::Persistence;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

/// Summary of a finished sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub urls_found: usize,
    pub pages_scraped: usize,
    pub comics_scraped: usize,
    /// Records dropped because an identical one was already accepted.
    pub duplicates: usize,
    /// Records written to the store.
    pub committed: usize,
    pub batches: usize,
    /// Non-fatal problems reported during the crawl.
    pub errors: usize,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pages found, {} scraped, {} comic books ({} duplicates), {} saved in {} batches, {} errors",
            self.urls_found,
            self.pages_scraped,
            self.comics_scraped,
            self.duplicates,
            self.committed,
            self.batches,
            self.errors
        )
    }
}

#[derive(Debug, Default)]
struct ConsumerOutcome {
    duplicates: usize,
    committed: usize,
    batches: usize,
}

/// Runs syncs against one provider and one store.
pub struct SolicitationService {
    provider: Arc<dyn DataProvider>,
    store: Arc<dyn Persistence>,
    batch_size: usize,
    result_buffer: usize,
}

impl SolicitationService {
    /// Create a service with the batching thresholds from `config`.
    pub fn new(
        provider: Arc<dyn DataProvider>,
        store: Arc<dyn Persistence>,
        config: &SyncConfig,
    ) -> Result<Self, Error> {
        Self::with_batching(provider, store, config.batch_size, config.result_buffer)
    }

    /// # Errors
    ///
    /// [`Error::Config`] when either threshold is zero.
    pub fn with_batching(
        provider: Arc<dyn DataProvider>,
        store: Arc<dyn Persistence>,
        batch_size: usize,
        result_buffer: usize,
    ) -> Result<Self, Error> {
        if batch_size == 0 || result_buffer == 0 {
            return Err(Error::Config("batch size and result buffer must be greater than zero".into()));
        }
        Ok(Self {
            provider,
            store,
            batch_size,
            result_buffer,
        })
    }

    /// Scrape everything `request` asks for and persist it in batches.
    ///
    /// Waits for both the crawl and the consumer before returning. Every
    /// call counts into its own [`RunStats`], so concurrent syncs on one
    /// service report independently.
    ///
    /// # Errors
    ///
    /// In order of precedence: the first failed batch write, a crawl
    /// error (configuration, sitemap), then [`Error::Cancelled`].
    #[instrument(level = "info", skip_all, fields(months = ?request.months, publishers = ?request.publishers))]
    pub async fn sync(
        &self,
        request: &ScrapeRequest,
        observer: Arc<dyn Observer>,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, Error> {
        let t0 = Instant::now();
        let stats = RunStats::new();
        let session = cancel.child_token();
        let (tx, rx) = mpsc::channel(self.result_buffer);

        let consumer = tokio::spawn(consume(
            rx,
            Arc::clone(&self.store),
            Arc::clone(&observer),
            self.batch_size,
            session.clone(),
        ));

        let crawled = self
            .provider
            .get_data(request, observer.as_ref(), &stats, &session, tx)
            .await;
        let consumed = consumer.await?;

        let outcome = match (crawled, consumed) {
            (_, Err(e)) if !e.is_cancelled() => {
                error!(error = %e, "Sync aborted by persistence failure");
                return Err(e);
            }
            (Err(e), _) => {
                if !e.is_cancelled() {
                    error!(error = %e, "Sync failed");
                }
                return Err(e);
            }
            (Ok(()), Err(e)) => return Err(e),
            (Ok(()), Ok(outcome)) => outcome,
        };

        let report = SyncReport {
            urls_found: stats.urls_found(),
            pages_scraped: stats.pages_scraped(),
            comics_scraped: stats.comics_scraped(),
            duplicates: outcome.duplicates,
            committed: outcome.committed,
            batches: outcome.batches,
            errors: stats.errors(),
        };
        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            committed = report.committed,
            batches = report.batches,
            errors = report.errors,
            "Sync complete"
        );
        Ok(report)
    }
}

async fn consume(
    mut rx: mpsc::Receiver<ComicBook>,
    store: Arc<dyn Persistence>,
    observer: Arc<dyn Observer>,
    batch_size: usize,
    session: CancellationToken,
) -> Result<ConsumerOutcome, Error> {
    let cache = DedupCache::new();
    let mut pending = Vec::with_capacity(batch_size);
    let mut outcome = ConsumerOutcome::default();

    while let Some(comic) = rx.recv().await {
        if let Err(e) = cache.put(comic.clone()) {
            outcome.duplicates += 1;
            let msg = e.to_string();
            observer.on_error(&comic.publisher, Severity::Info, "duplicate comic book", &[("error", msg.as_str())]);
            continue;
        }
        pending.push(comic);

        if pending.len() >= batch_size {
            flush(store.as_ref(), &mut pending, &mut outcome, &session).await?;
        }
    }

    if !pending.is_empty() {
        flush(store.as_ref(), &mut pending, &mut outcome, &session).await?;
    }
    debug!(cached = cache.len(), "Result stream closed");
    Ok(outcome)
}

async fn flush(
    store: &dyn Persistence,
    pending: &mut Vec<ComicBook>,
    outcome: &mut ConsumerOutcome,
    session: &CancellationToken,
) -> Result<(), Error> {
    if session.is_cancelled() {
        debug!(dropped = pending.len(), "Skipping batch after cancellation");
        return Err(Error::Cancelled);
    }

    if let Err(e) = store.bulk_save(pending).await {
        error!(error = %e, size = pending.len(), batch = outcome.batches + 1, "Batch write failed");
        session.cancel();
        return Err(e.into());
    }

    outcome.committed += pending.len();
    outcome.batches += 1;
    info!(size = pending.len(), batch = outcome.batches, "Saved batch");
    pending.clear();
    Ok(())
}
