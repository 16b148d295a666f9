//! Progress and diagnostics notifications.
//!
//! The crawlers and the orchestrator never log user-facing progress
//! themselves; they notify an [`Observer`]. Calls are fire-and-forget and
//! must not block.

use crate::models::RunStats;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Severity attached to [`Observer::on_error`] notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// Receiver of crawl lifecycle events.
pub trait Observer: Send + Sync {
    /// `n` detail pages were queued for scraping.
    fn on_url_found(&self, n: usize);

    /// The sitemap was fetched and every entry was examined.
    fn on_navigation_complete(&self);

    /// `n` records were extracted from a detail page.
    fn on_comic_book_scraped(&self, n: usize);

    /// The work queue has been drained.
    fn on_scraping_complete(&self);

    /// Something went wrong that did not abort the session.
    ///
    /// `context` names what was being processed, usually a URL.
    fn on_error(&self, context: &str, severity: Severity, message: &str, fields: &[(&str, &str)]);
}

/// Observer that writes every event to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_url_found(&self, n: usize) {
        debug!(n, "Solicitation page queued");
    }

    fn on_navigation_complete(&self) {
        info!("Sitemap navigation complete");
    }

    fn on_comic_book_scraped(&self, n: usize) {
        debug!(n, "Comic book scraped");
    }

    fn on_scraping_complete(&self) {
        info!("Scraping complete");
    }

    fn on_error(&self, context: &str, severity: Severity, message: &str, fields: &[(&str, &str)]) {
        let fields = format_fields(fields);
        match severity {
            Severity::Debug => debug!(%context, %fields, "{message}"),
            Severity::Info => info!(%context, %fields, "{message}"),
            Severity::Warn => warn!(%context, %fields, "{message}"),
            Severity::Error => error!(%context, %fields, "{message}"),
        }
    }
}

fn format_fields(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{k}={v:?}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Forwards to an inner observer while keeping [`RunStats`] current.
pub(crate) struct CountingObserver<'a> {
    inner: &'a dyn Observer,
    stats: &'a RunStats,
}

impl<'a> CountingObserver<'a> {
    pub(crate) fn new(inner: &'a dyn Observer, stats: &'a RunStats) -> Self {
        Self { inner, stats }
    }
}

impl Observer for CountingObserver<'_> {
    fn on_url_found(&self, n: usize) {
        self.stats.add_urls_found(n);
        self.inner.on_url_found(n);
    }

    fn on_navigation_complete(&self) {
        self.inner.on_navigation_complete();
    }

    fn on_comic_book_scraped(&self, n: usize) {
        self.stats.add_comics_scraped(n);
        self.inner.on_comic_book_scraped(n);
    }

    fn on_scraping_complete(&self) {
        self.inner.on_scraping_complete();
    }

    fn on_error(&self, context: &str, severity: Severity, message: &str, fields: &[(&str, &str)]) {
        if severity >= Severity::Warn {
            self.stats.add_error();
        }
        self.inner.on_error(context, severity, message, fields);
    }
}
