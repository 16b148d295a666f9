//! Sitemap navigation: the first crawl phase.
//!
//! The site publishes every post in a single `urlset` sitemap. Each `<loc>`
//! is tested against the session's URL pattern; matches are queued for the
//! detail phase with the publisher slug inferred from the URL.
//!
//! # Example document
//!
//! ```text
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url><loc>https://www.comicreleases.com/2025/12/dc-march-2026-solicitations/</loc></url>
//! </urlset>
//! ```

use crate::error::{Error, QueueError};
use crate::extract::Extractor;
use crate::net::{CrawlLimits, Fetcher, fetch_with_delay};
use crate::observer::{Observer, Severity};
use crate::queue::{DetailRequest, WorkQueue};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use url::Url;

#[derive(Debug, Deserialize)]
struct UrlSet {
    #[serde(rename = "url", default)]
    urls: Vec<UrlEntry>,
}

#[derive(Debug, Deserialize)]
struct UrlEntry {
    loc: String,
}

/// Extract every `<loc>` from a `urlset` sitemap, in document order.
pub fn parse_sitemap(xml: &str) -> Result<Vec<String>, Error> {
    let set: UrlSet = quick_xml::de::from_str(xml.trim_start())?;
    Ok(set
        .urls
        .into_iter()
        .map(|entry| entry.loc.trim().to_string())
        .filter(|loc| !loc.is_empty())
        .collect())
}

/// Fetch the sitemap and queue every matching solicitation page.
///
/// # Arguments
///
/// * `sitemap_url` - Location of the `urlset` document
/// * `queue` - Destination for matching pages; never waited on
///
/// # Returns
///
/// The number of pages queued. Per-entry failures (bad URL, full queue)
/// are reported to the observer and skipped.
///
/// # Errors
///
/// Fails when the sitemap cannot be fetched or parsed, or with
/// [`Error::Cancelled`] if the token fires before every entry is queued.
/// Pages queued before cancellation stay in the queue.
#[instrument(level = "info", skip_all, fields(url = %sitemap_url))]
pub async fn crawl(
    fetcher: &dyn Fetcher,
    sitemap_url: &Url,
    limits: &CrawlLimits,
    extractor: &dyn Extractor,
    queue: &WorkQueue,
    observer: &dyn Observer,
    cancel: &CancellationToken,
) -> Result<usize, Error> {
    let locations = match fetch_with_delay(fetcher, sitemap_url, limits, cancel)
        .await
        .and_then(|xml| parse_sitemap(&xml))
    {
        Ok(locations) => locations,
        Err(e) if e.is_cancelled() => return Err(e),
        Err(e) => {
            let msg = e.to_string();
            observer.on_error(
                sitemap_url.as_str(),
                Severity::Error,
                "failed to load sitemap",
                &[("error", msg.as_str())],
            );
            return Err(e);
        }
    };

    let mut queued = 0;
    for loc in &locations {
        if !extractor.matches_url(loc) {
            continue;
        }

        let url = match Url::parse(loc) {
            Ok(url) => url,
            Err(e) => {
                let msg = e.to_string();
                observer.on_error(loc, Severity::Warn, "invalid solicitation URL", &[("error", msg.as_str())]);
                continue;
            }
        };

        let publisher = extractor.publisher(url.as_str(), observer);
        let request = DetailRequest {
            url,
            publisher: (!publisher.is_empty()).then_some(publisher),
        };

        match queue.push(request, cancel) {
            Ok(()) => {
                queued += 1;
                debug!(url = %loc, "Queued solicitation page");
                observer.on_url_found(1);
            }
            Err(QueueError::Cancelled) => {
                debug!(url = %loc, queued, "Navigation cancelled");
                return Err(Error::Cancelled);
            }
            Err(e) => {
                let msg = e.to_string();
                observer.on_error(loc, Severity::Error, "failed to queue solicitation page", &[("error", msg.as_str())]);
            }
        }
    }

    info!(entries = locations.len(), queued, "Indexed solicitation pages");
    observer.on_navigation_complete();
    Ok(queued)
}
