//! Solicitation page scraping: the second crawl phase.
//!
//! Every solicitation on a page is a `div.wp-block-columns` block whose
//! paragraphs follow a loose convention:
//!
//! | Paragraph | Content | Fields |
//! |-----------|---------|--------|
//! | 0 | `BATMAN #1` | title, issue, format |
//! | 1 | credits, then `$4.99 US \| 40 pages` | creators, price, pages |
//! | 2 | `On Sale: 3/4/26` | release date |
//!
//! Blocks with fewer than two paragraphs are layout furniture and are
//! skipped. When the third paragraph is missing or carries no date, the
//! date lists elsewhere on the page are consulted
//! (see [`resolve_release_date`]).

use crate::creators::Fragment;
use crate::error::Error;
use crate::extract::Extractor;
use crate::fallback::resolve_release_date;
use crate::models::{ComicBook, RunStats};
use crate::net::{CrawlLimits, Fetcher, fetch_with_delay};
use crate::observer::{Observer, Severity};
use crate::queue::{DetailRequest, QueueDrain};
use futures::StreamExt;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

static BLOCK: Lazy<Selector> = Lazy::new(|| Selector::parse("div.wp-block-columns").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// Extract every solicitation on a page.
///
/// Parsing is synchronous so the document never lives across an await.
///
/// # Arguments
///
/// * `html` - Page body
/// * `publisher` - Slug stamped on every record from this page
///
/// # Returns
///
/// One [`ComicBook`] per qualifying block, in document order.
pub fn parse_page(html: &str, publisher: &str, extractor: &dyn Extractor, observer: &dyn Observer) -> Vec<ComicBook> {
    let document = Html::parse_document(html);
    document
        .select(&BLOCK)
        .filter_map(|block| parse_block(block, publisher, extractor, observer))
        .collect()
}

fn parse_block(
    block: ElementRef<'_>,
    publisher: &str,
    extractor: &dyn Extractor,
    observer: &dyn Observer,
) -> Option<ComicBook> {
    let lines: Vec<ElementRef<'_>> = block.select(&PARAGRAPH).collect();
    if lines.len() < 2 {
        return None;
    }

    let summary = element_text(lines[0]);
    let details = element_text(lines[1]);

    let release_date = lines
        .get(2)
        .and_then(|line| extractor.release_date(&element_text(*line), observer))
        .or_else(|| resolve_release_date(block, &summary, extractor, observer));

    Some(ComicBook {
        title: extractor.title(&summary, observer),
        issue: extractor.issue(&summary),
        format: extractor.format(&summary),
        pages: extractor.pages(&details, observer),
        price: extractor.price(&details, observer),
        creators: extractor.creators(&Fragment::children_of(lines[1])),
        publisher: publisher.to_string(),
        release_date,
    })
}

/// Text of `element` with inline markup dropped and `<br>` read as a space.
fn element_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => raw.push_str(text),
            Node::Element(el) if el.name().eq_ignore_ascii_case("br") => raw.push(' '),
            _ => {}
        }
    }
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drains the work queue and streams records to the orchestrator.
pub struct DetailCrawler<'a> {
    pub fetcher: &'a dyn Fetcher,
    pub limits: &'a CrawlLimits,
    pub extractor: &'a dyn Extractor,
    pub observer: &'a dyn Observer,
    pub stats: &'a RunStats,
    pub cancel: &'a CancellationToken,
    pub results: &'a mpsc::Sender<ComicBook>,
}

impl DetailCrawler<'_> {
    /// Scrape every queued page with at most `limits.parallelism` in flight.
    ///
    /// Returns once the queue is drained; failed pages have already been
    /// reported to the observer. Completion is only signalled when the
    /// crawl was not cancelled.
    #[instrument(level = "info", skip_all, fields(parallelism = self.limits.parallelism))]
    pub async fn run(&self, drain: QueueDrain) {
        drain
            .into_stream()
            .map(|request| self.scrape(request))
            .buffer_unordered(self.limits.parallelism.max(1))
            .for_each(|_| async {})
            .await;

        if self.cancel.is_cancelled() {
            info!(pages = self.stats.pages_scraped(), "Detail crawl cancelled");
            return;
        }
        info!(pages = self.stats.pages_scraped(), "Detail pages drained");
        self.observer.on_scraping_complete();
    }

    async fn scrape(&self, request: DetailRequest) {
        let body = match fetch_with_delay(self.fetcher, &request.url, self.limits, self.cancel).await {
            Ok(body) => body,
            Err(Error::Cancelled) => return,
            Err(e) => {
                let msg = e.to_string();
                self.observer.on_error(
                    request.url.as_str(),
                    Severity::Error,
                    "failed to fetch solicitation page",
                    &[("error", msg.as_str())],
                );
                return;
            }
        };
        self.stats.add_page_scraped();

        let publisher = match request.publisher {
            Some(publisher) => publisher,
            None => self.extractor.publisher(request.url.as_str(), self.observer),
        };
        let comics = parse_page(&body, &publisher, self.extractor, self.observer);
        debug!(url = %request.url, count = comics.len(), "Parsed solicitation page");

        for comic in comics {
            if self.results.send(comic).await.is_err() {
                debug!(url = %request.url, "Result stream closed, dropping remaining records");
                return;
            }
            self.observer.on_comic_book_scraped(1);
        }
    }
}
