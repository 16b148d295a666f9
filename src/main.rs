//! # solipull
//!
//! Scrapes upcoming comic book solicitations from comicreleases.com and
//! keeps them in a local JSON store.
//!
//! ## Usage
//!
//! ```sh
//! solipull sync -m march -p dc,marvel
//! solipull list -p dc
//! ```
//!
//! ## Architecture
//!
//! 1. **Navigation**: read the sitemap and queue matching solicitation posts
//! 2. **Scraping**: fetch each post and extract one record per solicitation
//! 3. **Persistence**: dedup the records and save them in batches
//!
//! Ctrl-C cancels a running sync; batches already saved are kept.

use clap::Parser;
use solipull::config::{ALLOWED_MONTHS, ALLOWED_PUBLISHERS, SyncConfig, parse_list};
use solipull::net::HttpFetcher;
use solipull::observer::TracingObserver;
use solipull::scrapers::{ComicReleasesScraper, ScrapeRequest};
use solipull::service::SolicitationService;
use solipull::store::{JsonStore, Persistence};
use std::error::Error;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();

    let args = Cli::parse();
    debug!(?args.config, store = %args.store, "Parsed CLI arguments");

    let config = match &args.config {
        Some(path) => SyncConfig::load(path).await?,
        None => SyncConfig::default(),
    };
    let store = Arc::new(JsonStore::in_dir(&args.store));

    match args.command {
        Command::Sync { months, publishers } => sync(&config, store, &months, &publishers).await?,
        Command::List { publisher } => list(store.as_ref(), publisher.as_deref()).await?,
    }

    info!(elapsed_ms = start_time.elapsed().as_millis() as u64, "solipull finished");
    Ok(())
}

async fn sync(
    config: &SyncConfig,
    store: Arc<JsonStore>,
    months: &[String],
    publishers: &[String],
) -> Result<(), Box<dyn Error>> {
    let request = ScrapeRequest::new(
        parse_list("month", months, &ALLOWED_MONTHS)?,
        parse_list("publisher", publishers, &ALLOWED_PUBLISHERS)?,
    );
    info!(months = ?request.months, publishers = ?request.publishers, path = %store.path().display(), "Starting sync");

    let fetcher = HttpFetcher::new(&config.user_agent, config.request_timeout())?;
    let scraper = ComicReleasesScraper::new(config, Arc::new(fetcher))?;
    let service = SolicitationService::new(Arc::new(scraper), store, config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling sync");
            on_interrupt.cancel();
        }
    });

    match service.sync(&request, Arc::new(TracingObserver), &cancel).await {
        Ok(report) => {
            println!("{report}");
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            warn!("Sync cancelled; previously saved batches are kept");
            Err(e.into())
        }
        Err(e) => {
            error!(error = %e, "Sync failed");
            Err(e.into())
        }
    }
}

async fn list(store: &JsonStore, publisher: Option<&str>) -> Result<(), Box<dyn Error>> {
    let mut comics = store.get_all().await?;
    if let Some(publisher) = publisher {
        let publisher = publisher.to_lowercase();
        comics.retain(|c| c.publisher == publisher);
    }
    comics.sort_by(|a, b| {
        a.release_date
            .cmp(&b.release_date)
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.issue.cmp(&b.issue))
    });

    for comic in &comics {
        println!("{comic}");
    }
    info!(count = comics.len(), path = %store.path().display(), "Listed stored solicitations");
    Ok(())
}
