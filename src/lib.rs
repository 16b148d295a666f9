//! # solipull
//!
//! Discovers comic book solicitation posts on comicreleases.com, extracts
//! one structured record per solicitation and saves them in batches.
//!
//! ## Pipeline
//!
//! ```text
//! sitemap ──> WorkQueue ──> detail pages ──> records ──> dedup ──> batches ──> store
//! ```
//!
//! - [`scrapers`]: the two crawl phases and the [`DataProvider`](scrapers::DataProvider) seam
//! - [`extract`], [`creators`], [`fallback`]: field extraction from page text
//! - [`service`]: the orchestrator that dedups and batches records
//! - [`store`]: persistence backends
//! - [`observer`]: progress and diagnostics notifications
//!
//! ## Example
//!
//! ```no_run
//! use solipull::config::SyncConfig;
//! use solipull::net::HttpFetcher;
//! use solipull::observer::TracingObserver;
//! use solipull::scrapers::{ComicReleasesScraper, ScrapeRequest};
//! use solipull::service::SolicitationService;
//! use solipull::store::MemoryStore;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), solipull::Error> {
//! let config = SyncConfig::default();
//! let fetcher = HttpFetcher::new(&config.user_agent, config.request_timeout())?;
//! let scraper = ComicReleasesScraper::new(&config, Arc::new(fetcher))?;
//! let service = SolicitationService::new(Arc::new(scraper), Arc::new(MemoryStore::new()), &config)?;
//!
//! let request = ScrapeRequest::new(vec!["march".into()], vec!["dc".into()]);
//! let report = service.sync(&request, Arc::new(TracingObserver), &CancellationToken::new()).await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod creators;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod models;
pub mod net;
pub mod observer;
pub mod patterns;
pub mod queue;
pub mod scrapers;
pub mod service;
pub mod store;
pub mod utils;

pub use error::Error;
pub use models::{ComicBook, Creator, Format};
