//! HTTP fetching with per-phase politeness limits.
//!
//! # Politeness
//!
//! Each crawl phase has its own [`CrawlLimits`]: a fixed number of requests
//! in flight and a random delay of up to `random_delay_ms` before every
//! request. The delay spreads requests out; it plays no part in correctness.
//!
//! # Cancellation
//!
//! [`fetch_with_delay`] checks the cancellation token before starting and
//! races both the delay and the request against it, so a cancelled session
//! neither starts new requests nor waits for in-flight ones.

use crate::error::Error;
use async_trait::async_trait;
use rand::{Rng, rng};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use url::Url;

/// Parallelism and delay settings for one crawl phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CrawlLimits {
    /// Maximum number of concurrent requests.
    pub parallelism: usize,
    /// Upper bound of the random delay before each request.
    pub random_delay_ms: u64,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            parallelism: 5,
            random_delay_ms: 5_000,
        }
    }
}

impl CrawlLimits {
    pub fn new(parallelism: usize, random_delay_ms: u64) -> Self {
        Self {
            parallelism,
            random_delay_ms,
        }
    }

    /// Pick the delay to wait before the next request.
    pub fn jitter(&self) -> Duration {
        if self.random_delay_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rng().random_range(0..=self.random_delay_ms))
    }
}

/// Something that can turn a URL into a response body.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, Error>;
}

/// [`Fetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher sending `user_agent` and giving up after `timeout`.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url) -> Result<String, Error> {
        let t0 = Instant::now();
        let res = self.client.get(url.clone()).send().await?.error_for_status()?;
        let body = res.text().await?;
        debug!(bytes = body.len(), elapsed_ms = t0.elapsed().as_millis() as u64, "Fetched page");
        Ok(body)
    }
}

/// Wait a random delay, then fetch `url`, unless `cancel` fires first.
///
/// # Errors
///
/// [`Error::Cancelled`] when the token is cancelled before or during the
/// request; otherwise whatever the fetcher returned.
pub async fn fetch_with_delay(
    fetcher: &dyn Fetcher,
    url: &Url,
    limits: &CrawlLimits,
    cancel: &CancellationToken,
) -> Result<String, Error> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let delay = limits.jitter();
    if !delay.is_zero() {
        tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            _ = sleep(delay) => {}
        }
    }

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    tokio::select! {
        _ = cancel.cancelled() => {
            warn!(%url, "Request aborted by cancellation");
            Err(Error::Cancelled)
        }
        res = fetcher.fetch(url) => res,
    }
}
