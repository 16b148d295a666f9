//! Runtime configuration and input validation.
//!
//! [`SyncConfig`] holds the tunables of a sync: where the sitemap lives,
//! how politely each crawl phase behaves and how records are batched. It can
//! be loaded from a YAML file; every field is optional and falls back to
//! [`SyncConfig::default`].
//!
//! ```yaml
//! sitemap_url: https://www.comicreleases.com/sitemap.xml
//! batch_size: 50
//! detail:
//!   parallelism: 3
//!   random_delay_ms: 2000
//! ```

use crate::creators::DEFAULT_ROLES;
use crate::error::Error;
use crate::net::CrawlLimits;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_SITEMAP_URL: &str = "https://www.comicreleases.com/sitemap.xml";

/// Months accepted on the command line.
pub const ALLOWED_MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Publisher slugs accepted on the command line.
pub const ALLOWED_PUBLISHERS: [&str; 3] = ["dc", "marvel", "image"];

/// Tunables for one sync.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub sitemap_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Maximum number of solicitation pages queued by one sitemap pass.
    pub queue_capacity: usize,
    /// Records per persistence call.
    pub batch_size: usize,
    /// Capacity of the channel between the crawler and the batching consumer.
    pub result_buffer: usize,
    /// Limits for the sitemap fetch.
    pub list: CrawlLimits,
    /// Limits for solicitation page fetches.
    pub detail: CrawlLimits,
    /// Creator roles recognised in credit lines.
    pub roles: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sitemap_url: DEFAULT_SITEMAP_URL.to_string(),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: 30,
            queue_capacity: 10_000,
            batch_size: 100,
            result_buffer: 100,
            list: CrawlLimits::new(1, 0),
            detail: CrawlLimits::default(),
            roles: DEFAULT_ROLES.iter().map(|r| r.to_string()).collect(),
        }
    }
}

impl SyncConfig {
    /// Load from a YAML file and validate.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let config: SyncConfig = serde_yaml::from_str(&raw)?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Reject values that would make a sync meaningless or hang.
    pub fn validate(&self) -> Result<(), Error> {
        Url::parse(&self.sitemap_url)?;

        let positive = [
            ("queue_capacity", self.queue_capacity),
            ("batch_size", self.batch_size),
            ("result_buffer", self.result_buffer),
            ("list.parallelism", self.list.parallelism),
            ("detail.parallelism", self.detail.parallelism),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(Error::Config(format!("{name} must be greater than zero")));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be greater than zero".into()));
        }
        if self.roles.iter().all(|r| r.trim().is_empty()) {
            return Err(Error::Config("at least one creator role is required".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Split a comma-separated flag value and check it against `allowed`.
///
/// Values are trimmed and lowercased.
///
/// # Errors
///
/// [`Error::Config`] for an empty list, a value outside `allowed`, or a
/// value given twice.
pub fn parse_list(flag: &str, raw: &[String], allowed: &[&str]) -> Result<Vec<String>, Error> {
    let mut seen = HashSet::new();
    let mut values = Vec::new();

    for value in raw.iter().flat_map(|r| r.split(',')) {
        let value = value.trim().to_lowercase();
        if value.is_empty() {
            continue;
        }
        if !allowed.contains(&value.as_str()) {
            return Err(Error::Config(format!(
                "invalid {flag} '{value}', expected one of: {}",
                allowed.join(", ")
            )));
        }
        if !seen.insert(value.clone()) {
            return Err(Error::Config(format!("duplicate {flag} '{value}'")));
        }
        values.push(value);
    }

    if values.is_empty() {
        return Err(Error::Config(format!("at least one {flag} is required")));
    }
    Ok(values)
}
