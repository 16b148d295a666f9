//! Data models for scraped solicitations.
//!
//! This module defines the records produced by the detail crawler:
//! - [`ComicBook`]: one solicitation, built once per content block
//! - [`Creator`]: a credited person and the role they were listed under
//! - [`Format`]: coarse publication format derived from the title line
//! - [`RunStats`]: per-session counters updated from concurrent page handlers

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A single solicitation as scraped from a detail page.
///
/// Records are assembled inside the detail page handler and never mutated
/// afterwards. Fields that could not be extracted are left empty (or
/// `None`) rather than failing the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComicBook {
    /// Title-cased series or collection title.
    pub title: String,
    /// Issue designation; empty for collected editions.
    pub issue: String,
    /// Page count as printed, without the unit.
    pub pages: String,
    /// Cover price including the currency sign, e.g. `$4.99`.
    pub price: String,
    pub format: Option<Format>,
    /// Lowercase publisher slug, e.g. `dc`.
    pub publisher: String,
    /// Credits in document order.
    #[serde(default)]
    pub creators: Vec<Creator>,
    pub release_date: Option<NaiveDate>,
}

impl ComicBook {
    /// Derive the in-memory identity used for duplicate detection.
    ///
    /// The identity joins title, issue, format and release date with `|`.
    /// Absent format or date contribute an empty segment, so an undated
    /// record never collides with a dated one.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // "Batman|1|single|2026-03-04"
    /// let id = comic.id();
    /// ```
    pub fn id(&self) -> String {
        let format = self.format.map(|f| f.as_str()).unwrap_or_default();
        let date = self
            .release_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        format!("{}|{}|{}|{}", self.title, self.issue, format, date)
    }

    /// Key used by stores for idempotent writes: title, issue, publisher and release date.
    pub fn store_key(&self) -> (String, String, String, Option<NaiveDate>) {
        (
            self.title.clone(),
            self.issue.clone(),
            self.publisher.clone(),
            self.release_date,
        )
    }
}

impl fmt::Display for ComicBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if !self.issue.is_empty() {
            write!(f, " #{}", self.issue)?;
        }
        write!(f, " [{}]", self.publisher)?;
        match self.release_date {
            Some(d) => write!(f, " on sale {}", d),
            None => write!(f, " (no date)"),
        }
    }
}

/// A credited creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub name: String,
    /// One of the configured role names, e.g. `writer` or `cover artist`.
    pub role: String,
}

impl Creator {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
        }
    }
}

/// Publication format tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Single,
    Trade,
    Hardcover,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Single => "single",
            Format::Trade => "trade",
            Format::Hardcover => "hardcover",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters owned by one scrape session.
///
/// All counters only ever increase while a session runs; [`RunStats::reset`]
/// is called once when a new session starts.
#[derive(Debug, Default)]
pub struct RunStats {
    urls_found: AtomicUsize,
    pages_scraped: AtomicUsize,
    comics_scraped: AtomicUsize,
    errors: AtomicUsize,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) {
        self.urls_found.store(0, Ordering::Relaxed);
        self.pages_scraped.store(0, Ordering::Relaxed);
        self.comics_scraped.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }

    pub fn add_urls_found(&self, n: usize) {
        self.urls_found.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_page_scraped(&self) {
        self.pages_scraped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_comics_scraped(&self, n: usize) {
        self.comics_scraped.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn urls_found(&self) -> usize {
        self.urls_found.load(Ordering::Relaxed)
    }

    pub fn pages_scraped(&self) -> usize {
        self.pages_scraped.load(Ordering::Relaxed)
    }

    pub fn comics_scraped(&self) -> usize {
        self.comics_scraped.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }
}
