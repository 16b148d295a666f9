//! Session-scoped match patterns.
//!
//! A [`PatternSet`] is compiled once from the requested months and
//! publishers and never changes afterwards. Every session owns its own set,
//! so two syncs with different inputs can run side by side.
//!
//! # URL pattern
//!
//! Solicitation pages live at URLs such as
//! `https://www.comicreleases.com/2025/12/marvel-march-2026-solicitations/`.
//! The URL pattern accepts `<publisher>-<month>-<year>-solicitations` where
//! year is the current year or the next one, case-insensitively.

use chrono::{Datelike, Local};
use itertools::Itertools;
use regex::Regex;

/// Named capture group holding the page count.
pub const PAGES_GROUP: &str = "pages";
/// Named capture group holding the price.
pub const PRICE_GROUP: &str = "price";
/// Named capture group holding the publisher slug.
pub const PUBLISHER_GROUP: &str = "publisher";
/// Named capture group holding the release date.
pub const DATE_GROUP: &str = "date";

/// Compiled patterns for one scrape session.
#[derive(Debug, Clone)]
pub struct PatternSet {
    /// `None` when months or publishers were empty: nothing matches.
    url: Option<Regex>,
    pub publisher: Regex,
    pub pages: Regex,
    pub price: Regex,
    pub release_date: Regex,
}

impl PatternSet {
    /// Build the patterns for the given months, publishers and base year.
    ///
    /// # Arguments
    ///
    /// * `months` - Lowercase month names, e.g. `["march"]`
    /// * `publishers` - Publisher slugs, e.g. `["dc", "marvel"]`
    /// * `year` - First year of the two-year window
    ///
    /// # Returns
    ///
    /// The compiled set. With an empty `months` or `publishers` list the URL
    /// pattern matches nothing.
    pub fn new<M, P>(months: &[M], publishers: &[P], year: i32) -> Result<Self, regex::Error>
    where
        M: AsRef<str>,
        P: AsRef<str>,
    {
        let url = match url_pattern(months, publishers, year) {
            Some(p) => Some(Regex::new(&p)?),
            None => None,
        };

        Ok(Self {
            url,
            publisher: Regex::new(r"(?i)(?:^|/)(?P<publisher>\w+)-[a-z]+-\d{4}-solicitations")?,
            pages: Regex::new(r"(?i)(?P<pages>\d+)\s*(?:pages?|pgs?)\b")?,
            price: Regex::new(r"(?P<price>\$\d+\.\d{2})")?,
            release_date: Regex::new(r"(?P<date>\d{1,2}/\d{1,2}/\d{2,4})")?,
        })
    }

    /// Build the patterns using the local current year as the window start.
    pub fn current<M, P>(months: &[M], publishers: &[P]) -> Result<Self, regex::Error>
    where
        M: AsRef<str>,
        P: AsRef<str>,
    {
        Self::new(months, publishers, Local::now().year())
    }

    /// Test whether a sitemap location points at a wanted solicitation page.
    pub fn matches_url(&self, url: &str) -> bool {
        self.url.as_ref().is_some_and(|re| re.is_match(url))
    }

    /// The URL pattern source, if any. Mostly useful for logging.
    pub fn url_pattern(&self) -> Option<&str> {
        self.url.as_ref().map(|re| re.as_str())
    }
}

fn url_pattern<M, P>(months: &[M], publishers: &[P], year: i32) -> Option<String>
where
    M: AsRef<str>,
    P: AsRef<str>,
{
    if months.is_empty() || publishers.is_empty() {
        return None;
    }

    let m = months.iter().map(|m| regex::escape(m.as_ref())).join("|");
    let p = publishers.iter().map(|p| regex::escape(p.as_ref())).join("|");
    Some(format!(
        r"(?i)(?:^|/)({})-({})-({}|{})-solicitations(?:[/?#]|$)",
        p,
        m,
        year,
        year + 1
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(months: &[&str], publishers: &[&str]) -> PatternSet {
        PatternSet::new(months, publishers, 2026).unwrap()
    }

    #[test]
    fn test_url_matches_configured_combination() {
        let p = set(&["march"], &["dc"]);
        assert!(p.matches_url("dc-march-2026-solicitations"));
        assert!(p.matches_url("https://www.comicreleases.com/2025/12/dc-march-2026-solicitations/"));
        assert!(p.matches_url("https://www.comicreleases.com/2026/12/DC-March-2027-Solicitations/"));
    }

    #[test]
    fn test_url_rejects_other_publisher() {
        let p = set(&["march"], &["marvel"]);
        assert!(!p.matches_url("dc-march-2026-solicitations"));
        assert!(p.matches_url("marvel-march-2026-solicitations"));
    }

    #[test]
    fn test_url_rejects_out_of_window_years_and_months() {
        let p = set(&["march", "april"], &["dc", "image"]);
        assert!(!p.matches_url("dc-march-2025-solicitations"));
        assert!(!p.matches_url("dc-march-2028-solicitations"));
        assert!(!p.matches_url("dc-may-2026-solicitations"));
        assert!(p.matches_url("image-april-2027-solicitations"));
    }

    #[test]
    fn test_url_rejects_embedded_publisher_names() {
        let p = set(&["march"], &["dc"]);
        assert!(!p.matches_url("https://example.com/abcdc-march-2026-solicitations/"));
        assert!(!p.matches_url("https://example.com/dc-march-2026-solicitations-recap/"));
    }

    #[test]
    fn test_empty_inputs_match_nothing() {
        let no_months = set(&[], &["dc"]);
        let no_publishers = set(&["march"], &[]);
        for p in [&no_months, &no_publishers] {
            assert!(p.url_pattern().is_none());
            assert!(!p.matches_url("dc-march-2026-solicitations"));
            assert!(!p.matches_url(""));
            assert!(!p.matches_url("anything at all"));
        }
    }

    #[test]
    fn test_inputs_are_escaped() {
        let p = set(&["march"], &["d.c"]);
        assert!(!p.matches_url("dxc-march-2026-solicitations"));
        assert!(p.matches_url("d.c-march-2026-solicitations"));
    }

    #[test]
    fn test_sub_field_patterns_have_named_groups() {
        let p = set(&["march"], &["dc"]);
        let pages = p.pages.captures("$4.99 US | 32 pages").unwrap();
        assert_eq!(&pages[PAGES_GROUP], "32");
        let price = p.price.captures("800 PGS./Rated T+ …$125.00").unwrap();
        assert_eq!(&price[PRICE_GROUP], "$125.00");
        let date = p.release_date.captures("On Sale: 3/25/26").unwrap();
        assert_eq!(&date[DATE_GROUP], "3/25/26");
        let publisher = p
            .publisher
            .captures("https://www.comicreleases.com/2025/12/marvel-march-2026-solicitations/")
            .unwrap();
        assert_eq!(&publisher[PUBLISHER_GROUP], "marvel");
    }

    #[test]
    fn test_current_uses_local_year() {
        let year = Local::now().year();
        let p = PatternSet::current(&["june"], &["dc"]).unwrap();
        assert!(p.matches_url(&format!("dc-june-{}-solicitations", year)));
        assert!(p.matches_url(&format!("dc-june-{}-solicitations", year + 1)));
        assert!(!p.matches_url(&format!("dc-june-{}-solicitations", year - 1)));
    }
}
