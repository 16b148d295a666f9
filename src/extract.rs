//! Field extraction from solicitation text.
//!
//! Each extractor method turns one raw text fragment into one attribute.
//! Methods never fail: when a field cannot be found they return an empty
//! value and, where the miss is worth knowing about, notify the observer
//! with a [`Severity::Warn`] event.

use crate::creators::{CreatorParser, Fragment};
use crate::models::{Creator, Format};
use crate::observer::{Observer, Severity};
use crate::patterns::{DATE_GROUP, PAGES_GROUP, PRICE_GROUP, PUBLISHER_GROUP, PatternSet};
use crate::utils::{title_case, truncate_for_log};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Separates the title from the issue number on the summary line.
pub const ISSUE_DELIMITER: char = '#';

/// Accepted release date layouts, tried in order.
const DATE_LAYOUTS: [&str; 2] = ["%m/%d/%y", "%m/%d/%Y"];

static HARDCOVER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:HC|HARDCOVER)\b").unwrap());
static TRADE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:TP|TPB)\b").unwrap());

/// Capability interface for turning solicitation text into record fields.
pub trait Extractor: Send + Sync {
    fn matches_url(&self, url: &str) -> bool;
    fn title(&self, s: &str, observer: &dyn Observer) -> String;
    fn issue(&self, s: &str) -> String;
    fn format(&self, s: &str) -> Option<Format>;
    fn pages(&self, s: &str, observer: &dyn Observer) -> String;
    fn price(&self, s: &str, observer: &dyn Observer) -> String;
    fn publisher(&self, s: &str, observer: &dyn Observer) -> String;
    fn creators(&self, fragments: &[Fragment]) -> Vec<Creator>;
    fn release_date(&self, s: &str, observer: &dyn Observer) -> Option<NaiveDate>;
}

/// Extractor tuned for comicreleases.com solicitation pages.
#[derive(Debug, Clone)]
pub struct ComicReleasesExtractor {
    patterns: PatternSet,
    creators: CreatorParser,
}

impl ComicReleasesExtractor {
    pub fn new(patterns: PatternSet, creators: CreatorParser) -> Self {
        Self { patterns, creators }
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }
}

impl Extractor for ComicReleasesExtractor {
    fn matches_url(&self, url: &str) -> bool {
        self.patterns.matches_url(url)
    }

    fn title(&self, s: &str, observer: &dyn Observer) -> String {
        let head = s.split(ISSUE_DELIMITER).next().unwrap_or_default().trim();
        if head.is_empty() {
            observer.on_error("title", Severity::Warn, "title not found", &[("string", s)]);
            return String::new();
        }
        title_case(head)
    }

    fn issue(&self, s: &str) -> String {
        match s.split(ISSUE_DELIMITER).nth(1) {
            Some(issue) => title_case(issue.trim()),
            None => String::new(),
        }
    }

    fn format(&self, s: &str) -> Option<Format> {
        if HARDCOVER.is_match(s) {
            Some(Format::Hardcover)
        } else if TRADE.is_match(s) {
            Some(Format::Trade)
        } else if !self.issue(s).is_empty() {
            Some(Format::Single)
        } else {
            None
        }
    }

    fn pages(&self, s: &str, observer: &dyn Observer) -> String {
        capture(&self.patterns.pages, PAGES_GROUP, s, "pages", observer).unwrap_or_default()
    }

    fn price(&self, s: &str, observer: &dyn Observer) -> String {
        capture(&self.patterns.price, PRICE_GROUP, s, "price", observer).unwrap_or_default()
    }

    fn publisher(&self, s: &str, observer: &dyn Observer) -> String {
        capture(&self.patterns.publisher, PUBLISHER_GROUP, s, "publisher", observer)
            .map(|p| p.to_lowercase())
            .unwrap_or_default()
    }

    fn creators(&self, fragments: &[Fragment]) -> Vec<Creator> {
        self.creators.parse(fragments)
    }

    fn release_date(&self, s: &str, observer: &dyn Observer) -> Option<NaiveDate> {
        let raw = capture(&self.patterns.release_date, DATE_GROUP, s, "release_date", observer)?;

        let parsed = parse_date(&raw);
        if parsed.is_none() {
            let snippet = truncate_for_log(s, 200);
            observer.on_error(
                "release_date",
                Severity::Warn,
                "failed to parse release date",
                &[("string", snippet.as_str())],
            );
        }
        parsed
    }
}

/// Parse a `M/D/YY` or `M/D/YYYY` date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(raw, layout).ok())
}

fn capture(re: &Regex, group: &str, s: &str, field: &str, observer: &dyn Observer) -> Option<String> {
    if !re.capture_names().flatten().any(|name| name == group) {
        observer.on_error(field, Severity::Warn, "pattern has no capture group", &[("group", group)]);
        return None;
    }

    let Some(caps) = re.captures(s) else {
        let snippet = truncate_for_log(s, 200);
        observer.on_error(field, Severity::Warn, "no match found", &[("string", snippet.as_str())]);
        return None;
    };

    caps.name(group).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::testing::RecordingObserver;

    fn extractor() -> ComicReleasesExtractor {
        let patterns = PatternSet::new(&["march"], &["dc", "marvel"], 2026).unwrap();
        ComicReleasesExtractor::new(patterns, CreatorParser::default())
    }

    #[test]
    fn test_title_and_issue() {
        let ex = extractor();
        let obs = RecordingObserver::default();
        assert_eq!(ex.title("BATMAN #1", &obs), "Batman");
        assert_eq!(ex.issue("BATMAN #1"), "1");
        assert_eq!(ex.title("batman", &obs), "Batman");
        assert_eq!(ex.issue("batman"), "");
        assert!(obs.messages().is_empty());
    }

    #[test]
    fn test_issue_keeps_trailing_qualifiers() {
        let ex = extractor();
        assert_eq!(ex.issue("X-MEN #1 FACSIMILE EDITION"), "1 Facsimile Edition");
        assert_eq!(ex.issue("DETECTIVE COMICS #1107"), "1107");
    }

    #[test]
    fn test_empty_title_is_reported() {
        let ex = extractor();
        let obs = RecordingObserver::default();
        assert_eq!(ex.title("#12", &obs), "");
        assert_eq!(ex.title("   ", &obs), "");
        assert_eq!(obs.messages(), vec!["title not found", "title not found"]);
    }

    #[test]
    fn test_pages() {
        let ex = extractor();
        let obs = RecordingObserver::default();
        assert_eq!(ex.pages("32 pages", &obs), "32");
        assert_eq!(ex.pages("800 PGS./Rated T+ …$125.00", &obs), "800");
        assert_eq!(ex.pages("$4.99 US | 40 pages | Variant $5.99 US", &obs), "40");
        assert!(obs.messages().is_empty());

        assert_eq!(ex.pages("no page count here", &obs), "");
        assert_eq!(obs.messages(), vec!["no match found"]);
    }

    #[test]
    fn test_price_keeps_currency_sign() {
        let ex = extractor();
        let obs = RecordingObserver::default();
        assert_eq!(ex.price("$4.99 US | 32 pages | Variant $5.99 US", &obs), "$4.99");
        assert_eq!(ex.price("free!", &obs), "");
        assert_eq!(obs.messages().len(), 1);
    }

    #[test]
    fn test_publisher_from_url() {
        let ex = extractor();
        let obs = RecordingObserver::default();
        assert_eq!(
            ex.publisher("https://www.comicreleases.com/2025/12/Marvel-march-2026-solicitations/", &obs),
            "marvel"
        );
        assert_eq!(ex.publisher("https://www.comicreleases.com/about/", &obs), "");
        assert_eq!(obs.messages().len(), 1);
    }

    #[test]
    fn test_release_date_layouts() {
        let ex = extractor();
        let obs = RecordingObserver::default();
        assert_eq!(ex.release_date("On Sale: 3/4/26", &obs), NaiveDate::from_ymd_opt(2026, 3, 4));
        assert_eq!(ex.release_date("On Sale: 03/11/2026", &obs), NaiveDate::from_ymd_opt(2026, 3, 11));
        assert!(obs.messages().is_empty());
    }

    #[test]
    fn test_release_date_absent_is_reported() {
        let ex = extractor();
        let obs = RecordingObserver::default();
        assert_eq!(ex.release_date("For the first time ever", &obs), None);
        assert_eq!(obs.messages(), vec!["no match found"]);
    }

    #[test]
    fn test_release_date_unparseable_is_reported() {
        let ex = extractor();
        let obs = RecordingObserver::default();
        assert_eq!(ex.release_date("On Sale: 13/45/26", &obs), None);
        assert_eq!(obs.messages(), vec!["failed to parse release date"]);
    }

    #[test]
    fn test_format() {
        let ex = extractor();
        assert_eq!(ex.format("ULTRAMAN OMNIBUS HC 60TH ANNIVERSARY COVER"), Some(Format::Hardcover));
        assert_eq!(ex.format("ABSOLUTE BATMAN VOL. 1 TP"), Some(Format::Trade));
        assert_eq!(ex.format("BATMAN #1"), Some(Format::Single));
        assert_eq!(ex.format("BATMAN: THE LONG HALLOWEEN"), None);
    }

    #[test]
    fn test_capture_without_named_group_is_reported() {
        let obs = RecordingObserver::default();
        let re = Regex::new(r"\d+").unwrap();
        assert_eq!(capture(&re, "pages", "32 pages", "pages", &obs), None);
        assert_eq!(obs.messages(), vec!["pattern has no capture group"]);
    }

    #[test]
    fn test_matches_url_delegates_to_patterns() {
        let ex = extractor();
        assert!(ex.matches_url("dc-march-2026-solicitations"));
        assert!(!ex.matches_url("image-march-2026-solicitations"));
        assert!(ex.patterns().url_pattern().is_some());
    }
}
