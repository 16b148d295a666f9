//! Release date recovery for layouts that omit the date inline.
//!
//! Some solicitation pages list dates separately, in blocks like
//!
//! ```text
//! <div>
//!   <p>FOC 01/26/26, <strong>ON-SALE 03/11/26</strong></p>
//!   <ul><li>BATMAN #1</li><li>SUPERMAN #4</li></ul>
//! </div>
//! ```
//!
//! A record is matched to such a list by normalized title, not by position.

use crate::extract::Extractor;
use crate::observer::{Observer, Severity};
use crate::utils::normalize_title;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};

static LIST_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("li").unwrap());
static ON_SALE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)ON[-\s]SALE").unwrap());

/// Markers identifying a block of release date lists.
const DATE_LIST_MARKERS: [&str; 2] = ["ON-SALE", "FOC"];

/// Look up the release date for `title_line` in the date lists next to `block`.
///
/// # Arguments
///
/// * `block` - The solicitation block the record was built from
/// * `title_line` - Raw text of the block's summary line, e.g. `BATMAN #1`
///
/// # Returns
///
/// The first date found for a matching list item, or `None` after
/// reporting a warning to the observer.
pub fn resolve_release_date(
    block: ElementRef<'_>,
    title_line: &str,
    extractor: &dyn Extractor,
    observer: &dyn Observer,
) -> Option<NaiveDate> {
    let wanted = normalize_title(title_line);

    if !wanted.is_empty() {
        for sibling in date_list_siblings(block) {
            let matched = sibling
                .select(&LIST_ITEM)
                .any(|li| normalize_title(&li.text().collect::<String>()) == wanted);
            if !matched {
                continue;
            }

            let text: String = sibling.text().collect();
            let date = match ON_SALE.find(&text) {
                Some(m) => extractor
                    .release_date(&text[m.end()..], observer)
                    .or_else(|| extractor.release_date(&text, observer)),
                None => extractor.release_date(&text, observer),
            };
            if date.is_some() {
                return date;
            }
        }
    }

    observer.on_error(
        "release_date",
        Severity::Warn,
        "release date not found",
        &[("title", title_line.trim())],
    );
    None
}

fn date_list_siblings(block: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let Some(parent) = block.parent() else {
        return Vec::new();
    };

    parent
        .children()
        .filter(|node| node.id() != block.id())
        .filter_map(ElementRef::wrap)
        .filter(|el| {
            let text = el.text().collect::<String>().to_uppercase();
            DATE_LIST_MARKERS.iter().any(|marker| text.contains(marker))
        })
        .collect()
}
