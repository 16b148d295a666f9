//! String helpers used by the extractors and for logging.
//!
//! - Title-casing of publisher copy, which is usually shouted in capitals
//! - Title normalization for matching solicitation lines against on-sale lists
//! - Truncation of long page fragments before they are attached to log events

use once_cell::sync::Lazy;
use regex::Regex;

static ANNOTATIONS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)|\[[^\]]*\]").unwrap());

/// Title-case a string.
///
/// Every alphabetic character that starts a word is upper-cased and every
/// other character is lower-cased. A character starts a word when it is not
/// preceded by a letter, digit or apostrophe, so `60TH` becomes `60th` and
/// `SPIDER-MAN` becomes `Spider-Man`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(title_case("DETECTIVE COMICS"), "Detective Comics");
/// assert_eq!(title_case("o'NEIL"), "O'neil");
/// ```
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev: Option<char> = None;
    for c in s.chars() {
        let starts_word = match prev {
            None => true,
            Some(p) => !(p.is_alphanumeric() || p == '\'' || p == '’'),
        };
        if starts_word {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        prev = Some(c);
    }
    out
}

/// Normalize a title line for fuzzy comparison.
///
/// Lower-cases, removes parenthetical and bracketed annotations, drops every
/// character that is neither alphanumeric nor whitespace, and collapses runs
/// of whitespace into single spaces.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_title("BATMAN #1 (ON SALE)"), "batman 1");
/// ```
pub fn normalize_title(s: &str) -> String {
    let lower = s.to_lowercase();
    let stripped = ANNOTATIONS.replace_all(&lower, " ");
    let kept: String = stripped
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` bytes (backing off to a character
/// boundary) with an ellipsis and the number of dropped bytes appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("BATMAN "), "Batman ");
        assert_eq!(title_case("ultraman omnibus hc 60TH anniversary"), "Ultraman Omnibus Hc 60th Anniversary");
        assert_eq!(title_case("SPIDER-MAN"), "Spider-Man");
        assert_eq!(title_case("GOTHAM CITY’S FINEST"), "Gotham City’s Finest");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("BATMAN #1"), "batman 1");
        assert_eq!(normalize_title("BATMAN #1 (ON SALE)"), "batman 1");
        assert_eq!(normalize_title("  X-MEN   #3 [DM ONLY] "), "xmen 3");
        assert_eq!(normalize_title(""), "");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let result = truncate_for_log("ééé", 3);
        assert!(result.starts_with('é'));
        assert!(result.contains("(+4 bytes)"));
    }
}
