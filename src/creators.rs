//! Credit line parsing.
//!
//! The metadata paragraph of a solicitation lists credits one per line,
//! separated by `<br>` tags:
//!
//! ```text
//! Writer(s): TOM TAYLOR<br>
//! Artist(s): PETE WOODS<br>
//! Cover Artist(s): MIKEL JANIN<br>
//! ```
//!
//! The paragraph's child nodes are handed over as [`Fragment`]s so the
//! parser does not depend on any particular HTML library.

use crate::models::Creator;
use crate::utils::title_case;
use scraper::{ElementRef, Node};

/// Roles recognised when no vocabulary is configured.
pub const DEFAULT_ROLES: [&str; 3] = ["writer", "artist", "cover artist"];

/// One child node of a metadata paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    LineBreak,
}

impl Fragment {
    /// Flatten the direct children of an element into fragments.
    pub fn children_of(element: ElementRef<'_>) -> Vec<Fragment> {
        element
            .children()
            .filter_map(|child| match child.value() {
                Node::Text(text) => Some(Fragment::Text(text.to_string())),
                Node::Element(el) if el.name().eq_ignore_ascii_case("br") => Some(Fragment::LineBreak),
                Node::Element(_) => ElementRef::wrap(child).map(|e| Fragment::Text(e.text().collect())),
                _ => None,
            })
            .collect()
    }
}

/// Matches role-prefixed lines against a fixed role vocabulary.
#[derive(Debug, Clone)]
pub struct CreatorParser {
    roles: Vec<String>,
}

impl Default for CreatorParser {
    fn default() -> Self {
        Self::new(DEFAULT_ROLES)
    }
}

impl CreatorParser {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(|r| r.into().to_lowercase()).collect(),
        }
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Parse credits out of a paragraph's fragments.
    ///
    /// Every fragment is tested against every role. A line such as
    /// `writer: TOM KING, TOM TAYLOR` yields one [`Creator`] per name.
    /// Fragments without a known role prefix are ignored.
    pub fn parse(&self, fragments: &[Fragment]) -> Vec<Creator> {
        let mut results = Vec::new();

        for fragment in fragments {
            let Fragment::Text(text) = fragment else {
                continue;
            };
            let line = text.trim().to_lowercase();

            for role in &self.roles {
                if !line.starts_with(role.as_str()) {
                    continue;
                }
                let Some((_, names)) = line.split_once(':') else {
                    continue;
                };

                results.extend(
                    names
                        .split(',')
                        .map(clean_name)
                        .filter(|name| !name.is_empty())
                        .map(|name| Creator::new(name, role.clone())),
                );
            }
        }

        results
    }
}

fn clean_name(raw: &str) -> String {
    let without_ampersands = raw.replace('&', " ");
    let words: Vec<&str> = without_ampersands
        .split_whitespace()
        .filter(|w| *w != "and")
        .collect();
    title_case(&words.join(" "))
}
