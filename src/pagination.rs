//! Pagination utilities for GitHub API responses.
//!
//! GitHub advertises neighbouring pages in the `Link` response header. Most
//! endpoints page by number; a few page by opaque token or cursor, in which
//! case the page numbers stay zero and the string fields carry the position.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::query::is_default;

/// Page navigation parsed from a `Link` header.
///
/// `next_page` is zero exactly when there is no numbered next page. Endpoints
/// that page by token report the next position in `next_page_token`, `cursor`
/// or `after` instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    pub first_page: u32,
    pub prev_page: u32,
    pub next_page: u32,
    pub last_page: u32,
    /// Non-numeric `page` value of the next link.
    pub next_page_token: String,
    /// `cursor` value of the next link.
    pub cursor: String,
    /// `before` value of the previous link.
    pub before: String,
    /// `after` value of the next link.
    pub after: String,
}

impl Pagination {
    /// Parse a `Link` header value.
    ///
    /// Links that are malformed or carry an unknown relation are skipped.
    #[must_use]
    pub fn from_link_header(value: &str) -> Self {
        let mut pagination = Self::default();

        for link in split_links(value) {
            let mut segments = link.split(';').map(str::trim);
            let Some(target) = segments.next() else {
                continue;
            };
            let Some(href) = target.strip_prefix('<').and_then(|t| t.strip_suffix('>')) else {
                continue;
            };
            let Some(url) = parse_href(href) else {
                continue;
            };

            let mut rels = segments
                .filter_map(|s| s.strip_prefix("rel="))
                .map(|rel| rel.trim_matches('"'));

            // Cursor links set only `cursor`.
            let cursor = query_value(&url, "cursor");
            if !cursor.is_empty() {
                if rels.any(|rel| rel == "next") {
                    pagination.cursor = cursor;
                }
                continue;
            }

            let page = query_value(&url, "page");
            let since = query_value(&url, "since");
            let page = if page.is_empty() { since } else { page };

            for rel in rels {
                match rel {
                    "next" => {
                        match page.parse() {
                            Ok(number) => pagination.next_page = number,
                            Err(_) => pagination.next_page_token.clone_from(&page),
                        }
                        pagination.after = query_value(&url, "after");
                    }
                    "prev" => {
                        pagination.prev_page = page.parse().unwrap_or(0);
                        pagination.before = query_value(&url, "before");
                    }
                    "first" => pagination.first_page = page.parse().unwrap_or(0),
                    "last" => pagination.last_page = page.parse().unwrap_or(0),
                    _ => {}
                }
            }
        }

        pagination
    }

    /// Whether the server advertised any next position.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.next_page != 0
            || !self.next_page_token.is_empty()
            || !self.cursor.is_empty()
            || !self.after.is_empty()
    }
}

/// Split a `Link` header into its individual links.
///
/// A plain split on `,` would cut through URLs whose query contains commas
/// (`labels=bug,ui`), so pieces that do not open a new `<...>` target are
/// glued back onto the previous link.
fn split_links(value: &str) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    for piece in value.split(',') {
        match links.last_mut() {
            Some(last) if !piece.trim_start().starts_with('<') => {
                last.push(',');
                last.push_str(piece);
            }
            _ => links.push(piece.trim().to_string()),
        }
    }
    links
}

fn parse_href(href: &str) -> Option<Url> {
    match Url::parse(href) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse("http://relative.invalid/")
            .and_then(|base| base.join(href))
            .ok(),
        Err(_) => None,
    }
}

fn query_value(url: &Url, name: &str) -> String {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

/// Page-number options accepted by most list endpoints.
///
/// Zero fields are omitted from the query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    /// Page to fetch (1-indexed).
    #[serde(default, skip_serializing_if = "is_default")]
    pub page: u32,
    /// Results per page, at most 100.
    #[serde(default, skip_serializing_if = "is_default")]
    pub per_page: u32,
}

impl ListOptions {
    /// Options for a specific page.
    #[must_use]
    pub fn for_page(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }
}

/// Options for endpoints that page by cursor or opaque token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListCursorOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub page: String,
    #[serde(default, skip_serializing_if = "is_default")]
    pub per_page: u32,
    #[serde(default, skip_serializing_if = "is_default")]
    pub first: u32,
    #[serde(default, skip_serializing_if = "is_default")]
    pub last: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub after: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub before: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cursor: String,
}
