//! Book identifiers and ISBN validation

use serde::{Deserialize, Serialize};

use crate::urls;

/// Identifier key the host uses for the origin's item id.
pub const SITE_ID_KEY: &str = "aladin.co.kr";

/// The identifier set attached to a lookup request or a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifiers {
    /// Normalized ISBN-10 or ISBN-13, when known and valid.
    pub isbn: Option<String>,
    /// The origin's internal item id (`ItemId` query parameter).
    pub item_id: Option<String>,
}

impl Identifiers {
    pub fn from_isbn(isbn: &str) -> Self {
        Self {
            isbn: check_isbn(isbn),
            item_id: None,
        }
    }

    pub fn from_item_id(item_id: &str) -> Self {
        Self {
            isbn: None,
            item_id: Some(item_id.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.isbn.is_none() && self.item_id.is_none()
    }

    /// Checksum-validated ISBN, if any.
    pub fn valid_isbn(&self) -> Option<String> {
        self.isbn.as_deref().and_then(check_isbn)
    }
}

/// Normalize and validate an ISBN. Returns the hyphen-free form when
/// the checksum holds, `None` otherwise. Invalid ISBNs are treated as
/// absent everywhere in the pipeline.
pub fn check_isbn(isbn: &str) -> Option<String> {
    let normalized: String = isbn
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == 'X' || *c == 'x')
        .collect::<String>()
        .to_uppercase();

    let valid = match normalized.len() {
        10 => validate_isbn10(&normalized),
        13 => validate_isbn13(&normalized),
        _ => false,
    };

    valid.then_some(normalized)
}

/// Validate ISBN-10 checksum
fn validate_isbn10(isbn: &str) -> bool {
    if isbn.len() != 10 {
        return false;
    }

    let chars: Vec<char> = isbn.chars().collect();

    // First 9 must be digits, the check digit may be X
    for (i, &c) in chars.iter().enumerate() {
        if i < 9 {
            if !c.is_ascii_digit() {
                return false;
            }
        } else if !c.is_ascii_digit() && c != 'X' {
            return false;
        }
    }

    let sum: u32 = chars
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let value = if c == 'X' {
                10
            } else {
                c.to_digit(10).unwrap_or(0)
            };
            value * (10 - i as u32)
        })
        .sum();

    sum % 11 == 0
}

/// Validate ISBN-13 checksum
fn validate_isbn13(isbn: &str) -> bool {
    if isbn.len() != 13 || !isbn.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    let sum: u32 = isbn
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let value = c.to_digit(10).unwrap_or(0);
            if i % 2 == 0 {
                value
            } else {
                value * 3
            }
        })
        .sum();

    sum % 10 == 0
}

/// Detail-page URL for a known item id, for host UI linking.
pub fn book_url(identifiers: &Identifiers) -> Option<String> {
    identifiers
        .item_id
        .as_deref()
        .map(urls::detail_url_for_item)
}
