//! Search-results parsing
//!
//! Both parsers walk the result blocks in document order and produce
//! ranked candidate detail-page URLs. The ISBN variant trusts the
//! origin's matching and only filters formats; the keyword variant
//! re-checks title/author tokens against each block.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::text;
use crate::urls::BASE_URL;

/// A detail-page URL considered a possible match, ranked by discovery
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub rank: usize,
    pub url: String,
}

/// Format markers that disqualify a result block in ISBN search. A
/// label is a bracketed or parenthesized annotation in the title line;
/// it disqualifies when it contains an entry (case-insensitive).
const UNSUPPORTED_FORMATS: &[&str] = &[
    "audiobook",
    "other format",
    "cd",
    "item",
    "see all formats & editions",
];

/// Block-text markers that disqualify a result block in keyword
/// search. Entries carry their own brackets, so a plain substring
/// check is unambiguous.
const UNSUPPORTED_KEYWORD_FORMATS: &[&str] = &[
    "[ebook]",
    "[알라딘굿즈]",
    "[커피]",
    "[음반]",
    "[dvd]",
    "[블루레이]",
];

// Result blocks live in the Search3_Result container; fall back to
// bare blocks when the container id is missing.
const BLOCK_SELECTORS: &[&str] = &["#Search3_Result div.ss_book_box", "div.ss_book_box"];

lazy_static! {
    static ref FORMAT_LABEL: Regex = Regex::new(r"[\(\[]([^\)\]]+)[\)\]]").unwrap();
}

/// Parse an ISBN-search results page. Accepts the first
/// `max_candidates` qualifying blocks in document order, regardless of
/// title/author similarity.
pub fn parse_isbn_search(html: &str, max_candidates: usize) -> Vec<Candidate> {
    let document = Html::parse_document(html);
    let Ok(title_sel) = Selector::parse(r#"div.ss_book_list a.bo3[href*="wproduct.aspx?ISBN="]"#)
    else {
        return Vec::new();
    };

    let mut candidates = Vec::new();
    for block in result_blocks(&document) {
        if candidates.len() >= max_candidates {
            break;
        }

        let Some(anchor) = block.select(&title_sel).next() else {
            continue;
        };
        let raw_title = text::collapse_whitespace(&anchor.text().collect::<String>());
        if raw_title.is_empty() || has_unsupported_format(&raw_title) {
            continue;
        }

        let Some(url) = anchor.value().attr("href").map(absolutize) else {
            continue;
        };

        let title = text::strip_trailing_parenthetical(&raw_title);
        debug!("[{}] {}", candidates.len(), title);
        candidates.push(Candidate {
            rank: candidates.len(),
            url,
        });
    }
    candidates
}

/// Parse a keyword-search results page, keeping only blocks whose
/// title and authors overlap the original query tokens.
pub fn parse_keyword_search(
    html: &str,
    orig_title: Option<&str>,
    orig_authors: &[String],
    max_candidates: usize,
) -> Vec<Candidate> {
    let document = Html::parse_document(html);
    let Ok(title_sel) = Selector::parse(r#"div.ss_book_list a[href*="wproduct.aspx"]"#) else {
        return Vec::new();
    };
    let Ok(author_sel) = Selector::parse(r#"a[href*="AuthorSearch"]"#) else {
        return Vec::new();
    };

    let title_tokens = orig_title
        .map(|t| text::title_tokens(t, true, false))
        .unwrap_or_default();
    let author_tokens = text::author_tokens(orig_authors, true);

    let mut candidates = Vec::new();
    for block in result_blocks(&document) {
        if candidates.len() >= max_candidates {
            break;
        }

        let block_text = block.text().collect::<String>().to_lowercase();
        if UNSUPPORTED_KEYWORD_FORMATS
            .iter()
            .any(|marker| block_text.contains(marker))
        {
            continue;
        }

        let Some(anchor) = block.select(&title_sel).next() else {
            continue;
        };
        // The title line is the anchor's parent element: the block
        // decorates the anchor with sibling annotation nodes.
        let Some(title_line) = anchor.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        let raw_title = text::collapse_whitespace(&title_line.text().collect::<String>());
        let title = text::strip_trailing_parenthetical(&raw_title);
        if title.is_empty() {
            continue;
        }

        let contributors: Vec<String> = block
            .select(&author_sel)
            .map(|a| text::collapse_whitespace(&a.text().collect::<String>()))
            .filter(|name| !name.is_empty())
            .collect();

        if !tokens_match(&title, &contributors, &title_tokens, &author_tokens) {
            debug!("rejecting non-matching result: {}", title);
            continue;
        }

        let Some(url) = anchor.value().attr("href").map(absolutize) else {
            continue;
        };

        debug!("[{}] {}", candidates.len(), title);
        candidates.push(Candidate {
            rank: candidates.len(),
            url,
        });
    }
    candidates
}

fn result_blocks(document: &Html) -> Vec<ElementRef<'_>> {
    for selector_str in BLOCK_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        let blocks: Vec<ElementRef<'_>> = document.select(&selector).collect();
        if !blocks.is_empty() {
            return blocks;
        }
    }
    Vec::new()
}

fn has_unsupported_format(title_line: &str) -> bool {
    FORMAT_LABEL.captures_iter(title_line).any(|cap| {
        let label = cap[1].trim().to_lowercase();
        UNSUPPORTED_FORMATS.iter().any(|fmt| label.contains(fmt))
    })
}

/// Case-insensitive substring matching: an empty token set matches
/// anything; otherwise at least one token must appear in the
/// candidate's title (respectively joined author text).
fn tokens_match(
    title: &str,
    contributors: &[String],
    title_tokens: &[String],
    author_tokens: &[String],
) -> bool {
    let title_lower = title.to_lowercase();
    let title_ok = title_tokens.is_empty()
        || title_tokens
            .iter()
            .any(|tok| title_lower.contains(&tok.to_lowercase()));

    let joined = contributors.join(" ").to_lowercase();
    let authors_ok = author_tokens.is_empty()
        || author_tokens
            .iter()
            .any(|tok| joined.contains(&tok.to_lowercase()));

    title_ok && authors_ok
}

fn absolutize(href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{BASE_URL}{href}")
    } else {
        format!("{BASE_URL}/{href}")
    }
}
