//! Metadata record emitted for each accepted candidate

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::identifiers::Identifiers;

/// Series membership: a name plus a numeric position.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Series {
    pub name: String,
    /// Non-negative; 0.0 when the series text carries no number.
    pub index: f32,
}

/// One book's scraped metadata, pushed to the shared result channel.
///
/// A record is only constructed when title, at least one author, and
/// the site item id were all resolved; everything else is optional and
/// filled in best-effort.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MetadataRecord {
    pub title: String,
    /// Contribution order is preserved.
    pub authors: Vec<String>,
    pub series: Option<Series>,
    pub identifiers: Identifiers,
    /// Normalized to the 0–5 scale (the origin rates 0–10).
    pub rating: Option<f32>,
    /// HTML fragment, possibly with an appended TOC block and suffix.
    pub comments: Option<String>,
    pub publisher: Option<String>,
    pub pubdate: Option<NaiveDate>,
    /// Deduplicated, in extraction order.
    pub tags: Vec<String>,
    /// ISO-639-3-like code.
    pub language: Option<String>,
    pub cover_url: Option<String>,
    /// Candidate rank; consumers sort by this after draining the
    /// channel, since arrival order is not meaningful.
    pub source_relevance: usize,
}

impl MetadataRecord {
    pub fn new(title: String, authors: Vec<String>) -> Self {
        Self {
            title,
            authors,
            series: None,
            identifiers: Identifiers::default(),
            rating: None,
            comments: None,
            publisher: None,
            pubdate: None,
            tags: Vec::new(),
            language: None,
            cover_url: None,
            source_relevance: 0,
        }
    }
}
