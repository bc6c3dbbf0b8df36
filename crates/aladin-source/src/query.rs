//! Query building
//!
//! Priority order: a checksum-valid ISBN beats the site item id, which
//! beats a tokenized title/author search. The first two address a
//! detail page directly and never hit the search endpoint.

use crate::error::SourceError;
use crate::identifiers::Identifiers;
use crate::text;
use crate::urls;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    ByIsbn(String),
    ByItemId(String),
    ByTitleAuthor {
        /// Original title, kept for re-matching search results.
        title: Option<String>,
        /// Original author list, kept for re-matching search results.
        authors: Vec<String>,
        /// Prepared query tokens (title with subtitle stripped, first
        /// author), not yet percent-encoded.
        tokens: Vec<String>,
    },
}

impl SearchQuery {
    /// Build a query from whatever the caller supplied.
    pub fn build(
        title: Option<&str>,
        authors: &[String],
        identifiers: &Identifiers,
    ) -> Result<Self, SourceError> {
        if let Some(isbn) = identifiers.valid_isbn() {
            return Ok(SearchQuery::ByIsbn(isbn));
        }
        if let Some(item_id) = identifiers.item_id.as_deref() {
            return Ok(SearchQuery::ByItemId(item_id.to_string()));
        }
        Self::build_keyword(title, authors)
    }

    /// Build a title/author query, ignoring identifiers entirely. Used
    /// directly by the no-matches retry.
    pub fn build_keyword(title: Option<&str>, authors: &[String]) -> Result<Self, SourceError> {
        let mut tokens = title
            .map(|t| text::title_tokens(t, false, true))
            .unwrap_or_default();
        tokens.extend(text::author_tokens(authors, true));

        if tokens.is_empty() {
            return Err(SourceError::NoQuery);
        }

        Ok(SearchQuery::ByTitleAuthor {
            title: title.map(str::to_string),
            authors: authors.to_vec(),
            tokens,
        })
    }

    /// Search-results URL for this query; `None` for the item-id form,
    /// which has no search page.
    pub fn search_url(&self) -> Option<String> {
        match self {
            SearchQuery::ByIsbn(isbn) => Some(urls::isbn_search_url(isbn)),
            SearchQuery::ByItemId(_) => None,
            SearchQuery::ByTitleAuthor { tokens, .. } => {
                let joined = tokens
                    .iter()
                    .map(|t| urlencoding::encode(t).into_owned())
                    .collect::<Vec<_>>()
                    .join("+");
                Some(urls::keyword_search_url(&joined))
            }
        }
    }

    /// Detail-page URL when the query addresses one book directly.
    pub fn direct_detail_url(&self) -> Option<String> {
        match self {
            SearchQuery::ByIsbn(isbn) => Some(urls::detail_url_for_isbn(isbn)),
            SearchQuery::ByItemId(item_id) => Some(urls::detail_url_for_item(item_id)),
            SearchQuery::ByTitleAuthor { .. } => None,
        }
    }

    pub fn is_isbn(&self) -> bool {
        matches!(self, SearchQuery::ByIsbn(_))
    }
}
