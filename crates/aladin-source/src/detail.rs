//! Detail-page worker and per-field extractors
//!
//! One worker per candidate URL. Each field extractor returns its own
//! `Result` so a broken corner of the page costs that field, never the
//! record. The DOM phase is fully synchronous (a parsed document does
//! not cross an await point); network enrichment follows with plain
//! owned data.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::comments;
use crate::config::SourceConfig;
use crate::covers;
use crate::error::{ExtractError, FetchError};
use crate::host::Host;
use crate::http::Transport;
use crate::identifiers::{check_isbn, Identifiers};
use crate::language;
use crate::record::{MetadataRecord, Series};
use crate::text;

/// Page title marker of the origin's generic "how to choose a good
/// book" page, served instead of a 404 for unknown items.
const GENERIC_PAGE_MARKER: &str = "좋은 책을 고르는 방법, 알라딘";

/// Role the origin uses for plain authorship; never truncates the
/// author list.
const AUTHOR_ROLE: &str = "지은이";

lazy_static! {
    static ref SERIES_INDEX: Regex = Regex::new(r"\s+(\d+)\s*$").unwrap();
    static ref ROLE_ANNOTATION: Regex = Regex::new(r"\(([^)]*)\)").unwrap();
    static ref ISBN_LABEL: Regex = Regex::new(r"(?i)isbn(?:\(13\))?\s?:\s?(\S+)").unwrap();
    static ref LANGUAGE_LABEL: Regex = Regex::new(r"언어\s?:\s?(\S+)").unwrap();
    static ref HYPHEN_DATE: Regex = Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").unwrap();
    static ref STORE_SECTION: Regex = Regex::new(r"^\s*(국내도서|외국도서)\s*>\s*").unwrap();
    static ref BREADCRUMB_SEP: Regex = Regex::new(r"\s*>\s*").unwrap();
}

/// Everything the synchronous DOM phase pulls off a detail page.
/// Optional fields are best-effort; `None` means the extractor failed
/// or the page had nothing, both already logged.
struct ParsedDetail {
    item_id: Option<String>,
    title: Option<String>,
    series: Option<Series>,
    authors: Vec<String>,
    isbn: Option<String>,
    rating: Option<f32>,
    meta_description: Option<String>,
    cover_meta_url: Option<String>,
    tags: Vec<String>,
    publisher: Option<String>,
    pubdate: Option<NaiveDate>,
    language_label: Option<String>,
}

/// Fetches and parses one candidate detail page, pushing at most one
/// record to the shared result channel.
pub(crate) struct DetailWorker {
    pub transport: Arc<dyn Transport>,
    pub host: Arc<dyn Host>,
    pub config: Arc<SourceConfig>,
    pub url: String,
    pub rank: usize,
    pub results: UnboundedSender<MetadataRecord>,
    pub abort: CancellationToken,
}

impl DetailWorker {
    pub async fn run(self) {
        let timeout = Duration::from_secs(self.config.detail_timeout_secs);

        if self.abort.is_cancelled() {
            return;
        }

        let raw = match self.transport.get_html(&self.url, None, timeout).await {
            Ok(raw) => raw,
            Err(FetchError::NotFound) => {
                error!("url malformed: {}", self.url);
                return;
            }
            Err(FetchError::Timeout) => {
                error!("aladin timed out: {}", self.url);
                return;
            }
            Err(e) => {
                error!("failed to fetch detail page {}: {}", self.url, e);
                return;
            }
        };

        let cleaned = text::clean_ascii_chars(&raw);
        let parsed = match parse_detail_page(&cleaned, &self.url, &self.config) {
            Some(parsed) => parsed,
            None => {
                info!("no result found for {}", self.url);
                return;
            }
        };

        let (Some(item_id), Some(title)) = (parsed.item_id.clone(), parsed.title.clone()) else {
            error!("could not find title/authors/item id for {}", self.url);
            return;
        };
        if parsed.authors.is_empty() {
            error!("could not find title/authors/item id for {}", self.url);
            return;
        }

        if self.abort.is_cancelled() {
            return;
        }

        // Network enrichment: description endpoint (introduction and
        // TOC), then cover probe. An empty answer from both endpoint
        // variants falls back to the page meta description; a transport
        // error drops comments entirely, fallback included.
        let comments = match parsed.isbn.as_deref() {
            Some(isbn) => {
                match comments::fetch_contents(&*self.transport, isbn, &self.url, timeout).await {
                    Ok(contents) => comments::assemble_comments(
                        contents.introduction,
                        parsed.meta_description.clone(),
                        contents.toc,
                        &self.config,
                    ),
                    Err(e) => {
                        warn!("failed to fetch description for {}: {}", self.url, e);
                        None
                    }
                }
            }
            None => comments::assemble_comments(
                None,
                parsed.meta_description.clone(),
                None,
                &self.config,
            ),
        };

        if self.abort.is_cancelled() {
            return;
        }

        let cover_url = match parsed.cover_meta_url.as_deref() {
            Some(small) => {
                covers::resolve_cover_url(&*self.transport, small, self.config.small_cover, timeout)
                    .await
            }
            None => None,
        };

        let mut record = MetadataRecord::new(title, parsed.authors.clone());
        record.series = parsed.series.clone();
        record.identifiers = Identifiers {
            isbn: parsed.isbn.clone(),
            item_id: Some(item_id.clone()),
        };
        record.rating = parsed.rating;
        record.comments = comments;
        record.publisher = parsed.publisher.clone();
        record.pubdate = parsed.pubdate;
        record.tags = parsed.tags.clone();
        record.language = resolve_language(parsed.language_label.as_deref(), &*self.host);
        record.cover_url = cover_url.clone();
        record.source_relevance = self.rank;

        if let Some(isbn) = parsed.isbn.as_deref() {
            self.host.cache_isbn_to_identifier(isbn, &item_id);
        }
        if let Some(cover) = cover_url.as_deref() {
            self.host.cache_identifier_to_cover_url(&item_id, cover);
        }

        self.host.clean_downloaded_metadata(&mut record);

        debug!("emitting record for {} (rank {})", self.url, self.rank);
        if self.results.send(record).is_err() {
            debug!("result channel closed, dropping record for {}", self.url);
        }
    }
}

/// Synchronous DOM phase. `None` means the page is not a detail page
/// at all (the generic fallback page, or an explicit in-page error).
fn parse_detail_page(html: &str, url: &str, config: &SourceConfig) -> Option<ParsedDetail> {
    let document = Html::parse_document(html);

    if let Ok(sel) = Selector::parse("title") {
        if let Some(title) = document.select(&sel).next() {
            let page_title = title.text().collect::<String>();
            if page_title.contains(GENERIC_PAGE_MARKER) {
                return None;
            }
        }
    }

    if let Ok(sel) = Selector::parse("#errorMessage") {
        if let Some(errmsg) = document.select(&sel).next() {
            let message = text::collapse_whitespace(&errmsg.text().collect::<String>());
            error!("origin reported an error for {}: {}", url, message);
            return None;
        }
    }

    let item_id = log_absent(extract_item_id(url, &document), "item id", url);
    let (title, series) = match extract_title_series(&document) {
        Ok((title, series)) => (Some(title), series),
        Err(e) => {
            warn!("could not extract title for {}: {}", url, e);
            (None, None)
        }
    };
    let authors =
        log_absent(extract_authors(&document, config.get_all_authors), "authors", url)
            .unwrap_or_default();
    let isbn = log_absent(extract_isbn(&document), "isbn", url);
    let rating = log_absent(extract_rating(&document), "rating", url);
    let (publisher, pubdate) = extract_publisher_and_date(&document);

    ParsedDetail {
        item_id,
        title,
        series,
        authors,
        isbn,
        rating,
        meta_description: extract_meta_description(&document),
        cover_meta_url: extract_cover_meta(&document),
        tags: extract_tags(&document, config),
        publisher,
        pubdate,
        language_label: extract_language_label(&document),
    }
    .into()
}

fn log_absent<T>(result: Result<T, ExtractError>, field: &str, url: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("no {} for {}: {}", field, url, e);
            None
        }
    }
}

/// The item id comes from the URL's `ItemId` parameter; pages reached
/// through the ISBN redirect expose it in the `og:url` meta tag
/// instead.
pub(crate) fn extract_item_id(page_url: &str, document: &Html) -> Result<String, ExtractError> {
    if let Some(id) = item_id_from_url(page_url) {
        return Ok(id);
    }

    let sel = Selector::parse(r#"meta[property="og:url"]"#)
        .map_err(|_| ExtractError::Missing("item id"))?;
    document
        .select(&sel)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .and_then(item_id_from_url)
        .ok_or(ExtractError::Missing("item id"))
}

fn item_id_from_url(page_url: &str) -> Option<String> {
    let parsed = url::Url::parse(page_url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "ItemId")
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty())
}

/// Title heading is the parent of the `p_topt01` anchor. When a series
/// link is present, its text is removed from the title and parsed for
/// a trailing integer index.
pub(crate) fn extract_title_series(
    document: &Html,
) -> Result<(String, Option<Series>), ExtractError> {
    let anchor_sel =
        Selector::parse("a.p_topt01").map_err(|_| ExtractError::Missing("title"))?;
    let anchor = document
        .select(&anchor_sel)
        .next()
        .ok_or(ExtractError::Missing("title"))?;
    let container = anchor
        .parent()
        .and_then(ElementRef::wrap)
        .ok_or(ExtractError::Missing("title"))?;

    let mut title = text::collapse_whitespace(&container.text().collect::<String>());

    let series_sel = Selector::parse(r#"a[href*="wseriesitem.aspx"]"#)
        .map_err(|_| ExtractError::Missing("title"))?;
    let series_info = container
        .select(&series_sel)
        .next()
        .map(|el| text::collapse_whitespace(&el.text().collect::<String>()))
        .filter(|info| !info.is_empty());

    let series = match series_info {
        Some(info) => {
            title = text::collapse_whitespace(&title.replace(&info, ""));

            match SERIES_INDEX.captures(&info) {
                Some(cap) => {
                    let index: f32 = cap[1].parse().map_err(|_| ExtractError::Malformed {
                        field: "series",
                        reason: format!("bad index in {info:?}"),
                    })?;
                    let name = info[..info.len() - cap[0].len()].trim().to_string();
                    Some(Series { name, index })
                }
                None => Some(Series {
                    name: info,
                    index: 0.0,
                }),
            }
        }
        None => None,
    };

    let title = text::strip_trailing_parenthetical(&title);
    if title.is_empty() {
        return Err(ExtractError::Missing("title"));
    }
    Ok((title, series))
}

/// The author region is a flat node list mixing author anchors and
/// text nodes carrying role annotations like `(옮긴이)`. Roles are
/// assigned by scanning in reverse: each role text covers the anchors
/// between it and the previous role marker.
pub(crate) fn extract_authors(
    document: &Html,
    get_all_authors: bool,
) -> Result<Vec<String>, ExtractError> {
    let anchor_sel = Selector::parse(r#"a.np_af[href*="?AuthorSearch="]"#)
        .map_err(|_| ExtractError::Missing("authors"))?;
    let first = document
        .select(&anchor_sel)
        .next()
        .ok_or(ExtractError::Missing("authors"))?;
    let region = first
        .parent()
        .and_then(ElementRef::wrap)
        .ok_or(ExtractError::Missing("authors"))?;

    let children: Vec<_> = region.children().collect();
    let mut with_roles: Vec<(String, String)> = Vec::new();
    let mut role = String::new();
    for child in children.into_iter().rev() {
        if let Some(el) = ElementRef::wrap(child) {
            let is_author = el.value().name() == "a"
                && el
                    .value()
                    .attr("href")
                    .is_some_and(|href| href.contains("AuthorSearch="));
            if is_author {
                let name = text::collapse_whitespace(&el.text().collect::<String>());
                if !name.is_empty() {
                    with_roles.push((name, role.clone()));
                }
            }
        } else if let Node::Text(node_text) = child.value() {
            if let Some(cap) = ROLE_ANNOTATION.captures(node_text) {
                role = cap[1].trim().to_string();
            }
        }
    }
    with_roles.reverse();

    // Keep unannotated and plainly-authored names; the first explicit
    // other role (translator, editor, ...) becomes the accepted role
    // and a different one stops accumulation. Markup-shaped rule, kept
    // as observed on current pages.
    let mut authors = Vec::new();
    let mut accepted_role: Option<String> = None;
    for (name, role) in with_roles {
        if get_all_authors {
            authors.push(name);
        } else if role.is_empty() || role == AUTHOR_ROLE {
            authors.push(name);
        } else if authors.is_empty() {
            accepted_role = Some(role);
            authors.push(name);
        } else if accepted_role.as_deref() == Some(role.as_str()) {
            authors.push(name);
        } else {
            break;
        }
    }

    if authors.is_empty() {
        return Err(ExtractError::Missing("authors"));
    }
    Ok(authors)
}

/// ISBN from the `books:isbn` meta tag, else a labeled `ISBN :` value
/// in the conversion-info block. Only checksum-valid ISBNs survive.
pub(crate) fn extract_isbn(document: &Html) -> Result<String, ExtractError> {
    let meta_sel = Selector::parse(r#"meta[property="books:isbn"]"#)
        .map_err(|_| ExtractError::Missing("isbn"))?;
    if let Some(raw) = document
        .select(&meta_sel)
        .next()
        .and_then(|meta| meta.value().attr("content"))
    {
        if let Some(isbn) = check_isbn(raw) {
            return Ok(isbn);
        }
    }

    let block_sel =
        Selector::parse("div.p_goodstd03").map_err(|_| ExtractError::Missing("isbn"))?;
    for block in document.select(&block_sel) {
        let block_text = block.text().collect::<String>();
        if let Some(cap) = ISBN_LABEL.captures(&block_text) {
            if let Some(isbn) = check_isbn(&cap[1]) {
                return Ok(isbn);
            }
        }
    }

    Err(ExtractError::Missing("isbn"))
}

/// Rating from the first non-empty `star_nom` text, halved to map the
/// origin's 0-10 scale onto 0-5. "0" is a real rating, not absence.
pub(crate) fn extract_rating(document: &Html) -> Result<f32, ExtractError> {
    let sel = Selector::parse("span.star_nom").map_err(|_| ExtractError::Missing("rating"))?;
    for node in document.select(&sel) {
        let value = text::collapse_whitespace(&node.text().collect::<String>());
        if value.is_empty() {
            continue;
        }
        let parsed: f32 = value.parse().map_err(|_| ExtractError::Malformed {
            field: "rating",
            reason: format!("not a number: {value:?}"),
        })?;
        return Ok(parsed / 2.0);
    }
    Err(ExtractError::Missing("rating"))
}

fn extract_meta_description(document: &Html) -> Option<String> {
    let sel = Selector::parse(r#"meta[name="Description"]"#).ok()?;
    document
        .select(&sel)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .map(str::to_string)
}

fn extract_cover_meta(document: &Html) -> Option<String> {
    let sel = Selector::parse(r#"meta[property="og:image"]"#).ok()?;
    document
        .select(&sel)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .filter(|content| !content.is_empty())
        .map(str::to_string)
}

/// Tags from the breadcrumb category list (when enabled) plus the leaf
/// tag links, optionally remapped through the genre table, with
/// duplicates dropped in order.
pub(crate) fn extract_tags(document: &Html, config: &SourceConfig) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();

    if config.get_category {
        if let Ok(sel) = Selector::parse("div.p_categorize ul li") {
            for li in document.select(&sel) {
                let genre = li.text().collect::<String>().replace('\u{a0}', " ");
                let genre = text::collapse_whitespace(&genre);
                let genre = STORE_SECTION.replace(&genre, "");
                if genre.trim().is_empty() {
                    continue;
                }
                let joined = BREADCRUMB_SEP
                    .split(genre.trim())
                    .collect::<Vec<_>>()
                    .join(".");
                tags.push(format!("{}{joined}", config.category_prefix));
            }
        }
    }

    if let Ok(sel) = Selector::parse(r#"#div_itemtaglist a[href*="tagname="]"#) {
        let leaf: Vec<String> = document
            .select(&sel)
            .map(|a| text::collapse_whitespace(&a.text().collect::<String>()))
            .filter(|tag| !tag.is_empty())
            .collect();
        if config.convert_tag {
            for raw in &leaf {
                if let Some(mapped) = config.mapped_tags(raw) {
                    tags.extend(mapped.iter().cloned());
                }
            }
        } else {
            tags.extend(leaf);
        }
    }

    let mut seen = std::collections::HashSet::new();
    tags.retain(|tag| seen.insert(tag.clone()));
    tags
}

/// Publisher from the publisher-search anchor; pubdate from the
/// `datePublished` meta tag, else a `YYYY-M-D` token in the text that
/// follows the anchor.
pub(crate) fn extract_publisher_and_date(
    document: &Html,
) -> (Option<String>, Option<NaiveDate>) {
    let mut publisher = None;
    let mut pubdate = None;

    if let Ok(sel) = Selector::parse(r#"meta[itemprop="datePublished"]"#) {
        pubdate = document
            .select(&sel)
            .next()
            .and_then(|meta| meta.value().attr("content"))
            .and_then(parse_hyphen_date);
    }

    if let Ok(sel) = Selector::parse(r#"a.np_af[href*="?PublisherSearch="]"#) {
        if let Some(anchor) = document.select(&sel).next() {
            let name = text::collapse_whitespace(&anchor.text().collect::<String>());
            if !name.is_empty() {
                publisher = Some(name);
            }

            if pubdate.is_none() {
                // The date trails the anchor as bare text: "다문 | 2009-09-20"
                for sibling in anchor.next_siblings() {
                    if let Node::Text(node_text) = sibling.value() {
                        if let Some(cap) = HYPHEN_DATE.captures(node_text) {
                            pubdate = parse_hyphen_date(&cap[0]);
                            break;
                        }
                    } else if ElementRef::wrap(sibling).is_some() {
                        break;
                    }
                }
            }
        }
    }

    (publisher, pubdate)
}

/// Parse `YYYY-M-D`, defaulting month and day to 1 when missing.
pub(crate) fn parse_hyphen_date(date_text: &str) -> Option<NaiveDate> {
    let mut parts = date_text.trim().splitn(3, '-');
    let year: i32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts
        .next()
        .and_then(|m| m.trim().parse().ok())
        .unwrap_or(1);
    let day: u32 = parts
        .next()
        .and_then(|d| d.trim().parse().ok())
        .unwrap_or(1);
    NaiveDate::from_ymd_opt(year, month, day)
}

fn extract_language_label(document: &Html) -> Option<String> {
    let sel = Selector::parse("div.p_goodstd03").ok()?;
    for block in document.select(&sel) {
        let block_text = block.text().collect::<String>();
        if let Some(cap) = LANGUAGE_LABEL.captures(&block_text) {
            return Some(cap[1].to_string());
        }
    }
    None
}

/// The origin's default language is Korean; labeled values go through
/// the alias table and then the host's canonicalizer.
fn resolve_language(label: Option<&str>, host: &dyn Host) -> Option<String> {
    match label {
        None => Some(language::DEFAULT_LANGUAGE.to_string()),
        Some(raw) => language::resolve(raw)
            .map(str::to_string)
            .or_else(|| host.canonicalize_lang(raw)),
    }
}
