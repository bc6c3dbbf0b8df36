//! Comments (book description) extraction
//!
//! The description lives on a secondary endpoint, not the detail page.
//! The endpoint serves an HTML fragment whose layout differs between
//! native and foreign books, so two name variants are tried in order.
//! The table of contents rides along in the same fragment.

use std::time::Duration;

use chrono::{Local, Timelike};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::http::Transport;
use crate::urls::{self, ContentsVariant};

lazy_static! {
    // Foreign-book fragments carry a bold "Overview" heading artifact
    static ref OVERVIEW: Regex = Regex::new(r"(?i)<b>\s*overview\s*</b>").unwrap();
}

const STRIPPED_TAGS: &[&str] = &["script", "style", "object"];
const VOID_TAGS: &[&str] = &["br", "img", "hr"];

/// What the contents endpoint yielded for a book.
pub(crate) struct FetchedContents {
    pub introduction: Option<String>,
    pub toc: Option<String>,
}

/// Fetch the contents fragment for a book, trying the native-book
/// variant first and the foreign-book variant second. An absent
/// introduction with no transport error means both variants answered
/// but carried nothing usable; the caller then falls back to the
/// detail page's meta description.
pub(crate) async fn fetch_contents(
    transport: &dyn Transport,
    isbn: &str,
    referer: &str,
    timeout: Duration,
) -> Result<FetchedContents, FetchError> {
    let hour = Local::now().hour();
    let mut toc = None;
    for variant in [ContentsVariant::Introduce, ContentsVariant::PublisherDesc] {
        let url = urls::contents_url(isbn, variant, hour);
        let html = transport.get_html(&url, Some(referer), timeout).await?;
        let document = Html::parse_document(&html);
        if toc.is_none() {
            toc = extract_toc(&document);
        }
        if let Some(introduction) = introduction_in(&document) {
            return Ok(FetchedContents {
                introduction: Some(introduction),
                toc,
            });
        }
    }
    Ok(FetchedContents {
        introduction: None,
        toc,
    })
}

/// Pull the introduction block out of a contents fragment: find a
/// label node and read its sibling content container, falling back to
/// the legacy `p_textbox` layout. Returns sanitized HTML.
pub fn extract_introduction(fragment: &str) -> Option<String> {
    introduction_in(&Html::parse_document(fragment))
}

fn introduction_in(document: &Html) -> Option<String> {
    let Ok(label_sel) = Selector::parse("div.Ere_prod_mconts_LS") else {
        return None;
    };
    for label in document.select(&label_sel) {
        let Some(content) = following_sibling_element(label) else {
            continue;
        };
        if content
            .value()
            .classes()
            .any(|class| class == "Ere_prod_mconts_R")
        {
            let html = sanitize_element(content);
            if !is_blank_html(&html) {
                return Some(strip_overview(&html));
            }
        }
    }

    let Ok(legacy_sel) = Selector::parse("div.p_textbox") else {
        return None;
    };
    if let Some(node) = document.select(&legacy_sel).next() {
        let html = sanitize_element(node);
        if !is_blank_html(&html) {
            return Some(strip_overview(&html));
        }
    }

    None
}

/// Table-of-contents block from a contents fragment: the full TOC
/// container wins over the short one. Returns sanitized HTML of the
/// first paragraph (the TOC is one `<p>` full of `<br>`s).
pub fn extract_toc(document: &Html) -> Option<String> {
    for selector_str in ["#div_TOC_All p", "#div_TOC_Short p"] {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(p) = document.select(&selector).next() {
            let html = sanitize_element(p);
            if !is_blank_html(&html) {
                return Some(html);
            }
        }
    }
    None
}

/// Assemble the final comments value: wrapped introduction (or the
/// meta-description fallback), optional TOC block under a localized
/// heading, optional configured suffix.
pub fn assemble_comments(
    introduction: Option<String>,
    meta_description: Option<String>,
    toc: Option<String>,
    config: &SourceConfig,
) -> Option<String> {
    let body = introduction
        .or(meta_description)
        .filter(|text| !is_blank_html(text));
    let toc = toc.filter(|_| config.append_toc);

    if body.is_none() && toc.is_none() {
        return None;
    }

    let mut comments = body
        .map(|body| format!(r#"<div id="comments">{body}</div>"#))
        .unwrap_or_default();
    if let Some(toc) = toc {
        comments.push_str(&format!(r#"<h3>[목차]</h3><div id="toc">{toc}</div>"#));
    }
    if !config.comments_suffix.is_empty() {
        comments.push_str(&config.comments_suffix);
    }
    Some(comments)
}

/// Serialize an element to HTML, recursively dropping
/// script/style/object elements and HTML comments.
pub fn sanitize_element(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    append_element(element, &mut out);
    out
}

fn append_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if STRIPPED_TAGS.contains(&name) {
        return;
    }

    out.push('<');
    out.push_str(name);
    for (attr, value) in element.value().attrs() {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
    out.push('>');

    if VOID_TAGS.contains(&name) {
        return;
    }

    for child in element.children() {
        if let Some(el) = ElementRef::wrap(child) {
            append_element(el, out);
        } else if let Node::Text(text) = child.value() {
            out.push_str(&escape_text(text));
        }
        // Comments, processing instructions etc. are dropped
    }

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn following_sibling_element<'a>(element: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let mut sibling = element.next_sibling();
    while let Some(node) = sibling {
        if let Some(el) = ElementRef::wrap(node) {
            return Some(el);
        }
        sibling = node.next_sibling();
    }
    None
}

fn strip_overview(html: &str) -> String {
    OVERVIEW.replace_all(html, "").trim().to_string()
}

/// True when the fragment has no text content once tags are ignored.
fn is_blank_html(html: &str) -> bool {
    Html::parse_fragment(html)
        .root_element()
        .text()
        .all(|t| t.trim().is_empty())
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
