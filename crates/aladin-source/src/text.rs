//! Text cleanup and query tokenization
//!
//! The tokenizers mirror the host application's title/author token
//! contracts: the same inputs produce the same token sets the host
//! would feed into a search query or a match check.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Subtitle tails: bracketed groups anywhere, or everything after : / \
    static ref SUBTITLE: Regex = Regex::new(r"([\(\[\{].*?[\)\]\}]|[/:\\].*$)").unwrap();

    // Parenthesized year/format annotations, e.g. (2010), [Paperback]
    static ref ANNOTATION: Regex = Regex::new(
        r"(?i)[(\{\[](\d{4}|omnibus|anthology|hardcover|audiobook|audio\s*cd|paperback|mass\s*market|edition|ed\.)[\])\}]"
    )
    .unwrap();
    static ref EDITION: Regex = Regex::new(r"(?i)[(\{\[].*?(edition|ed\.).*?[\])\}]").unwrap();

    // Commas used as separators inside numbers
    static ref NUM_COMMA: Regex = Regex::new(r"(\d+),(\d+)").unwrap();

    // Hyphens only when preceded by whitespace
    static ref SPACED_HYPHEN: Regex = Regex::new(r"\s-").unwrap();

    // Everything else that separates tokens
    static ref SPECIALS: Regex = Regex::new(r#"[:,;!@$%^&*(){}.`~"\[\]/]"#).unwrap();

    static ref AUTHOR_SEPARATORS: Regex = Regex::new(r"[-+.:;,]").unwrap();
    static ref AUTHOR_NOISE: Regex = Regex::new(r#"[!@#$%^&*(){}`~"\[\]/]"#).unwrap();
}

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove C0 control characters (keeping tab/CR/LF) and DEL, which the
/// origin occasionally embeds and which upset downstream consumers.
pub fn clean_ascii_chars(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            let code = c as u32;
            code >= 32 || c == '\t' || c == '\n' || c == '\r'
        })
        .filter(|&c| c as u32 != 127)
        .collect()
}

/// Drop a trailing parenthetical annotation, e.g.
/// `"광장 (최인훈 전집)"` becomes `"광장"`. Titles that would become
/// empty are left alone.
pub fn strip_trailing_parenthetical(title: &str) -> String {
    match title.rfind('(') {
        Some(idx) if idx > 0 => title[..idx].trim().to_string(),
        _ => title.trim().to_string(),
    }
}

/// Tokenize a title for query building or match checks.
///
/// `strip_subtitle` removes bracketed groups and `: … / …` tails;
/// `strip_joiners` drops a/and/the/& connector words.
pub fn title_tokens(title: &str, strip_joiners: bool, strip_subtitle: bool) -> Vec<String> {
    let mut title = title.to_string();

    if strip_subtitle {
        let stripped = SUBTITLE.replace_all(&title, "");
        // Keep the original when stripping would leave nothing usable
        if stripped.trim().chars().count() > 1 {
            title = stripped.into_owned();
        }
    }

    let title = ANNOTATION.replace_all(&title, "");
    let title = EDITION.replace_all(&title, "");
    let title = NUM_COMMA.replace_all(&title, "$1$2");
    let title = SPACED_HYPHEN.replace_all(&title, " ");
    let title = SPECIALS.replace_all(&title, " ");

    title
        .split_whitespace()
        .map(|tok| tok.trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|tok| !tok.is_empty())
        .filter(|tok| {
            !strip_joiners || !matches!(tok.to_lowercase().as_str(), "a" | "and" | "the" | "&")
        })
        .collect()
}

/// Tokenize author names. With `only_first_author` only the first
/// entry contributes. A comma in a name is read as "last, first" and
/// the parts are rotated back into natural order.
pub fn author_tokens(authors: &[String], only_first_author: bool) -> Vec<String> {
    let authors: &[String] = if only_first_author && !authors.is_empty() {
        &authors[..1]
    } else {
        authors
    };

    let mut tokens = Vec::new();
    for author in authors {
        let has_comma = author.contains(',');
        let cleaned = AUTHOR_SEPARATORS.replace_all(author, " ");
        let mut parts: Vec<&str> = cleaned.split_whitespace().collect();
        if has_comma && parts.len() > 1 {
            parts.rotate_left(1);
        }
        for part in parts {
            let tok = AUTHOR_NOISE.replace_all(part, "");
            let tok = tok.trim();
            if tok.chars().count() > 2
                && !matches!(tok.to_lowercase().as_str(), "von" | "van" | "unknown")
            {
                tokens.push(tok.to_string());
            }
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  광장   최인훈 \n 전집  "), "광장 최인훈 전집");
    }

    #[test]
    fn test_clean_ascii_chars_keeps_text_and_newlines() {
        let dirty = "체\u{0} 게바라\u{8}\n평전\u{7f}";
        assert_eq!(clean_ascii_chars(dirty), "체 게바라\n평전");
    }

    #[test]
    fn test_strip_trailing_parenthetical() {
        assert_eq!(strip_trailing_parenthetical("광장 (최인훈 전집)"), "광장");
        assert_eq!(strip_trailing_parenthetical("괄호 없는 제목"), "괄호 없는 제목");
        // A title that starts with '(' is not reduced to nothing
        assert_eq!(strip_trailing_parenthetical("(어떤) 제목"), "(어떤) 제목");
    }

    #[test]
    fn test_title_tokens_strip_subtitle() {
        let tokens = title_tokens("체 게바라: 혁명가의 삶", false, true);
        assert_eq!(tokens, vec!["체", "게바라"]);
    }

    #[test]
    fn test_title_tokens_keep_joiners_when_asked() {
        let with = title_tokens("The Old Man and the Sea", false, false);
        assert!(with.contains(&"The".to_string()));
        let without = title_tokens("The Old Man and the Sea", true, false);
        assert_eq!(without, vec!["Old", "Man", "Sea"]);
    }

    #[test]
    fn test_title_tokens_drop_edition_annotations() {
        let tokens = title_tokens("Head First Python (개정판)", false, true);
        assert_eq!(tokens, vec!["Head", "First", "Python"]);
    }

    #[test]
    fn test_author_tokens_first_author_only() {
        let authors = vec!["장 코르미에".to_string(), "김미선".to_string()];
        let tokens = author_tokens(&authors, true);
        assert_eq!(tokens, vec!["코르미에"]);
    }

    #[test]
    fn test_author_tokens_comma_rotates_name_order() {
        let authors = vec!["Cormier, Jean".to_string()];
        assert_eq!(author_tokens(&authors, true), vec!["Jean", "Cormier"]);
    }

    #[test]
    fn test_author_tokens_all_authors() {
        let authors = vec!["장 코르미에".to_string(), "최인훈".to_string()];
        assert_eq!(author_tokens(&authors, false), vec!["코르미에", "최인훈"]);
    }
}
