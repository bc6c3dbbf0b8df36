//! Source configuration
//!
//! Read-only to the pipeline; the host owns the store and hands a
//! snapshot in. All fields have serde defaults so a partial TOML/JSON
//! document deserializes cleanly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_DOWNLOADS: usize = 5;
pub const DEFAULT_COMMENTS_SUFFIX: &str =
    r#"<hr /><div><div style="float:right">[aladin.co.kr]</div></div>"#;
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DETAIL_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Cap on candidate detail pages fetched per query.
    pub max_downloads: usize,
    /// Keep every contributor instead of stopping at the first
    /// non-author role.
    pub get_all_authors: bool,
    /// Derive tags from the breadcrumb category list.
    pub get_category: bool,
    /// Remap raw leaf tags through `genre_mappings`.
    pub convert_tag: bool,
    /// Lowercased genre name → replacement tag list.
    pub genre_mappings: HashMap<String, Vec<String>>,
    /// Prepended verbatim to each breadcrumb-derived tag.
    pub category_prefix: String,
    /// Append the table-of-contents block to comments.
    pub append_toc: bool,
    /// Appended verbatim after the comments block when non-empty.
    pub comments_suffix: String,
    /// Keep the small cover URL instead of rewriting to the large
    /// variant.
    pub small_cover: bool,
    /// Timeout for the search-results fetch.
    pub search_timeout_secs: u64,
    /// Timeout for each detail-worker request.
    pub detail_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            max_downloads: DEFAULT_MAX_DOWNLOADS,
            get_all_authors: false,
            get_category: true,
            convert_tag: false,
            genre_mappings: HashMap::new(),
            category_prefix: String::new(),
            append_toc: true,
            comments_suffix: DEFAULT_COMMENTS_SUFFIX.to_string(),
            small_cover: false,
            search_timeout_secs: DEFAULT_SEARCH_TIMEOUT_SECS,
            detail_timeout_secs: DEFAULT_DETAIL_TIMEOUT_SECS,
        }
    }
}

impl SourceConfig {
    /// Replacement tags for a raw genre, when tag conversion is on.
    /// Lookup is case-insensitive; unmapped genres are dropped.
    pub fn mapped_tags(&self, genre: &str) -> Option<&[String]> {
        self.genre_mappings
            .get(&genre.to_lowercase())
            .map(|tags| tags.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SourceConfig::default();
        assert_eq!(config.max_downloads, 5);
        assert!(!config.get_all_authors);
        assert!(config.get_category);
        assert!(!config.convert_tag);
        assert!(config.append_toc);
        assert!(!config.small_cover);
        assert!(config.comments_suffix.contains("aladin.co.kr"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SourceConfig =
            serde_json::from_str(r#"{"max_downloads": 2, "get_all_authors": true}"#).unwrap();
        assert_eq!(config.max_downloads, 2);
        assert!(config.get_all_authors);
        assert_eq!(config.search_timeout_secs, 30);
        assert_eq!(config.detail_timeout_secs, 20);
    }

    #[test]
    fn test_mapped_tags_case_insensitive() {
        let mut config = SourceConfig::default();
        config.genre_mappings.insert(
            "science fiction".to_string(),
            vec!["SF".to_string(), "소설".to_string()],
        );
        assert_eq!(
            config.mapped_tags("Science Fiction"),
            Some(&["SF".to_string(), "소설".to_string()][..])
        );
        assert_eq!(config.mapped_tags("unknown"), None);
    }
}
