//! Host-application collaborator
//!
//! The host owns identifier/cover caches and final metadata
//! normalization; the pipeline only calls through this trait. Caches
//! may be hit from several workers at once, so implementations must
//! serialize their own state.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::record::MetadataRecord;

pub trait Host: Send + Sync {
    /// Previously-cached item id for an ISBN, if any.
    fn cached_isbn_to_identifier(&self, isbn: &str) -> Option<String>;

    /// Previously-cached cover URL for an item id, if any.
    fn cached_identifier_to_cover_url(&self, item_id: &str) -> Option<String>;

    fn cache_isbn_to_identifier(&self, isbn: &str, item_id: &str);

    fn cache_identifier_to_cover_url(&self, item_id: &str, cover_url: &str);

    /// Final normalization pass applied to every record before it is
    /// pushed to the result channel. Default: leave it untouched.
    fn clean_downloaded_metadata(&self, _record: &mut MetadataRecord) {}

    /// Map a language name the fixed alias table did not recognize.
    /// Default: give up and drop the value.
    fn canonicalize_lang(&self, _raw: &str) -> Option<String> {
        None
    }
}

/// Host that caches nothing. Useful for one-shot lookups.
pub struct NoopHost;

impl Host for NoopHost {
    fn cached_isbn_to_identifier(&self, _isbn: &str) -> Option<String> {
        None
    }

    fn cached_identifier_to_cover_url(&self, _item_id: &str) -> Option<String> {
        None
    }

    fn cache_isbn_to_identifier(&self, _isbn: &str, _item_id: &str) {}

    fn cache_identifier_to_cover_url(&self, _item_id: &str, _cover_url: &str) {}
}

/// In-memory host, used by the CLI and tests.
#[derive(Default)]
pub struct MemoryHost {
    isbn_to_id: Mutex<HashMap<String, String>>,
    id_to_cover: Mutex<HashMap<String, String>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Host for MemoryHost {
    fn cached_isbn_to_identifier(&self, isbn: &str) -> Option<String> {
        self.isbn_to_id.lock().ok()?.get(isbn).cloned()
    }

    fn cached_identifier_to_cover_url(&self, item_id: &str) -> Option<String> {
        self.id_to_cover.lock().ok()?.get(item_id).cloned()
    }

    fn cache_isbn_to_identifier(&self, isbn: &str, item_id: &str) {
        if let Ok(mut map) = self.isbn_to_id.lock() {
            map.insert(isbn.to_string(), item_id.to_string());
        }
    }

    fn cache_identifier_to_cover_url(&self, item_id: &str, cover_url: &str) {
        if let Ok(mut map) = self.id_to_cover.lock() {
            map.insert(item_id.to_string(), cover_url.to_string());
        }
    }
}
