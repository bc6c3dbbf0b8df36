//! Shared test doubles: a scripted transport and page fixtures

// Each test binary uses its own slice of these helpers
#![allow(dead_code)]

pub mod fixtures;

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use aladin_source::{FetchError, Transport};

/// Canned answer for a `get_html` route.
pub enum Canned {
    Html(String),
    NotFound,
    Timeout,
}

/// Transport that serves canned responses keyed by URL substring and
/// records every request it sees, in order.
#[derive(Default)]
pub struct StubTransport {
    routes: Mutex<Vec<(String, Canned)>>,
    lengths: Mutex<HashMap<String, u64>>,
    bytes: Mutex<HashMap<String, Vec<u8>>>,
    requests: Mutex<Vec<String>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for any URL containing `pattern`. First match wins.
    pub fn respond(&self, pattern: &str, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .push((pattern.to_string(), Canned::Html(body.to_string())));
    }

    pub fn respond_with(&self, pattern: &str, canned: Canned) {
        self.routes
            .lock()
            .unwrap()
            .push((pattern.to_string(), canned));
    }

    /// Content-Length answer for HEAD probes on URLs containing
    /// `pattern`. Unprobed URLs answer `None`.
    pub fn set_length(&self, pattern: &str, length: u64) {
        self.lengths
            .lock()
            .unwrap()
            .insert(pattern.to_string(), length);
    }

    pub fn set_bytes(&self, pattern: &str, bytes: Vec<u8>) {
        self.bytes.lock().unwrap().insert(pattern.to_string(), bytes);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, pattern: &str) -> usize {
        self.requests()
            .iter()
            .filter(|url| url.contains(pattern))
            .count()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn get_html(
        &self,
        url: &str,
        _referer: Option<&str>,
        _timeout: Duration,
    ) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(format!("GET {url}"));
        let routes = self.routes.lock().unwrap();
        for (pattern, canned) in routes.iter() {
            if url.contains(pattern.as_str()) {
                return match canned {
                    Canned::Html(body) => Ok(body.clone()),
                    Canned::NotFound => Err(FetchError::NotFound),
                    Canned::Timeout => Err(FetchError::Timeout),
                };
            }
        }
        Err(FetchError::RequestFailed {
            message: format!("no canned response for {url}"),
        })
    }

    async fn get_bytes(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>, FetchError> {
        self.requests.lock().unwrap().push(format!("GET {url}"));
        let bytes = self.bytes.lock().unwrap();
        for (pattern, body) in bytes.iter() {
            if url.contains(pattern.as_str()) {
                return Ok(body.clone());
            }
        }
        Err(FetchError::RequestFailed {
            message: format!("no canned bytes for {url}"),
        })
    }

    async fn content_length(
        &self,
        url: &str,
        _timeout: Duration,
    ) -> Result<Option<u64>, FetchError> {
        self.requests.lock().unwrap().push(format!("HEAD {url}"));
        let lengths = self.lengths.lock().unwrap();
        for (pattern, length) in lengths.iter() {
            if url.contains(pattern.as_str()) {
                return Ok(Some(*length));
            }
        }
        Ok(None)
    }
}
