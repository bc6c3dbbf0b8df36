//! The metadata source: identify, search, cover download
//!
//! Candidate gathering runs in two phases: first with identifiers
//! (direct detail URLs when an ISBN or item id is known), then once
//! more with title/author search only if the first phase matched
//! nothing. Detail workers fan out as tasks, staggered to avoid
//! bursting the origin, and stream records through the caller's
//! channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::SourceConfig;
use crate::detail::DetailWorker;
use crate::error::SourceError;
use crate::host::{Host, NoopHost};
use crate::http::{HttpTransport, Transport};
use crate::identifiers::{self, Identifiers};
use crate::query::SearchQuery;
use crate::record::MetadataRecord;
use crate::search::{self, Candidate};
use crate::text;
use crate::urls;

/// Delay between worker spawns.
const SPAWN_STAGGER: Duration = Duration::from_millis(100);

/// Static description of this source for host registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub base_url: &'static str,
    pub can_identify: bool,
    pub can_download_cover: bool,
    /// Record fields this source may fill in.
    pub touched_fields: &'static [&'static str],
}

/// What the host knows about the book it wants resolved.
#[derive(Debug, Clone, Default)]
pub struct LookupRequest {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub identifiers: Identifiers,
}

impl LookupRequest {
    fn has_title_and_authors(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.is_empty()) && !self.authors.is_empty()
    }
}

/// A downloaded cover image, tagged with the source id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverDownload {
    pub source: String,
    pub bytes: Vec<u8>,
}

pub struct AladinSource {
    transport: Arc<dyn Transport>,
    host: Arc<dyn Host>,
    config: Arc<SourceConfig>,
}

impl AladinSource {
    /// Source with the default HTTP transport and a host that caches
    /// nothing.
    pub fn new(config: SourceConfig) -> Self {
        Self::with_collaborators(Arc::new(HttpTransport::new()), Arc::new(NoopHost), config)
    }

    /// Source wired to host-supplied collaborators. Tests inject a
    /// scripted transport here.
    pub fn with_collaborators(
        transport: Arc<dyn Transport>,
        host: Arc<dyn Host>,
        config: SourceConfig,
    ) -> Self {
        Self {
            transport,
            host,
            config: Arc::new(config),
        }
    }

    pub fn info() -> SourceInfo {
        SourceInfo {
            id: "aladin",
            name: "Aladin.co.kr",
            description: "Downloads metadata and covers from aladin.co.kr",
            base_url: urls::BASE_URL,
            can_identify: true,
            can_download_cover: true,
            touched_fields: &[
                "title",
                "authors",
                "identifier:aladin.co.kr",
                "identifier:isbn",
                "rating",
                "comments",
                "publisher",
                "pubdate",
                "tags",
                "series",
                "languages",
            ],
        }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Detail-page URL for a known item id, for host UI linking.
    pub fn book_url(&self, identifiers: &Identifiers) -> Option<String> {
        identifiers::book_url(identifiers)
    }

    /// Resolve a lookup request into zero or more metadata records,
    /// streamed through `results`. An empty stream plus log output is
    /// the normal shape for "no matches"; only unusable input
    /// (`NoQuery`) or a failed search fetch surface as errors.
    ///
    /// Delivery order is not candidate order: consumers sort drained
    /// records by `source_relevance`.
    pub async fn identify(
        &self,
        request: &LookupRequest,
        results: UnboundedSender<MetadataRecord>,
        abort: &CancellationToken,
    ) -> Result<(), SourceError> {
        let mut candidates = self.gather_candidates(request, true).await?;

        if candidates.is_empty()
            && request.has_title_and_authors()
            && !request.identifiers.is_empty()
        {
            info!("no matches found with identifiers, retrying using only title and authors");
            candidates = self.gather_candidates(request, false).await?;
        }

        if abort.is_cancelled() {
            return Ok(());
        }
        if candidates.is_empty() {
            error!("no matches found");
            return Ok(());
        }

        let mut workers = JoinSet::new();
        for candidate in candidates {
            if abort.is_cancelled() {
                break;
            }
            let worker = DetailWorker {
                transport: Arc::clone(&self.transport),
                host: Arc::clone(&self.host),
                config: Arc::clone(&self.config),
                url: candidate.url,
                rank: candidate.rank,
                results: results.clone(),
                abort: abort.clone(),
            };
            workers.spawn(worker.run());
            // Don't send all requests at the same time
            tokio::time::sleep(SPAWN_STAGGER).await;
        }

        loop {
            tokio::select! {
                finished = workers.join_next() => {
                    match finished {
                        Some(Ok(())) => {}
                        Some(Err(e)) => debug!("detail worker panicked: {}", e),
                        None => break,
                    }
                }
                _ = abort.cancelled() => {
                    debug!("identify aborted with workers outstanding");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Candidate detail-page URLs for a query, without fetching any
    /// detail pages. Also the diagnostic entry point for hosts.
    pub async fn search(
        &self,
        query: &SearchQuery,
        max_candidates: usize,
    ) -> Result<Vec<Candidate>, SourceError> {
        let Some(search_url) = query.search_url() else {
            // Item-id queries address a detail page directly
            return Ok(query
                .direct_detail_url()
                .into_iter()
                .map(|url| Candidate { rank: 0, url })
                .collect());
        };

        debug!("querying: {}", search_url);
        let timeout = Duration::from_secs(self.config.search_timeout_secs);
        let raw = self.transport.get_html(&search_url, None, timeout).await?;
        let html = text::clean_ascii_chars(&raw);

        let candidates = match query {
            SearchQuery::ByIsbn(_) => search::parse_isbn_search(&html, max_candidates),
            _ => {
                let (title, authors) = match query {
                    SearchQuery::ByTitleAuthor { title, authors, .. } => {
                        (title.as_deref(), authors.as_slice())
                    }
                    _ => (None, &[][..]),
                };
                search::parse_keyword_search(&html, title, authors, max_candidates)
            }
        };
        Ok(candidates)
    }

    async fn gather_candidates(
        &self,
        request: &LookupRequest,
        use_identifiers: bool,
    ) -> Result<Vec<Candidate>, SourceError> {
        if use_identifiers {
            // A known ISBN or item id addresses the detail page
            // directly; no search round-trip.
            if let Some(isbn) = request.identifiers.valid_isbn() {
                return Ok(vec![Candidate {
                    rank: 0,
                    url: urls::detail_url_for_isbn(&isbn),
                }]);
            }
            if let Some(item_id) = request.identifiers.item_id.as_deref() {
                return Ok(vec![Candidate {
                    rank: 0,
                    url: urls::detail_url_for_item(item_id),
                }]);
            }
        }

        let query = SearchQuery::build_keyword(request.title.as_deref(), &request.authors)?;
        self.search(&query, self.config.max_downloads).await
    }

    /// Find and download a cover image for the request. Cached
    /// id-to-cover mappings are consulted first; otherwise a full
    /// identify populates them. Failures downgrade to `Ok(None)` with
    /// a log line; the host never sees an error for a missing cover.
    pub async fn download_cover(
        &self,
        request: &LookupRequest,
        abort: &CancellationToken,
    ) -> Result<Option<CoverDownload>, SourceError> {
        let mut cached_url = self.cached_cover_url(&request.identifiers);

        if cached_url.is_none() {
            info!("no cached cover found, running identify");
            let (tx, mut rx) = mpsc::unbounded_channel();
            self.identify(request, tx, abort).await?;
            if abort.is_cancelled() {
                return Ok(None);
            }

            let mut records = Vec::new();
            while let Ok(record) = rx.try_recv() {
                records.push(record);
            }
            records.sort_by_key(|record| record.source_relevance);

            for record in &records {
                if let Some(url) = record
                    .cover_url
                    .clone()
                    .or_else(|| self.cached_cover_url(&record.identifiers))
                {
                    cached_url = Some(url);
                    break;
                }
            }
        }

        let Some(cover_url) = cached_url else {
            info!("no cover found");
            return Ok(None);
        };

        if abort.is_cancelled() {
            return Ok(None);
        }

        info!("downloading cover from: {}", cover_url);
        let timeout = Duration::from_secs(self.config.detail_timeout_secs);
        match self.transport.get_bytes(&cover_url, timeout).await {
            Ok(bytes) => Ok(Some(CoverDownload {
                source: Self::info().id.to_string(),
                bytes,
            })),
            Err(e) => {
                error!("failed to download cover from {}: {}", cover_url, e);
                Ok(None)
            }
        }
    }

    fn cached_cover_url(&self, ids: &Identifiers) -> Option<String> {
        let item_id = ids.item_id.clone().or_else(|| {
            ids.isbn
                .as_deref()
                .and_then(|isbn| self.host.cached_isbn_to_identifier(isbn))
        })?;
        self.host.cached_identifier_to_cover_url(&item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_info() {
        let info = AladinSource::info();
        assert_eq!(info.id, "aladin");
        assert!(info.can_identify);
        assert!(info.can_download_cover);
        assert!(info.touched_fields.contains(&"identifier:aladin.co.kr"));
    }

    #[test]
    fn test_book_url_from_item_id() {
        let source = AladinSource::new(SourceConfig::default());
        let ids = Identifiers::from_item_id("8932008485");
        assert_eq!(
            source.book_url(&ids).as_deref(),
            Some("http://www.aladin.co.kr/shop/wproduct.aspx?ItemId=8932008485")
        );
        assert_eq!(source.book_url(&Identifiers::default()), None);
    }
}
