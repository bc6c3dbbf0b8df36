//! aladin-source: Aladin.co.kr metadata source for e-book library
//! managers
//!
//! Resolves one book query (ISBN, site item id, or title/author) into
//! zero or more ranked metadata records scraped from aladin.co.kr's
//! search and detail pages:
//! - query building and search-results parsing with format filtering
//! - concurrent detail-page workers streaming records through a
//!   shared channel
//! - defensive per-field extraction that tolerates page changes
//! - cover URL resolution with a liveness probe
//!
//! The host application supplies caching and normalization through the
//! [`Host`] trait and may substitute the HTTP layer through
//! [`Transport`]. Korean-language books are the primary target; the
//! default language is Korean.

pub mod comments;
pub mod config;
pub mod covers;
mod detail;
pub mod error;
pub mod host;
pub mod http;
pub mod identifiers;
pub mod language;
pub mod query;
pub mod record;
pub mod search;
pub mod source;
pub mod text;
pub mod urls;

pub use config::SourceConfig;
pub use error::{ExtractError, FetchError, SourceError};
pub use host::{Host, MemoryHost, NoopHost};
pub use http::{HttpTransport, Transport};
pub use identifiers::{check_isbn, Identifiers};
pub use query::SearchQuery;
pub use record::{MetadataRecord, Series};
pub use search::Candidate;
pub use source::{AladinSource, CoverDownload, LookupRequest, SourceInfo};
