//! Search parsing properties exercised through the public search entry

mod common;

use std::sync::Arc;

use aladin_source::{
    AladinSource, Candidate, Identifiers, MemoryHost, SearchQuery, SourceConfig, SourceError,
};
use common::fixtures;
use common::{Canned, StubTransport};

fn source_with(transport: Arc<StubTransport>) -> AladinSource {
    AladinSource::with_collaborators(
        transport,
        Arc::new(MemoryHost::new()),
        SourceConfig::default(),
    )
}

fn urls(candidates: &[Candidate]) -> Vec<&str> {
    candidates.iter().map(|c| c.url.as_str()).collect()
}

// === ISBN variant ===

#[tokio::test]
async fn test_isbn_search_candidates_in_document_order() {
    let transport = Arc::new(StubTransport::new());
    let blocks = fixtures::isbn_result_block("광장", "8932008485")
        + &fixtures::isbn_result_block("광장 개정판", "9788932008486");
    transport.respond(
        "wsearchresult.aspx?SearchType=3",
        &fixtures::search_page(&blocks),
    );

    let source = source_with(transport.clone());
    let query = SearchQuery::build(None, &[], &Identifiers::from_isbn("9788932008486")).unwrap();
    let candidates = source.search(&query, 5).await.unwrap();

    assert_eq!(
        urls(&candidates),
        vec![
            "http://www.aladin.co.kr/shop/wproduct.aspx?ISBN=8932008485",
            "http://www.aladin.co.kr/shop/wproduct.aspx?ISBN=9788932008486",
        ]
    );
    assert_eq!(candidates[0].rank, 0);
    assert_eq!(candidates[1].rank, 1);
    assert!(transport
        .requests()
        .iter()
        .any(|r| r.contains("KeyISBN=9788932008486")));
}

#[tokio::test]
async fn test_isbn_search_caps_at_max_candidates() {
    let transport = Arc::new(StubTransport::new());
    let blocks: String = (0..10)
        .map(|i| fixtures::isbn_result_block(&format!("책 {i}"), &format!("897012264{i}")))
        .collect();
    transport.respond("wsearchresult.aspx", &fixtures::search_page(&blocks));

    let source = source_with(transport);
    let query = SearchQuery::build(None, &[], &Identifiers::from_isbn("9788939205109")).unwrap();
    let candidates = source.search(&query, 3).await.unwrap();

    assert_eq!(candidates.len(), 3);
    assert!(candidates[2].url.ends_with("ISBN=8970122642"));
}

#[tokio::test]
async fn test_isbn_search_filters_formats_but_not_titles() {
    let transport = Arc::new(StubTransport::new());
    let blocks = fixtures::isbn_result_block("전혀 다른 제목 (Audiobook)", "1111111111")
        + &fixtures::isbn_result_block("전혀 다른 제목", "8932008485");
    transport.respond("wsearchresult.aspx", &fixtures::search_page(&blocks));

    let source = source_with(transport);
    let query = SearchQuery::build(None, &[], &Identifiers::from_isbn("9788939205109")).unwrap();
    let candidates = source.search(&query, 5).await.unwrap();

    // ISBN search trusts the origin's matching: the mismatched title
    // stays, only the unsupported format goes
    assert_eq!(candidates.len(), 1);
    assert!(candidates[0].url.contains("8932008485"));
}

// === Keyword variant ===

#[tokio::test]
async fn test_keyword_search_rejects_non_matching_and_denylisted() {
    let transport = Arc::new(StubTransport::new());
    let blocks = fixtures::keyword_result_block("광장", "1", &["최인훈"])
        + &fixtures::keyword_result_block("광장 [eBook]", "2", &["최인훈"])
        + &fixtures::keyword_result_block("전혀 다른 책", "3", &["다른사람"])
        + &fixtures::keyword_result_block("광장으로 가는 길", "4", &["최인훈"]);
    transport.respond("wsearchresult.aspx", &fixtures::search_page(&blocks));

    let source = source_with(transport);
    let query =
        SearchQuery::build(Some("광장"), &["최인훈".to_string()], &Identifiers::default())
            .unwrap();
    let candidates = source.search(&query, 5).await.unwrap();

    assert_eq!(
        urls(&candidates),
        vec![
            "http://www.aladin.co.kr/shop/wproduct.aspx?ItemId=1",
            "http://www.aladin.co.kr/shop/wproduct.aspx?ItemId=4",
        ]
    );
}

#[tokio::test]
async fn test_item_id_query_needs_no_search_page() {
    let transport = Arc::new(StubTransport::new());
    let source = source_with(transport.clone());

    let query =
        SearchQuery::build(None, &[], &Identifiers::from_item_id("8932008485")).unwrap();
    let candidates = source.search(&query, 5).await.unwrap();

    assert_eq!(
        urls(&candidates),
        vec!["http://www.aladin.co.kr/shop/wproduct.aspx?ItemId=8932008485"]
    );
    assert!(transport.requests().is_empty());
}

// === Failure paths ===

#[tokio::test]
async fn test_search_fetch_timeout_surfaces_as_timeout() {
    let transport = Arc::new(StubTransport::new());
    transport.respond_with("wsearchresult.aspx", Canned::Timeout);

    let source = source_with(transport);
    let query = SearchQuery::build(Some("광장"), &[], &Identifiers::default()).unwrap();
    let err = source.search(&query, 5).await.unwrap_err();

    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_search_fetch_failure_surfaces_as_fetch_error() {
    let transport = Arc::new(StubTransport::new());
    // No routes at all: the stub answers with a request failure

    let source = source_with(transport);
    let query = SearchQuery::build(Some("광장"), &[], &Identifiers::default()).unwrap();
    let err = source.search(&query, 5).await.unwrap_err();

    assert!(matches!(err, SourceError::Fetch(_)));
}

#[tokio::test]
async fn test_unparseable_page_yields_no_candidates() {
    let transport = Arc::new(StubTransport::new());
    transport.respond("wsearchresult.aspx", "not html at all %%% \u{0}\u{1}");

    let source = source_with(transport);
    let query = SearchQuery::build(Some("광장"), &[], &Identifiers::default()).unwrap();
    let candidates = source.search(&query, 5).await.unwrap();

    assert!(candidates.is_empty());
}
