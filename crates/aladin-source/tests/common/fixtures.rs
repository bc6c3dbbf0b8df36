//! HTML page builders mirroring aladin.co.kr's markup

/// Detail page for 체 게바라 평전 (series 역사 인물 찾기 10).
pub fn che_guevara_detail() -> String {
    detail_page(&DetailSpec {
        item_id: "48105",
        title: "체 게바라 평전 (반양장)",
        series: Some("역사 인물 찾기 10"),
        authors: &[("장 코르미에", "지은이"), ("김미선", "옮긴이")],
        isbn: Some("9788939205109"),
        rating: Some("8.7"),
        publisher: "실천문학사",
        pubdate: "2005-05-25",
        cover: "http://image.aladin.co.kr/product/666/65/cover/8939205103_1.jpg",
        language: Some("Korean"),
        description: "쿠바 혁명의 전설적 지도자",
    })
}

/// Detail page for 광장 (no series, single author).
pub fn gwangjang_detail() -> String {
    detail_page(&DetailSpec {
        item_id: "8932008485",
        title: "광장 (최인훈 전집)",
        series: None,
        authors: &[("최인훈", "지은이")],
        isbn: Some("9788932008486"),
        rating: Some("9.0"),
        publisher: "문학과지성사",
        pubdate: "2005-01-15",
        cover: "http://image.aladin.co.kr/product/466/2/cover/8932008486_1.jpg",
        language: None,
        description: "밀실과 광장 사이",
    })
}

pub struct DetailSpec<'a> {
    pub item_id: &'a str,
    pub title: &'a str,
    pub series: Option<&'a str>,
    pub authors: &'a [(&'a str, &'a str)],
    pub isbn: Option<&'a str>,
    pub rating: Option<&'a str>,
    pub publisher: &'a str,
    pub pubdate: &'a str,
    pub cover: &'a str,
    pub language: Option<&'a str>,
    pub description: &'a str,
}

pub fn detail_page(spec: &DetailSpec<'_>) -> String {
    let series_html = spec
        .series
        .map(|s| {
            format!(r#"<span><a href="/shop/common/wseriesitem.aspx?SRID=1">{s}</a></span>"#)
        })
        .unwrap_or_default();
    let isbn_meta = spec
        .isbn
        .map(|isbn| format!(r#"<meta property="books:isbn" content="{isbn}"/>"#))
        .unwrap_or_default();
    let rating_html = spec
        .rating
        .map(|r| format!(r#"<span class="star_nom">{r}</span>"#))
        .unwrap_or_default();
    let language_info = spec
        .language
        .map(|lang| format!(" | 언어 : {lang}"))
        .unwrap_or_default();
    let authors_html = spec
        .authors
        .iter()
        .map(|(name, role)| {
            format!(
                r#"<a class="np_af" href="/search/wsearchresult.aspx?AuthorSearch={name}@1">{name}</a> ({role}),"#
            )
        })
        .collect::<Vec<_>>()
        .join("\n    ");

    format!(
        r#"<html>
<head>
  <title>[알라딘]{title}</title>
  <meta property="og:url" content="http://www.aladin.co.kr/shop/wproduct.aspx?ItemId={item_id}"/>
  <meta property="og:image" content="{cover}"/>
  {isbn_meta}
  <meta itemprop="datePublished" content="{pubdate}"/>
  <meta name="Description" content="{description}"/>
</head>
<body>
  <div>
    <a class="p_topt01" href="/shop/wproduct.aspx?ItemId={item_id}">{title}</a>
    {series_html}
  </div>
  <div class="p_goodstd03">양장본 | 300쪽{language_info}</div>
  <div>
    {authors_html}
    <a class="np_af" href="/search/wsearchresult.aspx?PublisherSearch={publisher}@1">{publisher}</a> | {pubdate}
  </div>
  {rating_html}
  <div class="p_categorize">
    <ul><li>국내도서 &gt; 소설 &gt; 한국소설</li></ul>
  </div>
  <div id="div_itemtaglist">
    <a href="/tag/wtagitem.aspx?tagname=한국문학">한국문학</a>
  </div>
</body>
</html>"#,
        title = spec.title,
        item_id = spec.item_id,
        cover = spec.cover,
        isbn_meta = isbn_meta,
        pubdate = spec.pubdate,
        description = spec.description,
        series_html = series_html,
        language_info = language_info,
        authors_html = authors_html,
        publisher = spec.publisher,
        rating_html = rating_html,
    )
}

/// Contents-endpoint fragment carrying an introduction block and the
/// table of contents.
pub fn introduction_fragment(text: &str) -> String {
    format!(
        r#"<div class="Ere_prod_mconts_box">
  <div class="Ere_prod_mconts_LS">책소개</div>
  <div class="Ere_prod_mconts_R">{text}</div>
</div>
<div id="div_TOC_All"><p>1장<br>2장</p></div>"#
    )
}

/// A search-results page wrapping the given result blocks.
pub fn search_page(blocks: &str) -> String {
    format!(r#"<html><body><div id="Search3_Result">{blocks}</div></body></html>"#)
}

/// One keyword-search result block.
pub fn keyword_result_block(title: &str, item_id: &str, authors: &[&str]) -> String {
    let author_links = authors
        .iter()
        .map(|a| {
            format!(
                r#"<a class="np_af" href="/search/wsearchresult.aspx?AuthorSearch={a}@1">{a}</a>"#
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"<div class="ss_book_box">
  <div class="ss_book_list">
    <div><a href="/shop/wproduct.aspx?ItemId={item_id}"><b>{title}</b></a></div>
    <div>{author_links}</div>
  </div>
</div>"#
    )
}

/// One ISBN-search result block.
pub fn isbn_result_block(title: &str, isbn: &str) -> String {
    format!(
        r#"<div class="ss_book_box">
  <div class="ss_book_list">
    <a class="bo3" href="/shop/wproduct.aspx?ISBN={isbn}"><b>{title}</b></a>
  </div>
</div>"#
    )
}

/// The origin's generic "how to choose a good book" page, served for
/// unknown item ids.
pub fn generic_fallback_page() -> String {
    r#"<html><head><title>[알라딘] "좋은 책을 고르는 방법, 알라딘"</title></head>
<body><div>알라딘 추천</div></body></html>"#
        .to_string()
}
