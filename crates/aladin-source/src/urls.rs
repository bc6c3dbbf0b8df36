//! URL builders for the origin's endpoints

pub const BASE_URL: &str = "http://www.aladin.co.kr";

/// Which variant of the description endpoint to request.
///
/// `Introduce` carries the introduction for native books;
/// `PublisherDesc` carries the publisher description used for foreign
/// books.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentsVariant {
    Introduce,
    PublisherDesc,
}

impl ContentsVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentsVariant::Introduce => "Introduce",
            ContentsVariant::PublisherDesc => "PublisherDesc",
        }
    }
}

/// ISBN-scoped search-results page.
pub fn isbn_search_url(isbn: &str) -> String {
    format!("{BASE_URL}/search/wsearchresult.aspx?SearchType=3&KeyISBN={isbn}")
}

/// General keyword search-results page. `joined_tokens` must already be
/// percent-encoded and `+`-joined.
pub fn keyword_search_url(joined_tokens: &str) -> String {
    format!("{BASE_URL}/search/wsearchresult.aspx?SearchTarget=All&SearchWord={joined_tokens}")
}

/// Detail page addressed by ISBN (the origin redirects to the ItemId
/// form).
pub fn detail_url_for_isbn(isbn: &str) -> String {
    format!("{BASE_URL}/shop/wproduct.aspx?ISBN={isbn}")
}

/// Detail page addressed by the origin's item id.
pub fn detail_url_for_item(item_id: &str) -> String {
    format!("{BASE_URL}/shop/wproduct.aspx?ItemId={item_id}")
}

/// Description endpoint for a book. `hour` is the origin's hour-of-day
/// cache-buster.
pub fn contents_url(isbn: &str, variant: ContentsVariant, hour: u32) -> String {
    format!(
        "{BASE_URL}/shop/product/getContents.aspx?ISBN={isbn}&name={}&type=0&date={hour}",
        variant.as_str()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isbn_search_url_form() {
        assert_eq!(
            isbn_search_url("9788939205109"),
            "http://www.aladin.co.kr/search/wsearchresult.aspx?SearchType=3&KeyISBN=9788939205109"
        );
    }

    #[test]
    fn test_keyword_search_url_form() {
        assert_eq!(
            keyword_search_url("%EA%B4%91%EC%9E%A5+%EC%B5%9C%EC%9D%B8%ED%9B%88"),
            "http://www.aladin.co.kr/search/wsearchresult.aspx?SearchTarget=All&SearchWord=%EA%B4%91%EC%9E%A5+%EC%B5%9C%EC%9D%B8%ED%9B%88"
        );
    }

    #[test]
    fn test_detail_urls() {
        assert_eq!(
            detail_url_for_isbn("8932008485"),
            "http://www.aladin.co.kr/shop/wproduct.aspx?ISBN=8932008485"
        );
        assert_eq!(
            detail_url_for_item("48105"),
            "http://www.aladin.co.kr/shop/wproduct.aspx?ItemId=48105"
        );
    }

    #[test]
    fn test_contents_url_variants() {
        assert_eq!(
            contents_url("8970122648", ContentsVariant::Introduce, 16),
            "http://www.aladin.co.kr/shop/product/getContents.aspx?ISBN=8970122648&name=Introduce&type=0&date=16"
        );
        assert!(
            contents_url("0385340583", ContentsVariant::PublisherDesc, 15).contains("name=PublisherDesc")
        );
    }
}
