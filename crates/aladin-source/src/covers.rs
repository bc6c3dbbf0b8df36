//! Cover URL resolution
//!
//! The detail page advertises a small cover in its `og:image` meta
//! tag. Depending on configuration the URL is used as-is or rewritten
//! to the large `letslook` variant, then checked with a liveness probe
//! because the origin serves broken placeholder links for some items.

use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::http::Transport;

/// Filename markers the origin uses for its "no cover" placeholders.
const NO_IMAGE_MARKERS: &[&str] = &["noimg", "img_no"];

/// Accept a probed cover only above this Content-Length.
const MIN_COVER_BYTES: u64 = 1000;

lazy_static! {
    static ref SIZE_SUFFIX: Regex = Regex::new(r"_\d\.(jpg|gif)").unwrap();
}

/// True when the URL points at a known no-image placeholder.
pub fn is_no_image(url: &str) -> bool {
    NO_IMAGE_MARKERS.iter().any(|marker| url.contains(marker))
}

/// Rewrite a small cover URL to the large-resolution variant:
/// `/cover/` becomes `/letslook/` and a `_N.jpg`/`_N.gif` size suffix
/// becomes `_f.jpg`.
pub fn enlarge_cover_url(small: &str) -> String {
    let enlarged = small.replace("/cover/", "/letslook/");
    SIZE_SUFFIX.replace_all(&enlarged, "_f.jpg").into_owned()
}

/// Resolve the advertised small cover URL to a validated cover URL,
/// or `None` when the origin has no usable image. Placeholder URLs
/// short-circuit without a probe.
pub(crate) async fn resolve_cover_url(
    transport: &dyn Transport,
    small_url: &str,
    prefer_small: bool,
    timeout: Duration,
) -> Option<String> {
    if is_no_image(small_url) {
        debug!("no cover image at origin: {}", small_url);
        return None;
    }

    let url = if prefer_small {
        small_url.to_string()
    } else {
        enlarge_cover_url(small_url)
    };

    match transport.content_length(&url, timeout).await {
        Ok(Some(length)) if length > MIN_COVER_BYTES => Some(url),
        Ok(_) => {
            debug!("cover probe too small, dropping: {}", url);
            None
        }
        Err(e) => {
            debug!("cover probe failed for {}: {}", url, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_image_markers() {
        assert!(is_no_image("http://image.aladin.co.kr/img/noimg_b.gif"));
        assert!(is_no_image("http://image.aladin.co.kr/img/img_no.jpg"));
        assert!(!is_no_image(
            "http://image.aladin.co.kr/product/666/65/cover/898040932x_1.jpg"
        ));
    }

    #[test]
    fn test_enlarge_cover_url() {
        assert_eq!(
            enlarge_cover_url("http://image.aladin.co.kr/product/666/65/cover/898040932x_1.jpg"),
            "http://image.aladin.co.kr/product/666/65/letslook/898040932x_f.jpg"
        );
        assert_eq!(
            enlarge_cover_url("http://image.aladin.co.kr/product/466/2/cover/8971460326_2.gif"),
            "http://image.aladin.co.kr/product/466/2/letslook/8971460326_f.jpg"
        );
    }

    #[test]
    fn test_enlarge_leaves_unknown_shapes_alone() {
        assert_eq!(
            enlarge_cover_url("http://image.aladin.co.kr/special/full.jpg"),
            "http://image.aladin.co.kr/special/full.jpg"
        );
    }
}
