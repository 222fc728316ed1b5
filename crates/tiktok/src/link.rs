//! Recognition of TikTok link shapes

use lazy_regex::{regex, Regex};

/// Supported link shapes, checked in order.
///
/// Every shape must span the whole (trimmed) text and may end with a
/// trailing slash, a query string or a fragment.
fn shapes() -> [&'static Regex; 4] {
    [
        // https://www.tiktok.com/@user/video/7234567890123456789
        regex!(r"^https?://(?:www\.|m\.)?tiktok\.com/@[\w.\-]+/video/\d+/?(?:[?#]\S*)?$"),
        // https://vm.tiktok.com/ZMabc123/
        regex!(r"^https?://(?:vm|vt)\.tiktok\.com/[\w\-]+/?(?:[?#]\S*)?$"),
        // https://www.tiktok.com/t/ZTabc123/
        regex!(r"^https?://(?:www\.|m\.)?tiktok\.com/t/[\w\-]+/?(?:[?#]\S*)?$"),
        // https://m.tiktok.com/v/7234567890123456789.html
        regex!(r"^https?://(?:www\.|m\.)?tiktok\.com/v/\d+(?:\.html)?/?(?:[?#]\S*)?$"),
    ]
}

/// Check whether the text is a link to a TikTok video
///
/// Surrounding whitespace is ignored; anything else around the link makes
/// the text invalid.
pub fn is_tiktok_url(text: &str) -> bool {
    let text = text.trim();
    shapes().iter().any(|shape| shape.is_match(text))
}
