//! Image CDN URL transforms
//!
//! Photos hosted on Cloudinary are resized on the fly by injecting a
//! transform segment after `/upload/`. Every served size carries a small
//! copyright watermark with the current year.

use chrono::{Datelike, Utc};

/// Transform for gallery tiles
pub const TILE_TRANSFORM: &str = "f_auto,q_auto,dpr_auto,w_400,c_limit";
/// Transform for the lightbox
pub const LIGHTBOX_TRANSFORM: &str = "f_auto,q_auto,dpr_auto,w_1600,c_limit";

const CDN_HOST: &str = "res.cloudinary.com";
const UPLOAD_SEGMENT: &str = "/upload/";

/// Insert a transform into a CDN URL. Other URLs are returned unchanged.
pub fn with_transform(url: &str, transform: &str) -> String {
    if !url.contains(CDN_HOST) || !url.contains(UPLOAD_SEGMENT) {
        return url.to_string();
    }
    url.replacen(UPLOAD_SEGMENT, &format!("/upload/{transform}/"), 1)
}

/// Copyright watermark overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watermark {
    /// Text after the © and year
    pub owner: String,
    pub year: i32,
}

impl Watermark {
    /// Watermark for the current UTC year
    pub fn current(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            year: Utc::now().year(),
        }
    }

    /// Append the watermark layer to a transform
    pub fn apply(&self, transform: &str) -> String {
        format!(
            "{transform},l_text:Arial_28:%C2%A9%20{year}%20{owner},co_white,o_48,g_south_east,x_18,y_18",
            year = self.year,
            owner = encode_text(&self.owner),
        )
    }
}

/// Percent-encode text for a transform text layer.
fn encode_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Resolves the URL to show for a photo at a given size
#[derive(Debug, Clone, Default)]
pub struct ImageUrls {
    watermark: Option<Watermark>,
}

impl ImageUrls {
    pub fn new(watermark: Option<Watermark>) -> Self {
        Self { watermark }
    }

    fn url(&self, src: &str, transform: &str) -> String {
        match &self.watermark {
            Some(mark) => with_transform(src, &mark.apply(transform)),
            None => with_transform(src, transform),
        }
    }

    pub fn tile(&self, src: &str) -> String {
        self.url(src, TILE_TRANSFORM)
    }

    pub fn lightbox(&self, src: &str) -> String {
        self.url(src, LIGHTBOX_TRANSFORM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CDN_URL: &str = "https://res.cloudinary.com/demo/image/upload/v1/portfolio/a.jpg";

    #[test]
    fn test_transform_only_touches_cdn_urls() {
        assert_eq!(
            with_transform(CDN_URL, "w_400"),
            "https://res.cloudinary.com/demo/image/upload/w_400/v1/portfolio/a.jpg"
        );
        assert_eq!(with_transform("https://example.com/upload/a.jpg", "w_400"), "https://example.com/upload/a.jpg");
        assert_eq!(with_transform("https://res.cloudinary.com/demo/a.jpg", "w_400"), "https://res.cloudinary.com/demo/a.jpg");
        assert_eq!(with_transform("", "w_400"), "");
    }

    #[test]
    fn test_only_first_upload_segment_replaced() {
        let url = "https://res.cloudinary.com/d/image/upload/upload/a.jpg";
        assert_eq!(
            with_transform(url, "t"),
            "https://res.cloudinary.com/d/image/upload/t/upload/a.jpg"
        );
    }

    #[test]
    fn test_watermark_layer() {
        let mark = Watermark {
            owner: "emmaknipst".into(),
            year: 2026,
        };
        assert_eq!(
            mark.apply("w_400"),
            "w_400,l_text:Arial_28:%C2%A9%202026%20emmaknipst,co_white,o_48,g_south_east,x_18,y_18"
        );
    }

    #[test]
    fn test_watermark_owner_is_encoded() {
        let mark = Watermark {
            owner: "Jo Doe/Studio".into(),
            year: 2024,
        };
        assert!(mark.apply("t").contains("%202024%20Jo%20Doe%2FStudio,co_white"));
    }

    #[test]
    fn test_current_year() {
        assert_eq!(Watermark::current("x").year, Utc::now().year());
    }

    #[test]
    fn test_image_urls_sizes() {
        let urls = ImageUrls::new(None);
        assert!(urls.tile(CDN_URL).contains("/upload/f_auto,q_auto,dpr_auto,w_400,c_limit/"));
        assert!(urls.lightbox(CDN_URL).contains("w_1600"));
        assert_eq!(urls.tile("local/a.jpg"), "local/a.jpg");

        let marked = ImageUrls::new(Some(Watermark { owner: "me".into(), year: 2025 }));
        assert!(marked.tile(CDN_URL).contains("w_400,c_limit,l_text:Arial_28"));
    }
}
