//! Gallery page view model
//!
//! Flattens a rendered session into what the page draws: the filter bar,
//! one tile per photo with its grid span, the theme and tone state and the
//! about section.

use serde::Serialize;

use crate::error::Result;
use crate::layout::metrics::ViewportClass;
use crate::layout::mosaic::LayoutSpan;
use crate::media::transform::ImageUrls;
use crate::state::data::{Category, PhotoId, ALL_CATEGORY};
use crate::state::library::Library;
use crate::state::prefs::ImageTone;
use crate::state::session::GallerySession;
use crate::ui::theme::ThemeState;

/// Stagger between tile fade-in animations
pub const TILE_ANIMATION_STEP_MS: u64 = 28;

/// Label of the catch-all filter button
pub const ALL_LABEL: &str = "All";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterButton {
    pub id: String,
    pub name: String,
    pub active: bool,
}

/// Filter bar: "All" first, then the categories in order.
pub fn filter_buttons(categories: &[Category], active: &str) -> Vec<FilterButton> {
    std::iter::once((ALL_CATEGORY, ALL_LABEL))
        .chain(categories.iter().map(|c| (c.id.as_str(), c.name.as_str())))
        .map(|(id, name)| FilterButton {
            id: id.to_string(),
            name: name.to_string(),
            active: id == active,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryTile {
    pub id: PhotoId,
    pub title: String,
    /// Tile-sized image URL
    pub src: String,
    pub film: Option<String>,
    pub year: Option<String>,
    pub likes: i64,
    pub liked: bool,
    pub columns: u8,
    pub row_units: u8,
    pub animation_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToneState {
    pub tone: ImageTone,
    pub body_classes: Vec<&'static str>,
    pub bw_active: bool,
    pub iso400_active: bool,
}

impl From<ImageTone> for ToneState {
    fn from(tone: ImageTone) -> Self {
        Self {
            tone,
            body_classes: tone.body_classes(),
            bw_active: tone == ImageTone::Bw,
            iso400_active: tone == ImageTone::Iso400,
        }
    }
}

/// Escape text for inclusion in HTML
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render the about text: blank lines separate paragraphs, single newlines
/// become line breaks.
pub fn about_html(text: &str) -> String {
    text.split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .map(|p| format!("<p>{}</p>", escape_html(p).replace('\n', "<br>")))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryView {
    pub category: String,
    pub viewport: ViewportClass,
    pub row_unit_px: u32,
    pub filters: Vec<FilterButton>,
    pub tiles: Vec<GalleryTile>,
    pub theme: ThemeState,
    pub tone: ToneState,
    pub about_html: String,
    pub email: String,
    pub mailto: String,
}

impl GalleryView {
    /// Build the view for the session's current photos.
    ///
    /// `spans` must line up with [`GallerySession::current_photos`]; any
    /// photo past the end of `spans` gets the viewport's fallback span.
    pub fn build(
        session: &GallerySession,
        spans: &[LayoutSpan],
        library: &Library,
        urls: &ImageUrls,
    ) -> Result<Self> {
        let portfolio = session.portfolio();
        let viewport = session.viewport().class();

        let mut tiles = Vec::with_capacity(session.current_photos().len());
        for (index, photo) in session.current_photos().iter().enumerate() {
            let span = spans
                .get(index)
                .copied()
                .unwrap_or_else(|| LayoutSpan::fallback(viewport));
            tiles.push(GalleryTile {
                id: photo.id.clone(),
                title: photo.title.clone(),
                src: urls.tile(&photo.src),
                film: portfolio.film_label(photo),
                year: portfolio.year_label(photo),
                likes: library.current_likes(photo)?,
                liked: library.has_liked(&photo.id)?,
                columns: span.columns,
                row_units: span.row_units,
                animation_delay_ms: index as u64 * TILE_ANIMATION_STEP_MS,
            });
        }

        let email = portfolio.photographer.email.clone();
        Ok(Self {
            category: session.category().to_string(),
            viewport,
            row_unit_px: session.row_unit_px(),
            filters: filter_buttons(&portfolio.categories, session.category()),
            tiles,
            theme: session.theme_vars(),
            tone: session.preferences().tone.into(),
            about_html: about_html(&portfolio.photographer.about),
            mailto: format!("mailto:{email}"),
            email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::{default_categories, PortfolioData, PortfolioRows};
    use crate::state::prefs::Preferences;
    use crate::state::session::Viewport;

    #[test]
    fn test_filter_bar_order() {
        let buttons = filter_buttons(&default_categories(), ALL_CATEGORY);
        assert_eq!(buttons.len(), 5);
        assert_eq!(buttons[0].name, "All");
        assert!(buttons[0].active);
        assert_eq!(buttons[1].id, "portraits");
        assert!(buttons[1..].iter().all(|b| !b.active));

        let buttons = filter_buttons(&default_categories(), "nature");
        assert!(!buttons[0].active);
        assert!(buttons[4].active);
    }

    #[test]
    fn test_about_paragraphs() {
        assert_eq!(
            about_html("Hello\nthere\n\n\n\nSecond <b>"),
            "<p>Hello<br>there</p><p>Second &lt;b&gt;</p>"
        );
        assert_eq!(about_html(""), "");
        assert_eq!(about_html("  \n\n  "), "");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"a & "b" 'c'"#), "a &amp; &quot;b&quot; &#39;c&#39;");
    }

    #[test]
    fn test_tone_state() {
        let tone = ToneState::from(ImageTone::Iso400);
        assert!(tone.iso400_active);
        assert!(!tone.bw_active);
        assert_eq!(tone.body_classes, vec!["iso400-enabled"]);
    }

    #[test]
    fn test_gallery_view_tiles() {
        let rows: PortfolioRows = serde_json::from_value(serde_json::json!({
            "photos": [
                { "id": 1, "src": "https://res.cloudinary.com/d/image/upload/a.jpg", "title": "A", "likes": 2 },
                { "id": 2, "src": "b.jpg", "title": "B" }
            ],
            "settings": [
                { "key": "about", "value": "Hi" },
                { "key": "email", "value": "me@example.com" },
                { "key": "photo_years", "value": "{\"2\": 2020}" }
            ]
        }))
        .unwrap();
        let portfolio = PortfolioData::from_rows(rows);
        let library = Library::open_in_memory().unwrap();
        library.like_photo(&portfolio.photos[0]).unwrap();

        let mut session =
            GallerySession::new(portfolio, Preferences::default(), Viewport::new(1280, 1000));
        let pass = session.select_category(ALL_CATEGORY);
        let view = GalleryView::build(&session, &pass.spans, &library, &ImageUrls::new(None)).unwrap();

        assert_eq!(view.tiles.len(), 2);
        assert!(view.tiles[0].liked);
        assert_eq!(view.tiles[0].likes, 3);
        assert!(view.tiles[0].src.contains("/upload/f_auto"));
        assert_eq!(view.tiles[1].animation_delay_ms, 28);
        assert_eq!(view.tiles[1].year.as_deref(), Some("2020"));
        assert_eq!(view.tiles[1].src, "b.jpg");
        assert_eq!(view.row_unit_px, 48);
        assert_eq!(view.about_html, "<p>Hi</p>");
        assert_eq!(view.mailto, "mailto:me@example.com");
        assert_eq!(view.filters[0].name, "All");
    }
}
