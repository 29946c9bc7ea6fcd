//! Gallery rendering session
//!
//! One `GallerySession` owns everything the page used to keep in globals:
//! the loaded portfolio, the photos currently shown, the aspect-ratio
//! cache, the layout generation counter, the last laid-out width, the
//! viewer preferences and the lightbox.
//!
//! Layout runs in two passes. [`GallerySession::render`] answers at once
//! with spans from cached ratios (1.0 for unknown images) and hands back a
//! [`LayoutRequest`] for whatever still needs measuring. Once that resolves,
//! [`GallerySession::apply_refinement`] returns refined spans, unless a newer
//! render has been issued in the meantime, in which case the result is
//! dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::layout::metrics::{self, ResizeDebouncer, ViewportClass};
use crate::layout::mosaic::{build_layout, LayoutSpan};
use crate::media::aspect::{measure_all, AspectCache, AspectMeasure};
use crate::state::data::{PhotoId, Photo, PortfolioData, ALL_CATEGORY};
use crate::state::prefs::{ImageTone, Preferences, ThemeMode};
use crate::ui::lightbox::{Lightbox, ViewEvent};
use crate::ui::theme::{apply_theme, ThemeState};

/// Cancellation token for one layout request.
///
/// Issuing a newer token makes every older one stale.
#[derive(Debug, Clone)]
pub struct LayoutToken {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl LayoutToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Still the most recent request
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::Acquire) == self.generation
    }
}

#[derive(Debug, Default)]
struct LayoutGenerations {
    latest: Arc<AtomicU64>,
}

impl LayoutGenerations {
    fn issue(&self) -> LayoutToken {
        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        LayoutToken {
            generation,
            latest: Arc::clone(&self.latest),
        }
    }
}

/// Sources a render still needs measured
#[derive(Debug, Clone)]
pub struct LayoutRequest {
    pub token: LayoutToken,
    pub viewport: ViewportClass,
    pub sources: Vec<String>,
}

impl LayoutRequest {
    /// Measure the missing sources.
    ///
    /// A request that is already stale skips the measurements.
    pub async fn resolve<M>(self, measurer: Arc<M>) -> ResolvedLayout
    where
        M: AspectMeasure + 'static,
    {
        let ratios = if self.token.is_current() {
            measure_all(measurer, self.sources).await
        } else {
            Vec::new()
        };
        ResolvedLayout {
            token: self.token,
            viewport: self.viewport,
            ratios,
        }
    }
}

/// Measurements returned for a [`LayoutRequest`]
#[derive(Debug, Clone)]
pub struct ResolvedLayout {
    pub token: LayoutToken,
    pub viewport: ViewportClass,
    pub ratios: Vec<(String, f64)>,
}

/// Output of one render
#[derive(Debug, Clone)]
pub struct RenderPass {
    pub token: LayoutToken,
    pub viewport: ViewportClass,
    pub row_unit_px: u32,
    /// First-pass spans, one per current photo
    pub spans: Vec<LayoutSpan>,
    /// Present when some images still need measuring
    pub refinement: Option<LayoutRequest>,
}

/// Window and grid widths in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub window_width: u32,
    pub grid_width: u32,
}

impl Viewport {
    pub fn new(window_width: u32, grid_width: u32) -> Self {
        Self {
            window_width,
            grid_width,
        }
    }

    pub fn class(&self) -> ViewportClass {
        ViewportClass::from_window_width(self.window_width)
    }
}

pub struct GallerySession {
    portfolio: PortfolioData,
    current: Vec<Photo>,
    category: String,
    aspect_cache: AspectCache,
    generations: LayoutGenerations,
    viewport: Viewport,
    last_grid_width: u32,
    debouncer: ResizeDebouncer,
    prefs: Preferences,
    lightbox: Lightbox,
}

impl GallerySession {
    pub fn new(portfolio: PortfolioData, prefs: Preferences, viewport: Viewport) -> Self {
        let mut aspect_cache = AspectCache::new();
        aspect_cache.retain_sources(portfolio.photos.iter().map(|p| p.src.as_str()));

        Self {
            portfolio,
            current: Vec::new(),
            category: ALL_CATEGORY.to_string(),
            aspect_cache,
            generations: LayoutGenerations::default(),
            viewport,
            last_grid_width: viewport.grid_width,
            debouncer: ResizeDebouncer::default(),
            prefs,
            lightbox: Lightbox::new(),
        }
    }

    // ========== Accessors ==========

    pub fn portfolio(&self) -> &PortfolioData {
        &self.portfolio
    }

    pub fn current_photos(&self) -> &[Photo] {
        &self.current
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn preferences(&self) -> Preferences {
        self.prefs
    }

    pub fn aspect_cache(&self) -> &AspectCache {
        &self.aspect_cache
    }

    pub fn lightbox(&self) -> &Lightbox {
        &self.lightbox
    }

    pub fn lightbox_mut(&mut self) -> &mut Lightbox {
        &mut self.lightbox
    }

    pub fn row_unit_px(&self) -> u32 {
        metrics::row_unit_px(self.viewport.grid_width)
    }

    // ========== Collection ==========

    /// Replace the portfolio (after a reload).
    ///
    /// Ratios for images that left the collection are evicted, the filter
    /// resets to all photos and the gallery re-renders.
    pub fn load_portfolio(&mut self, portfolio: PortfolioData) -> RenderPass {
        self.aspect_cache
            .retain_sources(portfolio.photos.iter().map(|p| p.src.as_str()));
        self.portfolio = portfolio;
        self.category = ALL_CATEGORY.to_string();
        self.lightbox.close();
        let photos = self.portfolio.photos.clone();
        self.render(photos)
    }

    /// Show one category (or [`ALL_CATEGORY`]).
    pub fn select_category(&mut self, category: &str) -> RenderPass {
        self.category = category.to_string();
        let photos = self.portfolio.filter(category);
        self.render(photos)
    }

    /// Lay out `photos` as the current gallery.
    ///
    /// Invalidates every earlier [`LayoutToken`].
    pub fn render(&mut self, photos: Vec<Photo>) -> RenderPass {
        let token = self.generations.issue();
        self.current = photos;
        self.last_grid_width = self.viewport.grid_width;

        let viewport = self.viewport.class();
        let ratios: Vec<f64> = self
            .current
            .iter()
            .map(|p| self.aspect_cache.ratio_or_default(&p.src))
            .collect();
        let spans = build_layout(&ratios, viewport);

        let mut missing: Vec<String> = Vec::new();
        for photo in &self.current {
            if !self.aspect_cache.contains(&photo.src) && !missing.contains(&photo.src) {
                missing.push(photo.src.clone());
            }
        }

        tracing::debug!(
            generation = token.generation(),
            photos = self.current.len(),
            missing = missing.len(),
            "gallery rendered"
        );

        let refinement = (!missing.is_empty()).then(|| LayoutRequest {
            token: token.clone(),
            viewport,
            sources: missing,
        });

        RenderPass {
            token,
            viewport,
            row_unit_px: self.row_unit_px(),
            spans,
            refinement,
        }
    }

    /// Fold measured ratios in and return refined spans for the current
    /// photos, or `None` if a newer render superseded the request.
    pub fn apply_refinement(&mut self, resolved: ResolvedLayout) -> Option<Vec<LayoutSpan>> {
        // Measurements stay valid even when the layout they were for is stale
        for (src, ratio) in resolved.ratios {
            self.aspect_cache.insert(src, ratio);
        }

        if !resolved.token.is_current() {
            tracing::debug!(
                generation = resolved.token.generation(),
                "discarding stale layout refinement"
            );
            return None;
        }

        let ratios: Vec<f64> = self
            .current
            .iter()
            .map(|p| self.aspect_cache.ratio_or_default(&p.src))
            .collect();
        Some(build_layout(&ratios, resolved.viewport))
    }

    // ========== Resize ==========

    /// Record a raw resize event; relayout waits for [`Self::poll_resize`].
    pub fn notify_resize(&mut self, at: Instant) {
        self.debouncer.notify(at);
    }

    /// Relayout once the resize burst has gone quiet.
    pub fn poll_resize(&mut self, now: Instant, viewport: Viewport) -> Option<RenderPass> {
        if !self.debouncer.poll(now) {
            return None;
        }
        self.handle_resize(viewport)
    }

    /// Apply a settled viewport size.
    ///
    /// Grid width changes under the noise threshold are ignored entirely.
    pub fn handle_resize(&mut self, viewport: Viewport) -> Option<RenderPass> {
        if !metrics::width_changed(self.last_grid_width, viewport.grid_width) {
            return None;
        }

        self.viewport = viewport;
        self.last_grid_width = viewport.grid_width;
        if self.current.is_empty() {
            return None;
        }
        let photos = self.current.clone();
        Some(self.render(photos))
    }

    // ========== Theme and tone ==========

    pub fn theme_vars(&self) -> ThemeState {
        apply_theme(
            self.prefs.theme,
            &self.portfolio.photographer.background_color,
        )
    }

    pub fn set_theme_mode(&mut self, mode: ThemeMode) -> ThemeState {
        self.prefs.theme = mode;
        self.theme_vars()
    }

    pub fn toggle_theme(&mut self) -> ThemeState {
        self.set_theme_mode(self.prefs.theme.toggled())
    }

    pub fn set_image_tone(&mut self, tone: ImageTone) {
        self.prefs.tone = tone;
    }

    pub fn toggle_bw(&mut self) -> ImageTone {
        self.prefs.tone = self.prefs.tone.toggle_bw();
        self.prefs.tone
    }

    pub fn toggle_iso400(&mut self) -> ImageTone {
        self.prefs.tone = self.prefs.tone.toggle_iso400();
        self.prefs.tone
    }

    // ========== Lightbox ==========

    /// Open the lightbox on a photo from the current gallery or portfolio.
    pub fn open_lightbox(&mut self, id: &PhotoId) -> Option<ViewEvent> {
        let photo = self
            .current
            .iter()
            .chain(&self.portfolio.photos)
            .find(|p| &p.id == id)
            .cloned()?;
        Some(
            self.lightbox
                .open(&photo, &self.current, &self.portfolio.photos),
        )
    }
}

impl std::fmt::Debug for GallerySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GallerySession")
            .field("photos", &self.current.len())
            .field("category", &self.category)
            .field("viewport", &self.viewport)
            .field("cached_ratios", &self.aspect_cache.len())
            .finish()
    }
}
