//! Lightbox viewer state
//!
//! Tracks which photo list the lightbox walks through and where it is.
//! Showing a photo produces a [`ViewEvent`] the caller turns into a view
//! count.

use serde::Serialize;

use crate::media::transform::ImageUrls;
use crate::state::data::{Photo, PhotoId};

/// Minimum horizontal travel for a swipe, in pixels
pub const SWIPE_MIN_DISTANCE_PX: f64 = 45.0;
/// Horizontal travel must beat vertical travel by this factor
pub const SWIPE_DOMINANCE: f64 = 1.3;
/// Swipes slower than this are drags, not navigation
pub const SWIPE_MAX_DURATION_MS: u64 = 700;

/// Navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

impl Direction {
    fn step(self) -> isize {
        match self {
            Self::Previous => -1,
            Self::Next => 1,
        }
    }
}

/// Keys the lightbox reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightboxKey {
    Escape,
    ArrowLeft,
    ArrowRight,
}

/// A photo was put on screen and should be counted as viewed
#[derive(Debug, Clone, PartialEq)]
pub struct ViewEvent {
    pub photo: Photo,
}

/// Classify a touch gesture as a horizontal swipe.
///
/// Swiping left (`dx < 0`) moves to the next photo.
pub fn classify_swipe(dx: f64, dy: f64, duration_ms: u64) -> Option<Direction> {
    let abs_x = dx.abs();
    let abs_y = dy.abs();
    let horizontal = abs_x > SWIPE_MIN_DISTANCE_PX
        && abs_x > abs_y * SWIPE_DOMINANCE
        && duration_ms < SWIPE_MAX_DURATION_MS;

    if !horizontal {
        return None;
    }
    if dx < 0.0 {
        Some(Direction::Next)
    } else if dx > 0.0 {
        Some(Direction::Previous)
    } else {
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct Lightbox {
    photos: Vec<Photo>,
    index: Option<usize>,
}

impl Lightbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.index.is_some()
    }

    pub fn current(&self) -> Option<&Photo> {
        self.index.and_then(|i| self.photos.get(i))
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Previous/next buttons are usable
    pub fn nav_enabled(&self) -> bool {
        self.is_active() && self.photos.len() > 1
    }

    /// Open on `photo`, walking the current gallery (or every photo when the
    /// gallery is empty). A photo missing from that list is shown alone.
    pub fn open(&mut self, photo: &Photo, gallery: &[Photo], all: &[Photo]) -> ViewEvent {
        let list = if gallery.is_empty() { all } else { gallery };

        match list.iter().position(|p| p.id == photo.id) {
            Some(index) => {
                self.photos = list.to_vec();
                self.index = Some(index);
            }
            None => {
                self.photos = vec![photo.clone()];
                self.index = Some(0);
            }
        }

        ViewEvent {
            photo: photo.clone(),
        }
    }

    /// Step through the list, wrapping at both ends.
    ///
    /// Does nothing unless the lightbox is open on at least two photos.
    pub fn navigate(&mut self, direction: Direction) -> Option<ViewEvent> {
        let index = self.index?;
        let len = self.photos.len();
        if len < 2 {
            return None;
        }

        let next = (index as isize + direction.step()).rem_euclid(len as isize) as usize;
        self.index = Some(next);
        self.current().map(|photo| ViewEvent {
            photo: photo.clone(),
        })
    }

    pub fn close(&mut self) {
        self.photos.clear();
        self.index = None;
    }

    /// Keyboard handling; ignored while closed.
    pub fn handle_key(&mut self, key: LightboxKey) -> Option<ViewEvent> {
        if !self.is_active() {
            return None;
        }
        match key {
            LightboxKey::Escape => {
                self.close();
                None
            }
            LightboxKey::ArrowRight => self.navigate(Direction::Next),
            LightboxKey::ArrowLeft => self.navigate(Direction::Previous),
        }
    }

    /// Touch handling; ignored while closed.
    pub fn handle_swipe(&mut self, dx: f64, dy: f64, duration_ms: u64) -> Option<ViewEvent> {
        if !self.is_active() {
            return None;
        }
        classify_swipe(dx, dy, duration_ms).and_then(|direction| self.navigate(direction))
    }

    pub fn current_id(&self) -> Option<&PhotoId> {
        self.current().map(|p| &p.id)
    }
}

/// What the open lightbox shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LightboxView {
    pub id: PhotoId,
    pub title: String,
    /// Lightbox-sized image URL
    pub src: String,
    pub views: i64,
    pub nav_enabled: bool,
    pub previous: Option<PhotoId>,
    pub next: Option<PhotoId>,
}

impl LightboxView {
    /// View of the current photo, or `None` while closed.
    pub fn new(lightbox: &Lightbox, urls: &ImageUrls, views: i64) -> Option<Self> {
        let photo = lightbox.current()?;
        let neighbor = |direction| {
            let mut peek = lightbox.clone();
            peek.navigate(direction).map(|event| event.photo.id)
        };

        Some(Self {
            id: photo.id.clone(),
            title: photo.title.clone(),
            src: urls.lightbox(&photo.src),
            views,
            nav_enabled: lightbox.nav_enabled(),
            previous: neighbor(Direction::Previous),
            next: neighbor(Direction::Next),
        })
    }
}
