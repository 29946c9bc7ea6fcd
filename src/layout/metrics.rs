//! Viewport classification, row-height units and resize debouncing

use serde::Serialize;
use std::time::{Duration, Instant};

/// Window widths below this are laid out as mobile
pub const MOBILE_BREAKPOINT_PX: u32 = 700;

/// Quiet period after the last resize event before relayout
pub const RESIZE_QUIET_PERIOD: Duration = Duration::from_millis(120);

/// Grid width changes smaller than this are resize noise (browser chrome
/// showing and hiding) and never trigger relayout
pub const RESIZE_MIN_DELTA_PX: u32 = 8;

/// Mobile or desktop packing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewportClass {
    Mobile,
    Desktop,
}

impl ViewportClass {
    pub fn from_window_width(width: u32) -> Self {
        if width < MOBILE_BREAKPOINT_PX {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }

    pub fn is_mobile(self) -> bool {
        self == Self::Mobile
    }
}

/// Pixel height of one row unit for a grid of the given width.
///
/// Narrow grids (560px and below) use 38px, slightly taller than the
/// 561-760px band.
pub fn row_unit_px(grid_width: u32) -> u32 {
    if grid_width > 1200 {
        56
    } else if grid_width > 980 {
        48
    } else if grid_width > 760 {
        42
    } else if grid_width > 560 {
        34
    } else {
        38
    }
}

/// Whether a new grid width differs enough from the last laid-out one.
pub fn width_changed(last: u32, current: u32) -> bool {
    last.abs_diff(current) >= RESIZE_MIN_DELTA_PX
}

/// Coalesces bursts of resize events into a single relayout.
///
/// Every [`notify`](Self::notify) restarts the quiet period;
/// [`poll`](Self::poll) returns `true` once when it has elapsed.
#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    quiet: Duration,
    last_event: Option<Instant>,
}

impl Default for ResizeDebouncer {
    fn default() -> Self {
        Self::new(RESIZE_QUIET_PERIOD)
    }
}

impl ResizeDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            last_event: None,
        }
    }

    /// Record a resize event.
    pub fn notify(&mut self, at: Instant) {
        self.last_event = Some(at);
    }

    /// Fire if the quiet period has passed since the last event.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.last_event {
            Some(at) if now.saturating_duration_since(at) >= self.quiet => {
                self.last_event = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.last_event.is_some()
    }

    /// When the pending relayout is due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.last_event.map(|at| at + self.quiet)
    }
}
