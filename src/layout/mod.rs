//! Gallery layout module
//!
//! This module handles:
//! - Mosaic packing of images into 12-column rows (mosaic.rs)
//! - Viewport classes, row units and resize debouncing (metrics.rs)

pub mod metrics;
pub mod mosaic;
