//! Page view models
//!
//! This module handles:
//! - Theme variable application and toggle labels
//! - The gallery view: filter bar, tiles and about section
//! - Lightbox navigation

pub mod gallery;
pub mod lightbox;
pub mod theme;
