//! Image media module
//!
//! This module handles:
//! - Measuring image aspect ratios and caching them per source
//! - Scanning folders for image files
//! - Building CDN URLs with size transforms and watermarks

pub mod aspect;
pub mod transform;
