//! folio library
//!
//! Theme palettes and mosaic layout for a photo portfolio, plus the gallery
//! session, local library and deploy tooling the `folio` binary drives.

/// Command-line interface and command handlers.
pub mod cli;

/// Hex, RGB and HSL colour math and palette derivation.
pub mod color;

/// `.env` handling, placeholder build and preflight checks.
pub mod deploy;

/// Crate-wide error type.
pub mod error;

/// Mosaic packing, viewport metrics and resize debouncing.
pub mod layout;

/// Tracing subscriber setup.
pub mod logging;

/// Aspect-ratio measurement and CDN URL transforms.
pub mod media;

/// Portfolio data, preferences, the SQLite library and the gallery session.
pub mod state;

/// View models for the gallery, theme and lightbox.
pub mod ui;
