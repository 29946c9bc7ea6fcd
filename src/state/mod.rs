/// State management module
///
/// This module handles all application state, including:
/// - Photo records and settings parsing (data.rs)
/// - Viewer preferences: theme mode and image tone (prefs.rs)
/// - The local SQLite library: preferences, snapshot, likes and views (library.rs)
/// - The gallery session that ties layout, theme and lightbox together (session.rs)

pub mod data;
pub mod library;
pub mod prefs;
pub mod session;
