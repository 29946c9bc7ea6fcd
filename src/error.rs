//! Error types shared across the crate.
//!
//! The palette and layout functions are total and never return these; they
//! cover the I/O, storage and decoding edges around them.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the library, the deploy tooling and the CLI.
#[derive(Error, Debug)]
pub enum FolioError {
    /// A file could not be read or written.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path of the file involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// JSON could not be parsed or produced.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The local SQLite library failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// An image header could not be decoded.
    #[error("failed to decode image {path}: {source}")]
    Image {
        /// Path to the image file.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: image::ImageError,
    },

    /// A background measurement task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// No photo with this id exists in the portfolio.
    #[error("unknown photo id: {0}")]
    UnknownPhoto(String),

    /// Neither a rows export nor a cached snapshot is available.
    #[error("no portfolio data available (rows could not be loaded and no snapshot is cached)")]
    NoSnapshot,

    /// The local data directory could not be determined.
    #[error("could not determine a data directory; pass --db explicitly")]
    NoDataDir,

    /// Preflight found problems.
    #[error("preflight failed with {0} problem(s)")]
    PreflightFailed(usize),
}

impl FolioError {
    /// Wrap an I/O error with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mentions_path() {
        let err = FolioError::io(
            "/tmp/missing.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let message = err.to_string();
        assert!(message.contains("/tmp/missing.json"));
        assert!(message.contains("gone"));
    }

    #[test]
    fn test_preflight_failed_message() {
        assert_eq!(
            FolioError::PreflightFailed(3).to_string(),
            "preflight failed with 3 problem(s)"
        );
    }
}
