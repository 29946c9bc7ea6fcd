use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use super::data::{Photo, PhotoId, PortfolioData};
use super::prefs::{Preferences, IMAGE_TONE_KEY, THEME_KEY};
use crate::error::{FolioError, Result};

/// The Library manages the local SQLite database.
/// It stores viewer preferences, the last loaded portfolio snapshot,
/// per-device like markers and the like/view counters.
pub struct Library {
    conn: Connection,
    db_path: Option<PathBuf>,
}

/// What happened when a photo was liked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    /// This device already liked the photo; nothing changed
    AlreadyLiked,
    /// Like recorded; carries the new total
    Liked(i64),
}

impl Library {
    /// Open (or create) the library at `path` and initialize the schema.
    ///
    /// The parent directory is created if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| FolioError::io(parent, e))?;
            }
        }

        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "library opened");

        let library = Library {
            conn,
            db_path: Some(path.to_path_buf()),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// A throwaway library that lives only in memory
    pub fn open_in_memory() -> Result<Self> {
        let library = Library {
            conn: Connection::open_in_memory()?,
            db_path: None,
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Get the path where the database should be stored by default:
    /// - Linux: ~/.local/share/folio/folio.db
    /// - macOS: ~/Library/Application Support/folio/folio.db
    /// - Windows: %APPDATA%\folio\folio.db
    pub fn default_path() -> Result<PathBuf> {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or(FolioError::NoDataDir)?;
        path.push("folio");
        path.push("folio.db");
        Ok(path)
    }

    /// Create all tables if they don't exist.
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS preferences (
                key             TEXT PRIMARY KEY,
                value           TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS snapshots (
                id              INTEGER PRIMARY KEY CHECK (id = 1),
                portfolio_json  TEXT NOT NULL,
                saved_at        INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS liked_photos (
                photo_id        TEXT PRIMARY KEY,
                liked_at        INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS photo_counters (
                photo_id        TEXT PRIMARY KEY,
                likes           INTEGER NOT NULL DEFAULT 0,
                views           INTEGER NOT NULL DEFAULT 0
            );",
        )?;
        Ok(())
    }

    /// Path to the database file (`None` for in-memory libraries)
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    // ========== Preferences ==========

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    pub fn load_preferences(&self) -> Result<Preferences> {
        let theme = self.get_setting(THEME_KEY)?;
        let tone = self.get_setting(IMAGE_TONE_KEY)?;
        Ok(Preferences::from_stored(theme.as_deref(), tone.as_deref()))
    }

    pub fn save_preferences(&self, prefs: &Preferences) -> Result<()> {
        self.set_setting(THEME_KEY, prefs.theme.as_str())?;
        self.set_setting(IMAGE_TONE_KEY, prefs.tone.as_str())?;
        Ok(())
    }

    // ========== Snapshot ==========

    /// Cache the portfolio so the gallery can render when the store is down.
    pub fn save_snapshot(&self, data: &PortfolioData) -> Result<()> {
        let json = serde_json::to_string(data)?;
        self.conn.execute(
            "INSERT INTO snapshots (id, portfolio_json, saved_at) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET
                portfolio_json = excluded.portfolio_json,
                saved_at = excluded.saved_at",
            params![json, Utc::now().timestamp()],
        )?;
        Ok(())
    }

    pub fn load_snapshot(&self) -> Result<Option<PortfolioData>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT portfolio_json FROM snapshots WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    // ========== Engagement ==========

    pub fn has_liked(&self, id: &PhotoId) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM liked_photos WHERE photo_id = ?1",
                [id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Current (likes, views) for a photo, if this library has counted any.
    pub fn counters(&self, id: &PhotoId) -> Result<Option<(i64, i64)>> {
        let counts = self
            .conn
            .query_row(
                "SELECT likes, views FROM photo_counters WHERE photo_id = ?1",
                [id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(counts)
    }

    /// Likes for a photo: the local counter when present, else the record's.
    pub fn current_likes(&self, photo: &Photo) -> Result<i64> {
        Ok(self
            .counters(&photo.id)?
            .map_or(photo.likes, |(likes, _)| likes))
    }

    /// Views for a photo: the local counter when present, else the record's.
    pub fn current_views(&self, photo: &Photo) -> Result<i64> {
        Ok(self
            .counters(&photo.id)?
            .map_or(photo.views, |(_, views)| views))
    }

    /// Like a photo once per device.
    ///
    /// The marker is written before the counter, so a failed counter write
    /// still blocks a second like.
    pub fn like_photo(&self, photo: &Photo) -> Result<LikeOutcome> {
        if self.has_liked(&photo.id)? {
            return Ok(LikeOutcome::AlreadyLiked);
        }

        self.conn.execute(
            "INSERT INTO liked_photos (photo_id, liked_at) VALUES (?1, ?2)",
            params![photo.id.as_str(), Utc::now().timestamp()],
        )?;

        let likes = self.current_likes(photo)? + 1;
        let views = self.current_views(photo)?;
        self.write_counters(&photo.id, likes, views)?;
        Ok(LikeOutcome::Liked(likes))
    }

    /// Count one lightbox view; returns the new total.
    pub fn record_view(&self, photo: &Photo) -> Result<i64> {
        let likes = self.current_likes(photo)?;
        let views = self.current_views(photo)? + 1;
        self.write_counters(&photo.id, likes, views)?;
        Ok(views)
    }

    fn write_counters(&self, id: &PhotoId, likes: i64, views: i64) -> Result<()> {
        self.conn.execute(
            "INSERT INTO photo_counters (photo_id, likes, views) VALUES (?1, ?2, ?3)
             ON CONFLICT(photo_id) DO UPDATE SET
                likes = excluded.likes,
                views = excluded.views",
            params![id.as_str(), likes, views],
        )?;
        Ok(())
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}
