use chrono::Utc;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("library database error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("could not create library directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not determine user data directory")]
    NoDataDir,
}

/// The Library manages the reader's local SQLite database.
/// It remembers which titles this reader has liked; the like counters
/// themselves live in the content store.
pub struct Library {
    conn: Connection,
    db_path: PathBuf,
}

impl Library {
    /// Open the library in the user's data directory:
    /// - Linux: ~/.local/share/codetales-reader/library.db
    /// - macOS: ~/Library/Application Support/codetales-reader/library.db
    /// - Windows: %APPDATA%\codetales-reader\library.db
    pub fn open_default() -> Result<Self, LibraryError> {
        Self::open(&Self::default_path()?)
    }

    /// Open (or create) a library at an explicit path
    pub fn open(db_path: &Path) -> Result<Self, LibraryError> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;

        tracing::info!(path = %db_path.display(), "Library opened");

        let library = Library {
            conn,
            db_path: db_path.to_path_buf(),
        };
        library.init_schema()?;

        Ok(library)
    }

    /// Get the path where the library should be stored
    pub fn default_path() -> Result<PathBuf, LibraryError> {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or(LibraryError::NoDataDir)?;

        path.push("codetales-reader");
        path.push("library.db");
        Ok(path)
    }

    /// Create all necessary tables if they don't exist.
    fn init_schema(&self) -> Result<(), LibraryError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS liked (
                comic_id        TEXT PRIMARY KEY,
                liked_at        INTEGER NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_liked_liked_at
             ON liked(liked_at DESC)",
            [],
        )?;

        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Whether this reader has liked a title
    pub fn is_liked(&self, comic_id: &str) -> Result<bool, LibraryError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM liked WHERE comic_id = ?1",
            [comic_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Record or forget a like
    pub fn set_liked(&self, comic_id: &str, liked: bool) -> Result<(), LibraryError> {
        if liked {
            self.conn.execute(
                "INSERT OR REPLACE INTO liked (comic_id, liked_at) VALUES (?1, ?2)",
                rusqlite::params![comic_id, Utc::now().timestamp()],
            )?;
        } else {
            self.conn
                .execute("DELETE FROM liked WHERE comic_id = ?1", [comic_id])?;
        }
        Ok(())
    }

    /// Number of liked titles
    pub fn liked_count(&self) -> Result<i64, LibraryError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM liked", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Like counter after toggling: one more when liking, one fewer (never
/// below zero) when unliking.
pub fn toggled_like_count(likes: u32, currently_liked: bool) -> u32 {
    if currently_liked {
        likes.saturating_sub(1)
    } else {
        likes + 1
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let library = Library::open(&dir.path().join("nested").join("library.db")).unwrap();

        assert!(!library.is_liked("why-me").unwrap());

        library.set_liked("why-me", true).unwrap();
        library.set_liked("why-me", true).unwrap();
        assert!(library.is_liked("why-me").unwrap());
        assert_eq!(library.liked_count().unwrap(), 1);

        library.set_liked("why-me", false).unwrap();
        assert!(!library.is_liked("why-me").unwrap());
        assert_eq!(library.liked_count().unwrap(), 0);
    }

    #[test]
    fn test_likes_persist_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.db");

        Library::open(&path).unwrap().set_liked("ocean-door", true).unwrap();

        let reopened = Library::open(&path).unwrap();
        assert!(reopened.is_liked("ocean-door").unwrap());
        assert_eq!(reopened.path(), path.as_path());
    }

    #[test]
    fn test_toggled_like_count() {
        assert_eq!(toggled_like_count(10, false), 11);
        assert_eq!(toggled_like_count(10, true), 9);
        assert_eq!(toggled_like_count(0, true), 0);
    }
}
