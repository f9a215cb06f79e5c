use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, Error as SqlError};

/// Handle to the on-disk catalog. The store only remembers where the SQLite
/// file lives: every operation opens its own connection and drops it when the
/// statement finishes, so no session state survives between calls.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Point a store at `path`. Nothing touches the disk until `initialize`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the SQLite file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the data directory and the `books` table if they are missing.
    /// Older catalogs predate the `loaned_to` column, so we also try to add it
    /// and swallow the "duplicate column" failure when it already exists.
    /// Safe to call any number of times.
    pub fn initialize(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("failed to create data directory")?;
            }
        }

        let conn = self.connect()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS books (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT,
                author TEXT,
                genre TEXT,
                year INTEGER,
                publisher TEXT,
                location TEXT,
                language TEXT,
                is_loaned INTEGER DEFAULT 0,
                loaned_to TEXT
            )",
            [],
        )
        .context("failed to create books table")?;

        match conn.execute("ALTER TABLE books ADD COLUMN loaned_to TEXT", []) {
            Ok(_) => tracing::info!("added loaned_to column to an older catalog"),
            Err(err) if is_duplicate_column(&err) => {}
            Err(err) => return Err(err).context("failed to add loaned_to column"),
        }

        tracing::debug!(path = %self.path.display(), "catalog schema ready");
        Ok(())
    }

    /// Open a fresh connection to the catalog file.
    pub(crate) fn connect(&self) -> Result<Connection> {
        Connection::open(&self.path).context("failed to open SQLite database")
    }
}

fn is_duplicate_column(err: &SqlError) -> bool {
    matches!(err, SqlError::SqliteFailure(_, Some(message)) if message.contains("duplicate column"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn initialize_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("nested").join("library.db"));

        store.initialize().unwrap();
        store.initialize().unwrap();

        let conn = store.connect().unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'books'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);

        let mut stmt = conn.prepare("PRAGMA table_info(books)").unwrap();
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get(1))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            columns,
            [
                "id",
                "title",
                "author",
                "genre",
                "year",
                "publisher",
                "location",
                "language",
                "is_loaned",
                "loaned_to"
            ]
        );
    }

    #[test]
    fn initialize_upgrades_catalog_without_borrower_column() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("library.db"));
        {
            let conn = store.connect().unwrap();
            conn.execute(
                "CREATE TABLE books (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT, author TEXT, genre TEXT, year INTEGER,
                    publisher TEXT, location TEXT, language TEXT,
                    is_loaned INTEGER DEFAULT 0
                )",
                [],
            )
            .unwrap();
        }

        store.initialize().unwrap();

        let conn = store.connect().unwrap();
        let has_column: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('books') WHERE name = 'loaned_to'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(has_column, 1);
    }
}
