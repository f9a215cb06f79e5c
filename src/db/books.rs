use anyhow::{Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::{params, Row};

use super::Store;
use crate::models::{Book, BookRecord};

/// Column list shared by every query that hydrates a `Book`.
const BOOK_COLUMNS: &str =
    "id, title, author, genre, year, publisher, location, language, is_loaned, loaned_to";

/// Case-insensitive title order used by listing, search and export. The id
/// tie-break keeps pagination stable when titles collide.
const BOOK_ORDER: &str = "ORDER BY title COLLATE NOCASE, id";

const INSERT_BOOK: &str = "INSERT INTO books
    (title, author, genre, year, publisher, location, language, is_loaned, loaned_to)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";

impl Store {
    /// Insert a new book and return the identifier SQLite assigned to it.
    pub fn add(&self, record: &BookRecord) -> Result<i64> {
        let conn = self.connect()?;
        conn.execute(
            INSERT_BOOK,
            params![
                record.title,
                record.author,
                record.genre,
                record.year,
                record.publisher,
                record.location,
                record.language,
                record.is_loaned,
                record.persisted_borrower(),
            ],
        )
        .context("failed to insert book")?;

        let id = conn.last_insert_rowid();
        tracing::info!(id, "book added");
        Ok(id)
    }

    /// Insert many books inside one transaction. Either every row lands or
    /// none does.
    pub fn add_many(&self, records: &[BookRecord]) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction().context("failed to start bulk insert")?;
        {
            let mut stmt = tx
                .prepare(INSERT_BOOK)
                .context("failed to prepare bulk insert")?;
            for record in records {
                stmt.execute(params![
                    record.title,
                    record.author,
                    record.genre,
                    record.year,
                    record.publisher,
                    record.location,
                    record.language,
                    record.is_loaned,
                    record.persisted_borrower(),
                ])
                .context("failed to insert imported book")?;
            }
        }
        tx.commit().context("failed to commit bulk insert")?;

        tracing::info!(count = records.len(), "bulk insert committed");
        Ok(records.len())
    }

    /// Fetch a single book by id.
    pub fn get(&self, id: i64) -> Result<Option<Book>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"))
            .context("failed to prepare book lookup")?;
        let mut books = stmt
            .query_map([id], map_book)
            .context("failed to look up book")?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to read book")?;
        Ok(books.pop())
    }

    /// One page of the catalog in title order. Callers detect further pages
    /// by comparing the returned length to `limit`.
    pub fn list(&self, limit: usize, offset: usize) -> Result<Vec<Book>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {BOOK_COLUMNS} FROM books {BOOK_ORDER} LIMIT ?1 OFFSET ?2"
            ))
            .context("failed to prepare book listing")?;

        let books = stmt
            .query_map(params![limit as i64, offset as i64], map_book)
            .context("failed to list books")?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to collect books")?;

        tracing::debug!(limit, offset, returned = books.len(), "listed books");
        Ok(books)
    }

    /// Books whose title, author, genre or publisher contains `query`,
    /// ignoring case. Same ordering and paging as `list`. An empty query
    /// matches everything; callers are expected to avoid sending one.
    pub fn search(&self, query: &str, limit: usize, offset: usize) -> Result<Vec<Book>> {
        let pattern = format!("%{}%", escape_like(query));
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {BOOK_COLUMNS} FROM books
                 WHERE title LIKE ?1 ESCAPE '\\'
                    OR author LIKE ?1 ESCAPE '\\'
                    OR genre LIKE ?1 ESCAPE '\\'
                    OR publisher LIKE ?1 ESCAPE '\\'
                 {BOOK_ORDER}
                 LIMIT ?2 OFFSET ?3"
            ))
            .context("failed to prepare book search")?;

        let books = stmt
            .query_map(params![pattern, limit as i64, offset as i64], map_book)
            .context("failed to search books")?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to collect search results")?;

        tracing::debug!(query, limit, offset, returned = books.len(), "searched books");
        Ok(books)
    }

    /// Replace every mutable column of a book. Last writer wins; an unknown id
    /// changes nothing and is not an error.
    pub fn update(&self, id: i64, record: &BookRecord) -> Result<()> {
        let conn = self.connect()?;
        let updated = conn
            .execute(
                "UPDATE books
                 SET title = ?1, author = ?2, genre = ?3, year = ?4, publisher = ?5,
                     location = ?6, language = ?7, is_loaned = ?8, loaned_to = ?9
                 WHERE id = ?10",
                params![
                    record.title,
                    record.author,
                    record.genre,
                    record.year,
                    record.publisher,
                    record.location,
                    record.language,
                    record.is_loaned,
                    record.persisted_borrower(),
                    id,
                ],
            )
            .context("failed to update book")?;

        tracing::info!(id, updated, "book updated");
        Ok(())
    }

    /// Permanently remove a book. Unknown ids are ignored.
    pub fn delete(&self, id: i64) -> Result<()> {
        let conn = self.connect()?;
        let deleted = conn
            .execute("DELETE FROM books WHERE id = ?1", params![id])
            .context("failed to delete book")?;

        tracing::info!(id, deleted, "book deleted");
        Ok(())
    }

    /// Flip the loan flag starting from the state the caller believes is
    /// stored, and return the new state. Returning a book always clears the
    /// borrower; lending records `borrower`. The stored state is not checked
    /// against `currently_loaned`.
    pub fn toggle_loan(
        &self,
        id: i64,
        currently_loaned: bool,
        borrower: Option<&str>,
    ) -> Result<bool> {
        let now_loaned = !currently_loaned;
        let borrower = if now_loaned { borrower } else { None };

        let conn = self.connect()?;
        conn.execute(
            "UPDATE books SET is_loaned = ?1, loaned_to = ?2 WHERE id = ?3",
            params![now_loaned, borrower, id],
        )
        .context("failed to update loan status")?;

        tracing::info!(id, now_loaned, "loan status toggled");
        Ok(now_loaned)
    }

    /// The whole catalog in title order, for spreadsheet export.
    pub fn export_snapshot(&self) -> Result<Vec<Book>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {BOOK_COLUMNS} FROM books {BOOK_ORDER}"))
            .context("failed to prepare export query")?;

        let books = stmt
            .query_map([], map_book)
            .context("failed to read catalog")?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to collect catalog")?;

        Ok(books)
    }
}

fn map_book(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        genre: row.get(3)?,
        year: read_year(row, 4)?,
        publisher: row.get(5)?,
        location: row.get(6)?,
        language: row.get(7)?,
        is_loaned: row.get::<_, Option<bool>>(8)?.unwrap_or(false),
        loaned_to: row.get(9)?,
    })
}

/// Catalogs written by the older desktop app keep the year as whatever text
/// was in the entry, so blank strings and numeric text both occur.
fn read_year(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<i64>> {
    let year = match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Integer(value) => Some(value),
        ValueRef::Real(value) if value.fract() == 0.0 => Some(value as i64),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            let text = text.trim();
            if text.is_empty() {
                None
            } else {
                let parsed = text.parse::<i64>().ok().or_else(|| {
                    text.parse::<f64>()
                        .ok()
                        .filter(|value| value.fract() == 0.0)
                        .map(|value| value as i64)
                });
                if parsed.is_none() {
                    tracing::warn!(year = %text, "ignoring non-numeric year");
                }
                parsed
            }
        }
        other => {
            tracing::warn!(kind = ?other.data_type(), "ignoring unreadable year");
            None
        }
    };
    Ok(year)
}

/// Escape LIKE wildcards so user input only ever matches literally.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("library.db"));
        store.initialize().unwrap();
        (dir, store)
    }

    fn titled(title: &str) -> BookRecord {
        BookRecord {
            title: Some(title.to_string()),
            ..BookRecord::default()
        }
    }

    fn dune() -> BookRecord {
        BookRecord {
            title: Some("Dune".into()),
            author: Some("Herbert".into()),
            year: Some(1965),
            ..BookRecord::default()
        }
    }

    #[test]
    fn added_book_is_listed_with_loan_defaults() {
        let (_dir, store) = store();
        let id = store.add(&dune()).unwrap();

        let books = store.list(50, 0).unwrap();
        assert_eq!(books.len(), 1);
        let book = &books[0];
        assert_eq!(book.id, id);
        assert_eq!(book.title.as_deref(), Some("Dune"));
        assert_eq!(book.author.as_deref(), Some("Herbert"));
        assert_eq!(book.year, Some(1965));
        assert!(!book.is_loaned);
        assert_eq!(book.loaned_to, None);
        assert_eq!(book.genre, None);
    }

    #[test]
    fn add_drops_borrower_when_not_on_loan() {
        let (_dir, store) = store();
        let id = store
            .add(&BookRecord {
                loaned_to: Some("Mallory".into()),
                ..dune()
            })
            .unwrap();
        assert_eq!(store.get(id).unwrap().unwrap().loaned_to, None);
    }

    #[test]
    fn search_matches_substrings_case_insensitively() {
        let (_dir, store) = store();
        let id = store.add(&dune()).unwrap();

        let hits = store.search("dune", 50, 0).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, id);

        assert_eq!(store.search("HERB", 50, 0).unwrap().len(), 1);
        assert!(store.search("frank", 50, 0).unwrap().is_empty());
    }

    #[test]
    fn search_covers_genre_and_publisher_but_not_location() {
        let (_dir, store) = store();
        store
            .add(&BookRecord {
                genre: Some("Science Fiction".into()),
                publisher: Some("Chilton".into()),
                location: Some("Shelf Z".into()),
                ..dune()
            })
            .unwrap();

        assert_eq!(store.search("fiction", 10, 0).unwrap().len(), 1);
        assert_eq!(store.search("chil", 10, 0).unwrap().len(), 1);
        assert!(store.search("shelf", 10, 0).unwrap().is_empty());
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let (_dir, store) = store();
        store.add(&titled("100% Cotton")).unwrap();
        store.add(&titled("1000 Cranes")).unwrap();

        let hits = store.search("0%", 10, 0).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title.as_deref(), Some("100% Cotton"));
    }

    #[test]
    fn listing_and_search_sort_titles_ignoring_case() {
        let (_dir, store) = store();
        for title in ["banana", "Cherry", "apple", "Apricot", "blueberry"] {
            store.add(&titled(title)).unwrap();
        }

        let listed: Vec<String> = store
            .list(50, 0)
            .unwrap()
            .into_iter()
            .filter_map(|book| book.title)
            .collect();
        assert_eq!(listed, ["apple", "Apricot", "banana", "blueberry", "Cherry"]);

        let searched: Vec<String> = store
            .search("a", 50, 0)
            .unwrap()
            .into_iter()
            .filter_map(|book| book.title)
            .collect();
        assert_eq!(searched, ["apple", "Apricot", "banana"]);
    }

    #[test]
    fn pagination_walks_through_the_catalog() {
        let (_dir, store) = store();
        for title in ["A", "B", "C", "D", "E"] {
            store.add(&titled(title)).unwrap();
        }

        let first = store.list(2, 0).unwrap();
        let second = store.list(2, 2).unwrap();
        let third = store.list(2, 4).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].title.as_deref(), Some("E"));
    }

    #[test]
    fn update_replaces_all_fields() {
        let (_dir, store) = store();
        let id = store.add(&dune()).unwrap();

        let replacement = BookRecord {
            title: Some("Dune Messiah".into()),
            author: Some("Frank Herbert".into()),
            genre: Some("Sci-Fi".into()),
            year: Some(1969),
            publisher: Some("Putnam".into()),
            location: Some("A3".into()),
            language: Some("English".into()),
            is_loaned: true,
            loaned_to: Some("Bob".into()),
        };
        store.update(id, &replacement).unwrap();

        let stored = store.get(id).unwrap().unwrap();
        assert_eq!(stored.record(), replacement);
    }

    #[test]
    fn missing_ids_are_silent_no_ops() {
        let (_dir, store) = store();
        let id = store.add(&dune()).unwrap();

        store.update(id + 100, &titled("Ghost")).unwrap();
        store.delete(id + 100).unwrap();

        let books = store.list(50, 0).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title.as_deref(), Some("Dune"));
    }

    #[test]
    fn delete_removes_the_row() {
        let (_dir, store) = store();
        let id = store.add(&dune()).unwrap();
        store.delete(id).unwrap();
        assert!(store.get(id).unwrap().is_none());
        assert!(store.list(50, 0).unwrap().is_empty());
    }

    #[test]
    fn toggle_loan_lends_and_returns() {
        let (_dir, store) = store();
        let id = store.add(&dune()).unwrap();

        assert!(store.toggle_loan(id, false, Some("Alice")).unwrap());
        let lent = store.get(id).unwrap().unwrap();
        assert!(lent.is_loaned);
        assert_eq!(lent.loaned_to.as_deref(), Some("Alice"));

        assert!(!store.toggle_loan(id, true, None).unwrap());
        let returned = store.get(id).unwrap().unwrap();
        assert!(!returned.is_loaned);
        assert_eq!(returned.loaned_to, None);
    }

    #[test]
    fn returning_a_book_ignores_any_borrower_passed_in() {
        let (_dir, store) = store();
        let id = store.add(&dune()).unwrap();
        store.toggle_loan(id, false, Some("Alice")).unwrap();

        store.toggle_loan(id, true, Some("Eve")).unwrap();

        let returned = store.get(id).unwrap().unwrap();
        assert!(!returned.is_loaned);
        assert_eq!(returned.loaned_to, None);
    }

    #[test]
    fn add_many_inserts_everything() {
        let (_dir, store) = store();
        let inserted = store
            .add_many(&[titled("One"), titled("Two"), titled("Three")])
            .unwrap();
        assert_eq!(inserted, 3);
        assert_eq!(store.export_snapshot().unwrap().len(), 3);
    }

    #[test]
    fn export_snapshot_is_unbounded_and_title_ordered() {
        let (_dir, store) = store();
        for idx in (0..120).rev() {
            store.add(&titled(&format!("Book {idx:03}"))).unwrap();
        }

        let snapshot = store.export_snapshot().unwrap();
        assert_eq!(snapshot.len(), 120);
        assert_eq!(snapshot[0].title.as_deref(), Some("Book 000"));
        assert_eq!(snapshot[119].title.as_deref(), Some("Book 119"));
    }

    #[test]
    fn legacy_text_years_do_not_break_reads() {
        let (_dir, store) = store();
        store.add(&dune()).unwrap();
        let conn = store.connect().unwrap();
        for (title, year) in [
            ("A blank", ""),
            ("B spaced", "  "),
            ("C vague", "circa 1900"),
            ("D numeric", "1980"),
        ] {
            conn.execute(
                "INSERT INTO books (title, year) VALUES (?1, ?2)",
                params![title, year],
            )
            .unwrap();
        }

        let years: Vec<Option<i64>> = store
            .list(50, 0)
            .unwrap()
            .iter()
            .map(|book| book.year)
            .collect();
        assert_eq!(years, vec![None, None, None, Some(1980), Some(1965)]);
        assert_eq!(store.export_snapshot().unwrap().len(), 5);

        let found = store.search("blank", 10, 0).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].year, None);
    }

    #[test]
    fn escape_like_prefixes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
