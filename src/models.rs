//! Domain models that mirror the SQLite `books` table and get passed
//! throughout the catalog, the detail editor and the TUI. These types stay
//! light-weight data holders so other layers can focus on presentation and
//! persistence logic.

use std::fmt;

/// Every mutable column of a book row. Used as the input for inserts and
/// full-record updates, and as the unit the spreadsheet importer produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookRecord {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i64>,
    pub publisher: Option<String>,
    pub location: Option<String>,
    pub language: Option<String>,
    /// Whether the book is currently lent out.
    pub is_loaned: bool,
    /// Borrower name. Only meaningful while `is_loaned` is set; the store
    /// writes NULL whenever the flag is clear.
    pub loaned_to: Option<String>,
}

impl BookRecord {
    /// Attach a store-assigned identifier, producing a full `Book`.
    pub fn with_id(self, id: i64) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            genre: self.genre,
            year: self.year,
            publisher: self.publisher,
            location: self.location,
            language: self.language,
            is_loaned: self.is_loaned,
            loaned_to: self.loaned_to,
        }
    }

    /// Borrower value as it must be persisted: cleared unless the book is on
    /// loan.
    pub fn persisted_borrower(&self) -> Option<&str> {
        if self.is_loaned {
            self.loaned_to.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// In-memory snapshot of a stored book. Snapshots go stale as soon as the
/// store is written again; re-fetching is the only way to refresh them.
pub struct Book {
    /// Primary key assigned by SQLite on insert. Never changes afterwards.
    pub id: i64,
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i64>,
    pub publisher: Option<String>,
    pub location: Option<String>,
    pub language: Option<String>,
    pub is_loaned: bool,
    pub loaned_to: Option<String>,
}

impl Book {
    /// Copy the mutable columns out of the snapshot.
    pub fn record(&self) -> BookRecord {
        BookRecord {
            title: self.title.clone(),
            author: self.author.clone(),
            genre: self.genre.clone(),
            year: self.year,
            publisher: self.publisher.clone(),
            location: self.location.clone(),
            language: self.language.clone(),
            is_loaned: self.is_loaned,
            loaned_to: self.loaned_to.clone(),
        }
    }

    /// `Title (Year)` with an "Untitled" fallback. Lists and dialogs rely on
    /// this ready-to-use formatting.
    pub fn display_title(&self) -> String {
        let title = non_blank(self.title.as_deref()).unwrap_or("Untitled");
        match self.year {
            Some(year) => format!("{title} ({year})"),
            None => title.to_string(),
        }
    }

    /// Author name or an "Unknown author" placeholder.
    pub fn display_author(&self) -> &str {
        non_blank(self.author.as_deref()).unwrap_or("Unknown author")
    }

    /// Human-readable loan status shown on the detail screen.
    pub fn loan_status(&self) -> String {
        if self.is_loaned {
            format!("On loan ({})", self.loaned_to.as_deref().unwrap_or(""))
        } else {
            "Available".to_string()
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_title())
    }
}

/// Columns that may drive autocomplete suggestions. Only these identifiers
/// ever reach the distinct-value query, so the SQL column name always comes
/// from this fixed list rather than from caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupField {
    Author,
    Genre,
    Publisher,
    Location,
    Language,
}

impl LookupField {
    pub const ALL: [LookupField; 5] = [
        LookupField::Author,
        LookupField::Genre,
        LookupField::Publisher,
        LookupField::Location,
        LookupField::Language,
    ];

    /// SQL column backing the field.
    pub fn column(self) -> &'static str {
        match self {
            LookupField::Author => "author",
            LookupField::Genre => "genre",
            LookupField::Publisher => "publisher",
            LookupField::Location => "location",
            LookupField::Language => "language",
        }
    }

    /// Resolve a column name against the allow-list. Anything else yields
    /// `None`.
    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.column() == name)
    }
}

/// Treat `None`, empty and whitespace-only strings alike.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_title_falls_back_and_appends_year() {
        let book = BookRecord {
            title: Some("Dune".into()),
            year: Some(1965),
            ..BookRecord::default()
        }
        .with_id(1);
        assert_eq!(book.display_title(), "Dune (1965)");

        let untitled = BookRecord {
            title: Some("   ".into()),
            ..BookRecord::default()
        }
        .with_id(2);
        assert_eq!(untitled.display_title(), "Untitled");
        assert_eq!(untitled.display_author(), "Unknown author");
    }

    #[test]
    fn borrower_is_only_persisted_while_on_loan() {
        let mut record = BookRecord {
            loaned_to: Some("Alice".into()),
            ..BookRecord::default()
        };
        assert_eq!(record.persisted_borrower(), None);
        record.is_loaned = true;
        assert_eq!(record.persisted_borrower(), Some("Alice"));
    }

    #[test]
    fn lookup_fields_reject_unknown_columns() {
        assert_eq!(LookupField::from_column("genre"), Some(LookupField::Genre));
        assert_eq!(LookupField::from_column("title"), None);
        assert_eq!(LookupField::from_column("genre; DROP TABLE books"), None);
    }
}
