use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use super::{Result, SpreadsheetError};
use crate::db::Store;
use crate::models::BookRecord;
use crate::settings::{HeaderAliases, ImportSettings};

/// Column index chosen for every catalog field, or `None` when no header
/// matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub title: Option<usize>,
    pub author: Option<usize>,
    pub genre: Option<usize>,
    pub year: Option<usize>,
    pub publisher: Option<usize>,
    pub location: Option<usize>,
    pub language: Option<usize>,
}

impl ColumnMap {
    /// Match each field's accepted spellings against the header row. Headers
    /// compare case-insensitively and the first matching spelling wins.
    pub fn from_headers(headers: &[String], aliases: &HeaderAliases) -> Self {
        Self {
            title: find_column(headers, &aliases.title),
            author: find_column(headers, &aliases.author),
            genre: find_column(headers, &aliases.genre),
            year: find_column(headers, &aliases.year),
            publisher: find_column(headers, &aliases.publisher),
            location: find_column(headers, &aliases.location),
            language: find_column(headers, &aliases.language),
        }
    }

    fn entries(&self) -> [(&'static str, Option<usize>); 7] {
        [
            ("title", self.title),
            ("author", self.author),
            ("genre", self.genre),
            ("year", self.year),
            ("publisher", self.publisher),
            ("location", self.location),
            ("language", self.language),
        ]
    }

    /// Fields that no header matched.
    pub fn unmatched(&self) -> Vec<&'static str> {
        self.entries()
            .into_iter()
            .filter(|(_, column)| column.is_none())
            .map(|(field, _)| field)
            .collect()
    }
}

fn find_column(headers: &[String], spellings: &[String]) -> Option<usize> {
    spellings.iter().find_map(|spelling| {
        let wanted = spelling.trim().to_lowercase();
        headers
            .iter()
            .position(|header| header.trim().to_lowercase() == wanted)
    })
}

/// Outcome of a completed import, for the operator.
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub inserted: usize,
    /// `(field, header)` pairs that were mapped.
    pub mapped: Vec<(&'static str, String)>,
    /// Fields left empty because no header matched.
    pub unmatched: Vec<&'static str>,
}

/// Read the first worksheet of `path` and turn its rows into records.
pub fn read_records(
    path: &Path,
    settings: &ImportSettings,
) -> Result<(ColumnMap, Vec<String>, Vec<BookRecord>)> {
    if !path.exists() {
        return Err(SpreadsheetError::MissingFile(path.to_path_buf()));
    }

    let unreadable = |source: calamine::Error| SpreadsheetError::Unreadable {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook = open_workbook_auto(path).map_err(unreadable)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SpreadsheetError::NoWorksheet(path.to_path_buf()))?
        .map_err(unreadable)?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(|cell| text(cell).unwrap_or_default()).collect())
        .unwrap_or_default();
    tracing::debug!(?headers, "spreadsheet headers");

    let columns = ColumnMap::from_headers(&headers, &settings.headers);

    // The range begins at the first non-empty row, so sheet row numbers
    // (1-based, as a spreadsheet application shows them) are offset by it.
    let header_row = range.start().map_or(0, |(row, _)| row as usize);
    let mut records = Vec::new();
    for (idx, row) in rows.enumerate() {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        let cell = |column: Option<usize>| column.and_then(|c| row.get(c));
        let language = match columns.language {
            Some(column) => row.get(column).and_then(text),
            None => Some(settings.default_language.clone()),
        };

        records.push(BookRecord {
            title: cell(columns.title).and_then(text),
            author: cell(columns.author).and_then(text),
            genre: cell(columns.genre).and_then(text),
            year: match cell(columns.year) {
                Some(value) => year(value, header_row + idx + 2)?,
                None => None,
            },
            publisher: cell(columns.publisher).and_then(text),
            location: cell(columns.location).and_then(text),
            language,
            is_loaned: false,
            loaned_to: None,
        });
    }

    Ok((columns, headers, records))
}

/// Import a spreadsheet into the store in one bulk insert. Any failure
/// leaves the catalog untouched.
pub fn import_spreadsheet(
    store: &Store,
    path: &Path,
    settings: &ImportSettings,
) -> Result<ImportReport> {
    tracing::info!(path = %path.display(), "importing spreadsheet");
    let (columns, headers, records) = read_records(path, settings)?;

    let mut mapped = Vec::new();
    for (field, column) in columns.entries() {
        match column {
            Some(index) => {
                tracing::info!(field, header = %headers[index], "mapped column");
                mapped.push((field, headers[index].clone()));
            }
            None => tracing::warn!(field, "no matching column; field left empty"),
        }
    }

    store.initialize()?;
    let inserted = store.add_many(&records)?;
    tracing::info!(inserted, "spreadsheet import complete");

    Ok(ImportReport {
        inserted,
        mapped,
        unmatched: columns.unmatched(),
    })
}

/// Text content of a cell, trimmed; empty cells become `None`. Whole
/// floats render without a fractional part so numeric shelf codes read
/// back as typed.
fn text(cell: &Data) -> Option<String> {
    let rendered = match cell {
        Data::Empty => return None,
        Data::String(value) => value.trim().to_string(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        Data::Float(value) => value.to_string(),
        Data::Int(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        other => other.to_string(),
    };
    if rendered.is_empty() {
        None
    } else {
        Some(rendered)
    }
}

fn year(cell: &Data, row: usize) -> Result<Option<i64>> {
    let invalid = |value: String| SpreadsheetError::InvalidYear { row, value };
    match cell {
        Data::Empty => Ok(None),
        Data::Int(value) => Ok(Some(*value)),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            Ok(Some(*value as i64))
        }
        Data::String(value) if value.trim().is_empty() => Ok(None),
        Data::String(value) => value
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| invalid(value.clone())),
        other => Err(invalid(other.to_string())),
    }
}
