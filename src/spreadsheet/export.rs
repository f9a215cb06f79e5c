use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};

use super::{Result, SpreadsheetError};
use crate::db::Store;
use crate::models::Book;
use crate::settings::ExportLabels;

const EXPORT_COLUMNS: usize = 9;

/// Write the whole catalog, in title order, to an `.xlsx` file at `path`.
/// Returns the number of books written. An empty catalog is refused rather
/// than producing an empty sheet.
pub fn export_catalog(store: &Store, path: &Path, labels: &ExportLabels) -> Result<usize> {
    if labels.columns.len() != EXPORT_COLUMNS {
        return Err(SpreadsheetError::LabelCount {
            expected: EXPORT_COLUMNS,
            found: labels.columns.len(),
        });
    }

    let books = store.export_snapshot()?;
    if books.is_empty() {
        return Err(SpreadsheetError::EmptyCatalog);
    }

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let heading = Format::new().set_bold();

    for (col, label) in labels.columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, label, &heading)?;
    }

    for (idx, book) in books.iter().enumerate() {
        let row = idx as u32 + 1;
        let texts = text_columns(book);
        for (col, value) in texts.iter().enumerate() {
            if let Some(value) = value {
                sheet.write_string(row, col as u16, *value)?;
            }
        }
        if let Some(year) = book.year {
            sheet.write_number(row, 3, year as f64)?;
        }
        let loaned = if book.is_loaned { &labels.yes } else { &labels.no };
        sheet.write_string(row, 7, loaned)?;
        if let Some(borrower) = book.loaned_to.as_deref() {
            sheet.write_string(row, 8, borrower)?;
        }
    }

    workbook.save(path)?;
    tracing::info!(path = %path.display(), books = books.len(), "catalog exported");
    Ok(books.len())
}

/// Text cells in export column order. Column 3 (year) is numeric and
/// written separately.
fn text_columns(book: &Book) -> [Option<&str>; 7] {
    [
        book.title.as_deref(),
        book.author.as_deref(),
        book.genre.as_deref(),
        None,
        book.publisher.as_deref(),
        book.location.as_deref(),
        book.language.as_deref(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookRecord;
    use calamine::{open_workbook_auto, Data, Reader};
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> Store {
        let store = Store::new(dir.path().join("library.db"));
        store.initialize().unwrap();
        store
    }

    #[test]
    fn empty_catalog_is_not_exported() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let path = dir.path().join("out.xlsx");

        let err = export_catalog(&store, &path, &ExportLabels::default()).unwrap_err();
        assert!(matches!(err, SpreadsheetError::EmptyCatalog));
        assert!(!path.exists());
    }

    #[test]
    fn export_writes_labels_and_localised_loan_flag() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let emma = store
            .add(&BookRecord {
                title: Some("Emma".into()),
                year: Some(1815),
                ..BookRecord::default()
            })
            .unwrap();
        store
            .add(&BookRecord {
                title: Some("dune".into()),
                author: Some("Herbert".into()),
                ..BookRecord::default()
            })
            .unwrap();
        store.toggle_loan(emma, false, Some("Alice")).unwrap();

        let path = dir.path().join("out.xlsx");
        assert_eq!(
            export_catalog(&store, &path, &ExportLabels::default()).unwrap(),
            2
        );

        let mut workbook = open_workbook_auto(&path).unwrap();
        let range = workbook.worksheet_range_at(0).unwrap().unwrap();
        let rows: Vec<&[Data]> = range.rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], Data::String("Titolo".into()));
        assert_eq!(rows[0][8], Data::String("Prestato a".into()));

        assert_eq!(rows[1][0], Data::String("dune".into()));
        assert_eq!(rows[1][1], Data::String("Herbert".into()));
        assert_eq!(rows[1][7], Data::String("No".into()));

        assert_eq!(rows[2][0], Data::String("Emma".into()));
        assert_eq!(rows[2][3], Data::Float(1815.0));
        assert_eq!(rows[2][7], Data::String("Sì".into()));
        assert_eq!(rows[2][8], Data::String("Alice".into()));
    }

    #[test]
    fn wrong_label_count_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let labels = ExportLabels {
            columns: vec!["Title".into()],
            ..ExportLabels::default()
        };

        let err = export_catalog(&store, &dir.path().join("out.xlsx"), &labels).unwrap_err();
        assert!(matches!(
            err,
            SpreadsheetError::LabelCount {
                expected: 9,
                found: 1
            }
        ));
    }
}
