//! Spreadsheet interchange: the one-shot bulk importer and the catalog
//! exporter.

mod export;
mod import;

use std::path::PathBuf;

use thiserror::Error;

pub use export::export_catalog;
pub use import::{import_spreadsheet, read_records, ColumnMap, ImportReport};

/// Failures that abort a whole import or export. Nothing is written to the
/// store when an import fails.
#[derive(Debug, Error)]
pub enum SpreadsheetError {
    #[error("spreadsheet not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("could not read spreadsheet {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("spreadsheet {} has no worksheets", .0.display())]
    NoWorksheet(PathBuf),

    #[error("row {row}: year '{value}' is not a whole number")]
    InvalidYear { row: usize, value: String },

    #[error("the catalog is empty; nothing to export")]
    EmptyCatalog,

    #[error("export needs {expected} column labels, found {found}")]
    LabelCount { expected: usize, found: usize },

    #[error("could not write spreadsheet: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SpreadsheetError>;
