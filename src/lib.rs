//! Personal library catalog: a SQLite-backed book store, a spreadsheet
//! importer/exporter, and a terminal front-end for searching, editing and
//! lending books.
//!
//! The binary wires these together; the modules stay usable on their own so
//! the one-shot CLI jobs and the tests reuse the same pieces as the TUI.
pub mod catalog;
pub mod db;
pub mod detail;
pub mod models;
pub mod settings;
pub mod spreadsheet;
pub mod telemetry;
pub mod ui;

/// The store handle every layer talks to.
pub use db::Store;

/// Domain types that other layers manipulate.
pub use models::{Book, BookRecord, LookupField};

pub use settings::Settings;

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
