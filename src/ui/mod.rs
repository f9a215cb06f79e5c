//! Ratatui front-end: a searchable catalog list and a per-book detail screen
//! layered over the catalog and detail controllers.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
