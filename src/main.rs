//! Binary entry point. Without a subcommand it opens the catalog in the
//! terminal UI; `import` and `export` run the spreadsheet jobs and exit.
use std::path::{Path, PathBuf};

use anyhow::Result;
use biblioteca::spreadsheet::{export_catalog, import_spreadsheet, SpreadsheetError};
use biblioteca::{run_app, telemetry, App, Settings, Store};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "biblioteca")]
#[command(about = "Catalog, search and lend the books on your shelves", long_about = None)]
#[command(version)]
struct Cli {
    /// Database file to use instead of the configured one
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Bulk-load books from the first sheet of a spreadsheet
    Import {
        /// Spreadsheet to read (defaults to `import.path` from the settings)
        path: Option<PathBuf>,
    },

    /// Write the whole catalog to an .xlsx file
    Export {
        /// Destination file
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load()?;
    if let Err(err) = telemetry::init(&settings) {
        eprintln!("warning: logging disabled: {err:#}");
    }

    let store = match cli.db {
        Some(path) => Store::new(path),
        None => settings.store(),
    };
    store.initialize()?;

    match cli.command {
        None => cmd_tui(store, settings),
        Some(Commands::Import { path }) => cmd_import(&store, &settings, path),
        Some(Commands::Export { path }) => cmd_export(&store, &settings, &path),
    }
}

fn cmd_tui(store: Store, settings: Settings) -> Result<()> {
    let mut app = App::new(store, settings);
    run_app(&mut app)
}

fn cmd_import(store: &Store, settings: &Settings, path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(|| settings.import.path.clone());
    let report = import_spreadsheet(store, &path, &settings.import)?;

    for (field, header) in &report.mapped {
        println!("  {field:<10} <- '{header}'");
    }
    for field in &report.unmatched {
        println!("  warning: no column found for '{field}'");
    }
    println!("Imported {} books from {}", report.inserted, path.display());
    Ok(())
}

fn cmd_export(store: &Store, settings: &Settings, path: &Path) -> Result<()> {
    match export_catalog(store, path, &settings.export) {
        Ok(count) => {
            println!("Exported {count} books to {}", path.display());
            Ok(())
        }
        Err(SpreadsheetError::EmptyCatalog) => {
            println!("warning: the catalog is empty; nothing exported");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
