//! Layered configuration: built-in defaults, then an optional `config.toml`
//! inside the data directory, then `BIBLIOTECA__*` environment variables
//! (a `.env` file is honoured when present).

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use serde::Deserialize;

use crate::db::Store;

const ENV_PREFIX: &str = "BIBLIOTECA";
const DATA_DIR_ENV: &str = "BIBLIOTECA_DATA_DIR";
const CONFIG_FILE_NAME: &str = "config.toml";
/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".biblioteca";

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub paging: PagingSettings,
    #[serde(default)]
    pub import: ImportSettings,
    #[serde(default)]
    pub export: ExportLabels,
    #[serde(default)]
    pub log: LogSettings,
}

impl Settings {
    /// Load configuration. The data directory comes from
    /// `BIBLIOTECA_DATA_DIR` or defaults to `~/.biblioteca`; its
    /// `config.toml` is optional.
    pub fn load() -> Result<Self> {
        // Missing `.env` files are fine.
        let _ = dotenvy::dotenv();

        let data_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => default_data_dir()?,
        };
        Self::load_from(&data_dir)
    }

    /// Load configuration rooted at an explicit data directory.
    pub fn load_from(data_dir: &Path) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::from(data_dir.join(CONFIG_FILE_NAME)).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .context("failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        if settings.storage.data_dir.is_none() {
            settings.storage.data_dir = Some(data_dir.to_path_buf());
        }
        settings.paging.validate()?;
        Ok(settings)
    }

    /// Directory holding the database, the log file and `config.toml`.
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DATA_DIR_NAME))
    }

    /// Absolute path to the SQLite catalog.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.db_file)
    }

    /// Build the store described by these settings.
    pub fn store(&self) -> Store {
        Store::new(self.db_path())
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir().join(&self.log.file)
    }
}

/// Resolve `~/.biblioteca`.
fn default_data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "StorageSettings::default_db_file")]
    pub db_file: String,
}

impl StorageSettings {
    fn default_db_file() -> String {
        "library.db".to_string()
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: None,
            db_file: Self::default_db_file(),
        }
    }
}

/// Page sizes for the catalog list: a large first page, then smaller
/// "load more" increments.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct PagingSettings {
    #[serde(default = "PagingSettings::default_initial_size")]
    pub initial_size: usize,
    #[serde(default = "PagingSettings::default_more_size")]
    pub more_size: usize,
}

impl PagingSettings {
    fn default_initial_size() -> usize {
        50
    }

    fn default_more_size() -> usize {
        10
    }

    fn validate(&self) -> Result<()> {
        if self.initial_size == 0 || self.more_size == 0 {
            return Err(anyhow!("page sizes must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for PagingSettings {
    fn default() -> Self {
        Self {
            initial_size: Self::default_initial_size(),
            more_size: Self::default_more_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportSettings {
    /// Spreadsheet read by `biblioteca import` when no path is given.
    #[serde(default = "ImportSettings::default_path")]
    pub path: PathBuf,
    /// Language stored for every row when the sheet has no language column.
    #[serde(default = "ImportSettings::default_language")]
    pub default_language: String,
    #[serde(default)]
    pub headers: HeaderAliases,
}

impl ImportSettings {
    fn default_path() -> PathBuf {
        PathBuf::from("excel_file.xlsx")
    }

    fn default_language() -> String {
        "Italiano".to_string()
    }
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            default_language: Self::default_language(),
            headers: HeaderAliases::default(),
        }
    }
}

/// Accepted header spellings per field, tried in order.
#[derive(Debug, Clone, Deserialize)]
pub struct HeaderAliases {
    #[serde(default = "HeaderAliases::default_title")]
    pub title: Vec<String>,
    #[serde(default = "HeaderAliases::default_author")]
    pub author: Vec<String>,
    #[serde(default = "HeaderAliases::default_genre")]
    pub genre: Vec<String>,
    #[serde(default = "HeaderAliases::default_year")]
    pub year: Vec<String>,
    #[serde(default = "HeaderAliases::default_publisher")]
    pub publisher: Vec<String>,
    #[serde(default = "HeaderAliases::default_location")]
    pub location: Vec<String>,
    #[serde(default = "HeaderAliases::default_language")]
    pub language: Vec<String>,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

impl HeaderAliases {
    fn default_title() -> Vec<String> {
        owned(&["Titolo", "Title", "Nome"])
    }

    fn default_author() -> Vec<String> {
        owned(&["Autore", "Author", "Scrittore"])
    }

    fn default_genre() -> Vec<String> {
        owned(&["Genere", "Genre", "Categoria"])
    }

    fn default_year() -> Vec<String> {
        owned(&["Anno", "Year", "Anno Pubblicazione"])
    }

    fn default_publisher() -> Vec<String> {
        owned(&["Editore", "Publisher", "Casa Editrice"])
    }

    fn default_location() -> Vec<String> {
        owned(&["Posizione", "Location", "Scaffale", "Collocazione"])
    }

    fn default_language() -> Vec<String> {
        owned(&["Lingua", "Language"])
    }
}

impl Default for HeaderAliases {
    fn default() -> Self {
        Self {
            title: Self::default_title(),
            author: Self::default_author(),
            genre: Self::default_genre(),
            year: Self::default_year(),
            publisher: Self::default_publisher(),
            location: Self::default_location(),
            language: Self::default_language(),
        }
    }
}

/// Column headings and yes/no wording written by the exporter.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportLabels {
    #[serde(default = "ExportLabels::default_columns")]
    pub columns: Vec<String>,
    #[serde(default = "ExportLabels::default_yes")]
    pub yes: String,
    #[serde(default = "ExportLabels::default_no")]
    pub no: String,
}

impl ExportLabels {
    fn default_columns() -> Vec<String> {
        owned(&[
            "Titolo",
            "Autore",
            "Genere",
            "Anno",
            "Editore",
            "Posizione",
            "Lingua",
            "In Prestito",
            "Prestato a",
        ])
    }

    fn default_yes() -> String {
        "Sì".to_string()
    }

    fn default_no() -> String {
        "No".to_string()
    }
}

impl Default for ExportLabels {
    fn default() -> Self {
        Self {
            columns: Self::default_columns(),
            yes: Self::default_yes(),
            no: Self::default_no(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    #[serde(default = "LogSettings::default_level")]
    pub level: String,
    #[serde(default = "LogSettings::default_file")]
    pub file: String,
}

impl LogSettings {
    fn default_level() -> String {
        "info".to_string()
    }

    fn default_file() -> String {
        "biblioteca.log".to_string()
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            file: Self::default_file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_the_catalog_conventions() {
        let settings = Settings::default();
        assert_eq!(settings.paging.initial_size, 50);
        assert_eq!(settings.paging.more_size, 10);
        assert_eq!(settings.import.default_language, "Italiano");
        assert_eq!(settings.import.headers.genre, ["Genere", "Genre", "Categoria"]);
        assert_eq!(settings.export.columns.len(), 9);
        assert_eq!(settings.storage.db_file, "library.db");
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[paging]\ninitial_size = 25\n\n[import]\ndefault_language = \"English\"\n",
        )
        .unwrap();

        let settings = Settings::load_from(dir.path()).unwrap();
        assert_eq!(settings.paging.initial_size, 25);
        assert_eq!(settings.paging.more_size, 10);
        assert_eq!(settings.import.default_language, "English");
        assert_eq!(settings.db_path(), dir.path().join("library.db"));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[paging]\nmore_size = 0\n",
        )
        .unwrap();

        assert!(Settings::load_from(dir.path()).is_err());
    }
}
