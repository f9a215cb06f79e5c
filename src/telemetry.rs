//! Logging bootstrap. The terminal belongs to the TUI, so events go to a log
//! file inside the data directory instead of stdout.

use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
/// A second call (tests, embedding) leaves the first subscriber in place.
pub fn init(settings: &Settings) -> Result<()> {
    let path = settings.log_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create log directory")?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log.level.as_str()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();

    tracing::info!(log = %path.display(), "logging initialised");
    Ok(())
}
