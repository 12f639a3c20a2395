//! Opt-in diagnostics log.
//!
//! The host program owns its terminal, so nothing is ever logged there. When
//! `STDERRED_LOG` names a file, a `tracing` subscriber appends to it.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub const LOG_VAR: &str = "STDERRED_LOG";
pub const LEVEL_VAR: &str = "STDERRED_LOG_LEVEL";

const DEFAULT_LEVEL: &str = "info";

/// Install the file subscriber if `STDERRED_LOG` is set.
///
/// Returns whether a subscriber was installed.
pub fn init() -> Result<bool> {
    let Some(path) = std::env::var_os(LOG_VAR).filter(|path| !path.is_empty()) else {
        return Ok(false);
    };
    let file = open_log(Path::new(&path))?;

    let filter = EnvFilter::try_from_env(LEVEL_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install log subscriber")?;
    Ok(true)
}

/// Open the log file in append mode, creating it if needed.
fn open_log(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}
