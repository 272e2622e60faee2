//! File logging.
//!
//! The terminal belongs to the UI, so log lines go to `tvfind.log` in the
//! platform data directory through a non-blocking appender. `RUST_LOG`
//! overrides the default `tvfind=info` filter.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_NAME: &str = "tvfind.log";
const DEFAULT_FILTER: &str = "tvfind=info";

pub fn log_dir() -> Option<PathBuf> {
  ProjectDirs::from("", "", "tvfind").map(|d| d.data_local_dir().to_path_buf())
}

/// Install the global subscriber writing into `dir`. The returned guard must be
/// held until exit so buffered lines are flushed.
pub fn init(dir: &Path) -> Result<WorkerGuard> {
  std::fs::create_dir_all(dir).with_context(|| format!("Failed to create log directory {}", dir.display()))?;

  let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_ansi(false).with_target(true).with_writer(writer))
    .try_init()
    .context("Failed to install tracing subscriber")?;

  Ok(guard)
}
