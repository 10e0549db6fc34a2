use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ============================================================================
// LOGGING
// ============================================================================

// The terminal is in raw mode while we run, so logs always go to a file.

pub const DEFAULT_FILTER: &str = "starscape=info";
pub const LOG_FILE_NAME: &str = "starscape.log";

/// `<cache dir>/starscape.log`, if the platform has a cache dir.
pub fn default_log_path() -> Option<PathBuf> {
    crate::config::project_dirs().map(|dirs| dirs.cache_dir().join(LOG_FILE_NAME))
}

/// `RUST_LOG` wins; otherwise [`DEFAULT_FILTER`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber writing to `path`. Keep the guard alive
/// until exit or buffered lines are lost.
pub fn init_logging(path: &Path) -> Result<WorkerGuard> {
    let dir = path.parent().context("Invalid log file path")?;
    let file_name = path.file_name().context("Invalid log file path")?;
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(guard)
}
